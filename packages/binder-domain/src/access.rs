//! Visibility-tiered access resolution for collections and notes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The requesting identity, as established by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
	Anonymous,
	Authenticated { id: Uuid },
}

impl Principal {
	pub fn id(&self) -> Option<Uuid> {
		match self {
			Self::Anonymous => None,
			Self::Authenticated { id } => Some(*id),
		}
	}

	pub fn is_anonymous(&self) -> bool {
		matches!(self, Self::Anonymous)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
	Public,
	Private,
}

impl Visibility {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Public => "public",
			Self::Private => "private",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"public" => Some(Self::Public),
			"private" => Some(Self::Private),
			_ => None,
		}
	}
}

impl std::fmt::Display for Visibility {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Outcome of resolving a principal against a single resource.
///
/// Exactly one level applies to any (requester, resource) pair; there is no
/// partial or stacked access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
	Owner,
	Collaborator,
	PublicViewer,
	Denied,
}

impl AccessLevel {
	/// Whether the resource itself (name, content, metadata) may be read.
	pub fn can_read_resource(&self) -> bool {
		!matches!(self, Self::Denied)
	}

	/// Whether the resource's collaborator roster may be disclosed.
	pub fn can_read_collaborator_list(&self) -> bool {
		matches!(self, Self::Owner | Self::Collaborator)
	}
}

/// Resolves the access level of `requester` on a resource.
///
/// Ownership is checked first and wins outright, so an owner who also appears
/// in `collaborator_ids` still resolves to [`AccessLevel::Owner`]. Collaborator
/// membership is then consulted under both visibility tiers: on a public
/// resource it upgrades the requester from plain [`AccessLevel::PublicViewer`],
/// on a private one it is the only way in.
pub fn resolve(
	requester: Principal,
	owner_id: Uuid,
	visibility: Visibility,
	collaborator_ids: &[Uuid],
) -> AccessLevel {
	if requester.id() == Some(owner_id) {
		return AccessLevel::Owner;
	}

	let is_collaborator = requester.id().is_some_and(|id| collaborator_ids.contains(&id));

	match visibility {
		Visibility::Public if is_collaborator => AccessLevel::Collaborator,
		Visibility::Public => AccessLevel::PublicViewer,
		Visibility::Private if is_collaborator => AccessLevel::Collaborator,
		Visibility::Private => AccessLevel::Denied,
	}
}
