//! Projection of a collection and its notes into a requester-specific view.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::access::{self, Principal, Visibility};

/// A collection as loaded from storage, before any access filtering.
#[derive(Debug, Clone)]
pub struct CollectionDescriptor {
	pub collection_id: Uuid,
	pub owner_id: Uuid,
	pub name: String,
	pub slug: String,
	pub visibility: Visibility,
	pub collaborator_ids: Vec<Uuid>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// A note as loaded from storage, before any access filtering.
#[derive(Debug, Clone)]
pub struct NoteDescriptor {
	pub note_id: Uuid,
	pub owner_id: Uuid,
	pub name: String,
	pub slug: String,
	pub visibility: Visibility,
	pub collaborator_ids: Vec<Uuid>,
	pub content: String,
	pub content_updated_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

/// Public profile of a collaborator, resolved through the identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CollaboratorProfile {
	pub principal_id: Uuid,
	pub handle: String,
	pub display_name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar_url: Option<String>,
}

/// A note the requester is allowed to see.
///
/// `collaborators` is `None` when the requester may not read the roster; the
/// field is then omitted from the serialized form entirely. An authorized
/// requester looking at a roster with no members gets `Some` of an empty list,
/// which serializes as `[]`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NoteView {
	pub note_id: Uuid,
	pub name: String,
	pub slug: String,
	pub visibility: Visibility,
	pub content: String,
	#[serde(with = "crate::time_serde")]
	pub content_updated_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub collaborators: Option<Vec<CollaboratorProfile>>,
}

/// The fully projected share view of one collection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CollectionView {
	pub collection_id: Uuid,
	pub owner_id: Uuid,
	pub name: String,
	pub slug: String,
	pub visibility: Visibility,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	pub notes: Vec<NoteView>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub collaborators: Option<Vec<CollaboratorProfile>>,
}

/// Projects a collection and its notes into the view `requester` may see.
///
/// Returns `None` when the collection itself is denied; nothing below a denied
/// collection is ever disclosed. Notes the requester cannot read are silently
/// absent from `notes` rather than flagged. Note order follows the input
/// slice, so the caller picks the ordering before projecting.
pub fn project_tree(
	requester: Principal,
	collection: &CollectionDescriptor,
	notes: &[NoteDescriptor],
	directory: &HashMap<Uuid, CollaboratorProfile>,
) -> Option<CollectionView> {
	let collection_access = access::resolve(
		requester,
		collection.owner_id,
		collection.visibility,
		&collection.collaborator_ids,
	);

	if !collection_access.can_read_resource() {
		return None;
	}

	// Collection owners and collaborators see the roster of every surviving
	// note, even where note-level access alone would not disclose it.
	let roster_disclosed_by_parent = collection_access.can_read_collaborator_list();
	let notes = notes
		.iter()
		.filter_map(|note| {
			let note_access = access::resolve(
				requester,
				note.owner_id,
				note.visibility,
				&note.collaborator_ids,
			);

			if !note_access.can_read_resource() {
				return None;
			}

			let roster_visible =
				note_access.can_read_collaborator_list() || roster_disclosed_by_parent;
			let collaborators =
				roster_visible.then(|| lookup_profiles(&note.collaborator_ids, directory));

			Some(NoteView {
				note_id: note.note_id,
				name: note.name.clone(),
				slug: note.slug.clone(),
				visibility: note.visibility,
				content: note.content.clone(),
				content_updated_at: note.content_updated_at,
				created_at: note.created_at,
				updated_at: note.updated_at,
				collaborators,
			})
		})
		.collect();
	let collaborators = roster_disclosed_by_parent
		.then(|| lookup_profiles(&collection.collaborator_ids, directory));

	Some(CollectionView {
		collection_id: collection.collection_id,
		owner_id: collection.owner_id,
		name: collection.name.clone(),
		slug: collection.slug.clone(),
		visibility: collection.visibility,
		created_at: collection.created_at,
		updated_at: collection.updated_at,
		notes,
		collaborators,
	})
}

// Identities missing from the directory drop out rather than failing the view.
fn lookup_profiles(
	ids: &[Uuid],
	directory: &HashMap<Uuid, CollaboratorProfile>,
) -> Vec<CollaboratorProfile> {
	ids.iter().filter_map(|id| directory.get(id)).cloned().collect()
}
