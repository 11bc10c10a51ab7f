pub mod collections;
pub mod directory;
pub mod notes;
pub mod view;

mod cache;
mod error;

pub use error::{Error, Result};

use std::collections::HashSet;

use uuid::Uuid;

use binder_config::Config;
use binder_domain::{Principal, SlugError, Visibility};
use binder_storage::db::Db;

pub use collections::{
	CollectionSummary, CreateCollectionRequest, DeleteCollectionResponse, RenameCollectionRequest,
	SetCollectionCollaboratorsRequest, SetCollectionCollaboratorsResponse,
	SetCollectionVisibilityRequest,
};
pub use directory::{
	CreatePrincipalRequest, PrincipalSummary, PurgeCacheRequest, PurgeCacheResponse, PurgeScope,
};
pub use notes::{
	CreateNoteRequest, DeleteNoteResponse, NoteSummary, RenameNoteRequest,
	SetNoteCollaboratorsRequest, SetNoteCollaboratorsResponse, SetNoteContentRequest,
	SetNoteVisibilityRequest,
};
pub use view::CollectionViewRequest;

pub struct BinderService {
	pub cfg: Config,
	pub db: Db,
}
impl BinderService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db }
	}

	// Runs after the mutating transaction commits. A failed invalidation is
	// only logged; the TTL bounds how long the stale entries can survive.
	pub(crate) async fn invalidate_collection_views(&self, collection_id: Uuid) {
		match cache::invalidate_collection(&self.db.pool, collection_id).await {
			Ok(purged) =>
				if purged > 0 {
					tracing::debug!(%collection_id, purged, "Cache invalidated.");
				},
			Err(err) => {
				tracing::warn!(error = %err, %collection_id, "Cache invalidation failed.");
			},
		}
	}
}

pub(crate) fn require_authenticated(requester: Principal) -> Result<Uuid> {
	requester
		.id()
		.ok_or_else(|| Error::AccessDenied { message: "Authentication required.".to_string() })
}

// Stored visibility values are written by this crate alone, so anything else
// is corrupt data, not a bad request.
pub(crate) fn parse_visibility(raw: &str, resource: &str) -> Result<Visibility> {
	Visibility::parse(raw).ok_or_else(|| Error::Storage {
		message: format!("Unknown visibility {raw:?} on {resource}."),
	})
}

/// Dedupes a requested collaborator roster, keeping first occurrences, and
/// silently drops the owner. Owners hold full access already; storing them as
/// collaborators would only create a second source of truth.
pub(crate) fn sanitize_collaborators(owner_id: Uuid, requested: &[Uuid]) -> Vec<Uuid> {
	let mut seen = HashSet::new();

	requested.iter().copied().filter(|id| *id != owner_id && seen.insert(*id)).collect()
}

pub(crate) fn allocate_slug(
	name: &str,
	taken: &HashSet<String>,
	max_attempts: u32,
) -> Result<String> {
	binder_domain::slug::allocate(name, |candidate| taken.contains(candidate), max_attempts)
		.map_err(|err| match err {
			SlugError::Exhausted { base, attempts } => Error::SlugExhausted {
				message: format!("No free slug for {base:?} within {attempts} attempts."),
			},
		})
}
