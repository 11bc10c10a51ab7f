//! The public share view: resolve, project, and cache one collection tree.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

use crate::{BinderService, Error, Result, cache, directory, parse_visibility};
use binder_domain::{CollectionDescriptor, CollectionView, NoteDescriptor, Principal, project_tree};
use binder_storage::queries;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionViewRequest {
	pub owner_handle: String,
	pub collection_slug: String,
}

impl BinderService {
	/// Returns the collection tree as `requester` is allowed to see it.
	///
	/// Cached and fresh responses are interchangeable: a hit is returned as
	/// stored, and any cache problem (slow read, bad payload, failed write)
	/// degrades to a fresh projection rather than an error.
	pub async fn collection_view(
		&self,
		requester: Principal,
		req: CollectionViewRequest,
	) -> Result<CollectionView> {
		let owner_handle = req.owner_handle.trim();
		let collection_slug = req.collection_slug.trim();

		if owner_handle.is_empty() || collection_slug.is_empty() {
			return Err(Error::InvalidRequest {
				message: "owner_handle and collection_slug are required.".to_string(),
			});
		}

		let cache_cfg = &self.cfg.cache;
		let now = time::OffsetDateTime::now_utc();
		let cache_key = if cache_cfg.enabled {
			match cache::build_view_key(owner_handle, collection_slug, requester) {
				Ok(key) => Some(key),
				Err(err) => {
					tracing::warn!(error = %err, "Cache key build failed.");

					None
				},
			}
		} else {
			None
		};

		if let Some(key) = cache_key.as_ref() {
			let read_timeout = std::time::Duration::from_millis(cache_cfg.read_timeout_ms);

			match cache::fetch_view(&self.db.pool, key, now, read_timeout).await {
				Ok(Some(payload)) => {
					tracing::info!(
						cache_key_prefix = cache::key_prefix(key),
						hit = true,
						payload_size = payload.size_bytes,
						ttl_seconds = cache_cfg.ttl_seconds,
						"Cache hit."
					);

					match serde_json::from_value::<CollectionView>(payload.value) {
						Ok(view) => return Ok(view),
						Err(err) => {
							tracing::warn!(
								error = %err,
								cache_key_prefix = cache::key_prefix(key),
								"Cache payload decode failed."
							);
						},
					}
				},
				Ok(None) => {
					tracing::info!(
						cache_key_prefix = cache::key_prefix(key),
						hit = false,
						payload_size = 0_u64,
						ttl_seconds = cache_cfg.ttl_seconds,
						"Cache miss."
					);
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						cache_key_prefix = cache::key_prefix(key),
						"Cache read failed."
					);
				},
			}
		}

		let (owner_id, collection_id, view) =
			self.project_collection(requester, owner_handle, collection_slug).await?;

		if let Some(key) = cache_key {
			let payload = match serde_json::to_value(&view) {
				Ok(value) => value,
				Err(err) => {
					tracing::warn!(
						error = %err,
						cache_key_prefix = cache::key_prefix(&key),
						"Cache payload encode failed."
					);

					return Ok(view);
				},
			};
			let stored_at = time::OffsetDateTime::now_utc();
			let store = cache::store_view(&self.db.pool, cache::StoreViewArgs {
				key: &key,
				owner_id,
				collection_id,
				payload,
				now: stored_at,
				ttl: Duration::seconds(cache_cfg.ttl_seconds),
				max_payload_bytes: cache_cfg.max_payload_bytes,
			})
			.await;

			match store {
				Ok(Some(payload_size)) => {
					tracing::info!(
						cache_key_prefix = cache::key_prefix(&key),
						hit = false,
						payload_size,
						ttl_seconds = cache_cfg.ttl_seconds,
						"Cache stored."
					);
				},
				Ok(None) => {
					tracing::warn!(
						cache_key_prefix = cache::key_prefix(&key),
						hit = false,
						payload_size = 0_u64,
						"Cache payload skipped due to size."
					);
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						cache_key_prefix = cache::key_prefix(&key),
						"Cache write failed."
					);
				},
			}
		}

		Ok(view)
	}

	async fn project_collection(
		&self,
		requester: Principal,
		owner_handle: &str,
		collection_slug: &str,
	) -> Result<(Uuid, Uuid, CollectionView)> {
		let pool = &self.db.pool;
		let owner = queries::get_principal_by_handle(pool, owner_handle)
			.await?
			.ok_or_else(|| Error::UserNotFound {
				message: format!("No principal with handle {owner_handle:?}."),
			})?;
		let collection = queries::get_collection_by_slug(pool, owner.principal_id, collection_slug)
			.await?
			.ok_or_else(|| Error::CollectionNotFound {
				message: format!("No collection {collection_slug:?} under {owner_handle:?}."),
			})?;
		let collection_collaborators =
			queries::list_collection_collaborators(pool, collection.collection_id).await?;
		let note_records = queries::list_collection_notes(pool, collection.collection_id).await?;
		let note_collaborators =
			queries::list_collection_note_collaborators(pool, collection.collection_id).await?;
		let mut rosters: HashMap<Uuid, Vec<Uuid>> = HashMap::new();

		for (note_id, principal_id) in note_collaborators {
			rosters.entry(note_id).or_default().push(principal_id);
		}

		// Duplicate ids are fine here; the directory query collapses them.
		let mut directory_ids = collection_collaborators.clone();

		for ids in rosters.values() {
			directory_ids.extend_from_slice(ids);
		}

		let profiles = directory::load_profiles(pool, &directory_ids).await?;
		let descriptor = CollectionDescriptor {
			collection_id: collection.collection_id,
			owner_id: collection.owner_id,
			name: collection.name.clone(),
			slug: collection.slug.clone(),
			visibility: parse_visibility(&collection.visibility, "collection")?,
			collaborator_ids: collection_collaborators,
			created_at: collection.created_at,
			updated_at: collection.updated_at,
		};
		let notes = note_records
			.into_iter()
			.map(|record| {
				let visibility = parse_visibility(&record.visibility, "note")?;

				Ok(NoteDescriptor {
					note_id: record.note_id,
					owner_id: record.owner_id,
					name: record.name,
					slug: record.slug,
					visibility,
					collaborator_ids: rosters.remove(&record.note_id).unwrap_or_default(),
					content: record.content,
					content_updated_at: record.content_updated_at,
					created_at: record.created_at,
					updated_at: record.updated_at,
				})
			})
			.collect::<Result<Vec<_>>>()?;
		let view = project_tree(requester, &descriptor, &notes, &profiles).ok_or_else(|| {
			Error::AccessDenied {
				message: "You do not have access to this collection.".to_string(),
			}
		})?;

		Ok((descriptor.owner_id, descriptor.collection_id, view))
	}
}
