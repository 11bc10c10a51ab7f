//! Collection lifecycle: create, rename, visibility, collaborators, delete.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BinderService, Error, Result, allocate_slug, parse_visibility, require_authenticated,
	sanitize_collaborators,
};
use binder_domain::{Principal, Visibility};
use binder_storage::{models::CollectionRecord, queries};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateCollectionRequest {
	pub name: String,
	pub visibility: Visibility,
	#[serde(default)]
	pub collaborator_ids: Vec<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionSummary {
	pub collection_id: Uuid,
	pub owner_id: Uuid,
	pub name: String,
	pub slug: String,
	pub visibility: Visibility,
	#[serde(with = "binder_domain::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "binder_domain::time_serde")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenameCollectionRequest {
	pub collection_id: Uuid,
	pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetCollectionVisibilityRequest {
	pub collection_id: Uuid,
	pub visibility: Visibility,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetCollectionCollaboratorsRequest {
	pub collection_id: Uuid,
	pub collaborator_ids: Vec<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetCollectionCollaboratorsResponse {
	pub collection_id: Uuid,
	pub collaborator_ids: Vec<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteCollectionResponse {
	pub collection_id: Uuid,
	pub deleted: bool,
}

impl BinderService {
	/// Creates a collection under the requesting principal.
	///
	/// The slug derives from the name and is unique per owner. On a candidate
	/// collision with a concurrent create, the unique index rejects the insert
	/// and allocation reruns against the fresh slug set.
	pub async fn create_collection(
		&self,
		requester: Principal,
		req: CreateCollectionRequest,
	) -> Result<CollectionSummary> {
		let owner_id = require_authenticated(requester)?;
		let name = req.name.trim();

		if name.is_empty() {
			return Err(Error::InvalidRequest { message: "name is required.".to_string() });
		}

		let pool = &self.db.pool;

		if queries::get_principal(pool, owner_id).await?.is_none() {
			return Err(Error::UserNotFound { message: format!("No principal {owner_id}.") });
		}

		let roster = sanitize_collaborators(owner_id, &req.collaborator_ids);
		let slug_cfg = &self.cfg.slugs;
		let mut conflicted: HashSet<String> = HashSet::new();

		for _ in 0..=slug_cfg.insert_retries {
			let mut taken: HashSet<String> =
				queries::list_collection_slugs(pool, owner_id).await?.into_iter().collect();

			taken.extend(conflicted.iter().cloned());

			let slug = allocate_slug(name, &taken, slug_cfg.max_attempts)?;
			let now = OffsetDateTime::now_utc();
			let record = CollectionRecord {
				collection_id: Uuid::new_v4(),
				owner_id,
				name: name.to_owned(),
				slug: slug.clone(),
				visibility: req.visibility.as_str().to_owned(),
				created_at: now,
				updated_at: now,
			};
			let mut tx = pool.begin().await?;

			match queries::insert_collection(&mut *tx, &record).await {
				Ok(()) => {
					if !roster.is_empty() {
						match queries::insert_collection_collaborators(
							&mut *tx,
							record.collection_id,
							&roster,
							now,
						)
						.await
						{
							Ok(()) => {},
							Err(err) if err.is_foreign_key_violation() =>
								return Err(Error::InvalidRequest {
									message: "Collaborator list contains an unknown principal."
										.to_string(),
								}),
							Err(err) => return Err(err.into()),
						}
					}

					tx.commit().await?;

					return summary(&record);
				},
				Err(err) if err.is_unique_violation() => {
					tracing::debug!(slug = slug.as_str(), "Slug insert collided; retrying.");
					conflicted.insert(slug);
				},
				Err(err) => return Err(err.into()),
			}
		}

		Err(Error::SlugExhausted {
			message: format!(
				"Could not materialize a slug for {name:?} after {} insert attempts.",
				slug_cfg.insert_retries + 1
			),
		})
	}

	pub async fn rename_collection(
		&self,
		requester: Principal,
		req: RenameCollectionRequest,
	) -> Result<CollectionSummary> {
		let requester_id = require_authenticated(requester)?;
		let name = req.name.trim();

		if name.is_empty() {
			return Err(Error::InvalidRequest { message: "name is required.".to_string() });
		}

		let mut tx = self.db.pool.begin().await?;
		let mut record = queries::get_collection_for_update(&mut *tx, req.collection_id)
			.await?
			.ok_or_else(|| Error::CollectionNotFound {
				message: format!("No collection {}.", req.collection_id),
			})?;

		if record.owner_id != requester_id {
			return Err(Error::AccessDenied {
				message: "Only the owner can rename a collection.".to_string(),
			});
		}

		let now = OffsetDateTime::now_utc();

		// The slug stays as allocated at creation, so shared links keep
		// resolving after a rename.
		queries::update_collection_name(&mut *tx, record.collection_id, name, now).await?;
		tx.commit().await?;

		record.name = name.to_owned();
		record.updated_at = now;

		self.invalidate_collection_views(record.collection_id).await;

		summary(&record)
	}

	pub async fn set_collection_visibility(
		&self,
		requester: Principal,
		req: SetCollectionVisibilityRequest,
	) -> Result<CollectionSummary> {
		let requester_id = require_authenticated(requester)?;
		let mut tx = self.db.pool.begin().await?;
		let mut record = queries::get_collection_for_update(&mut *tx, req.collection_id)
			.await?
			.ok_or_else(|| Error::CollectionNotFound {
				message: format!("No collection {}.", req.collection_id),
			})?;

		if record.owner_id != requester_id {
			return Err(Error::AccessDenied {
				message: "Only the owner can change a collection's visibility.".to_string(),
			});
		}

		let now = OffsetDateTime::now_utc();

		queries::update_collection_visibility(
			&mut *tx,
			record.collection_id,
			req.visibility.as_str(),
			now,
		)
		.await?;
		tx.commit().await?;

		record.visibility = req.visibility.as_str().to_owned();
		record.updated_at = now;

		self.invalidate_collection_views(record.collection_id).await;

		summary(&record)
	}

	/// Replaces the collection's collaborator roster.
	///
	/// Duplicates collapse to their first occurrence and the owner is dropped
	/// without error; owners already hold full access.
	pub async fn set_collection_collaborators(
		&self,
		requester: Principal,
		req: SetCollectionCollaboratorsRequest,
	) -> Result<SetCollectionCollaboratorsResponse> {
		let requester_id = require_authenticated(requester)?;
		let mut tx = self.db.pool.begin().await?;
		let record = queries::get_collection_for_update(&mut *tx, req.collection_id)
			.await?
			.ok_or_else(|| Error::CollectionNotFound {
				message: format!("No collection {}.", req.collection_id),
			})?;

		if record.owner_id != requester_id {
			return Err(Error::AccessDenied {
				message: "Only the owner can change a collection's collaborators.".to_string(),
			});
		}

		let roster = sanitize_collaborators(record.owner_id, &req.collaborator_ids);
		let now = OffsetDateTime::now_utc();

		queries::delete_collection_collaborators(&mut *tx, record.collection_id).await?;

		match queries::insert_collection_collaborators(&mut *tx, record.collection_id, &roster, now)
			.await
		{
			Ok(()) => {},
			Err(err) if err.is_foreign_key_violation() =>
				return Err(Error::InvalidRequest {
					message: "Collaborator list contains an unknown principal.".to_string(),
				}),
			Err(err) => return Err(err.into()),
		}

		queries::touch_collection(&mut *tx, record.collection_id, now).await?;
		tx.commit().await?;

		self.invalidate_collection_views(record.collection_id).await;

		Ok(SetCollectionCollaboratorsResponse {
			collection_id: record.collection_id,
			collaborator_ids: roster,
		})
	}

	/// Deletes a collection with everything under it: notes, rosters, and any
	/// cached views.
	pub async fn delete_collection(
		&self,
		requester: Principal,
		collection_id: Uuid,
	) -> Result<DeleteCollectionResponse> {
		let requester_id = require_authenticated(requester)?;
		let mut tx = self.db.pool.begin().await?;
		let record = queries::get_collection_for_update(&mut *tx, collection_id)
			.await?
			.ok_or_else(|| Error::CollectionNotFound {
				message: format!("No collection {collection_id}."),
			})?;

		if record.owner_id != requester_id {
			return Err(Error::AccessDenied {
				message: "Only the owner can delete a collection.".to_string(),
			});
		}

		queries::delete_collection(&mut *tx, record.collection_id).await?;
		tx.commit().await?;

		self.invalidate_collection_views(record.collection_id).await;

		Ok(DeleteCollectionResponse { collection_id: record.collection_id, deleted: true })
	}
}

fn summary(record: &CollectionRecord) -> Result<CollectionSummary> {
	Ok(CollectionSummary {
		collection_id: record.collection_id,
		owner_id: record.owner_id,
		name: record.name.clone(),
		slug: record.slug.clone(),
		visibility: parse_visibility(&record.visibility, "collection")?,
		created_at: record.created_at,
		updated_at: record.updated_at,
	})
}
