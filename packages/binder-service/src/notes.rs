//! Note lifecycle within a collection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BinderService, Error, Result, allocate_slug, parse_visibility, require_authenticated,
	sanitize_collaborators,
};
use binder_domain::{Principal, Visibility};
use binder_storage::{models::NoteRecord, queries};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateNoteRequest {
	pub collection_id: Uuid,
	pub name: String,
	pub visibility: Visibility,
	#[serde(default)]
	pub content: String,
	#[serde(default)]
	pub collaborator_ids: Vec<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NoteSummary {
	pub note_id: Uuid,
	pub collection_id: Uuid,
	pub owner_id: Uuid,
	pub name: String,
	pub slug: String,
	pub visibility: Visibility,
	pub content: String,
	#[serde(with = "binder_domain::time_serde")]
	pub content_updated_at: OffsetDateTime,
	#[serde(with = "binder_domain::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "binder_domain::time_serde")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenameNoteRequest {
	pub note_id: Uuid,
	pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetNoteContentRequest {
	pub note_id: Uuid,
	pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetNoteVisibilityRequest {
	pub note_id: Uuid,
	pub visibility: Visibility,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetNoteCollaboratorsRequest {
	pub note_id: Uuid,
	pub collaborator_ids: Vec<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SetNoteCollaboratorsResponse {
	pub note_id: Uuid,
	pub collaborator_ids: Vec<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteNoteResponse {
	pub note_id: Uuid,
	pub deleted: bool,
}

impl BinderService {
	/// Creates a note inside one of the requester's collections.
	///
	/// The slug is unique within the collection and follows the same
	/// candidate-and-retry scheme as collection slugs.
	pub async fn create_note(
		&self,
		requester: Principal,
		req: CreateNoteRequest,
	) -> Result<NoteSummary> {
		let requester_id = require_authenticated(requester)?;
		let name = req.name.trim();

		if name.is_empty() {
			return Err(Error::InvalidRequest { message: "name is required.".to_string() });
		}

		let pool = &self.db.pool;
		let collection = queries::get_collection(pool, req.collection_id).await?.ok_or_else(|| {
			Error::CollectionNotFound { message: format!("No collection {}.", req.collection_id) }
		})?;

		if collection.owner_id != requester_id {
			return Err(Error::AccessDenied {
				message: "Only the owner can add notes to a collection.".to_string(),
			});
		}

		let roster = sanitize_collaborators(collection.owner_id, &req.collaborator_ids);
		let slug_cfg = &self.cfg.slugs;
		let mut conflicted: HashSet<String> = HashSet::new();

		for _ in 0..=slug_cfg.insert_retries {
			let slugs = queries::list_note_slugs(pool, collection.collection_id).await?;
			let mut taken: HashSet<String> = slugs.into_iter().collect();

			taken.extend(conflicted.iter().cloned());

			let slug = allocate_slug(name, &taken, slug_cfg.max_attempts)?;
			let now = OffsetDateTime::now_utc();
			let record = NoteRecord {
				note_id: Uuid::new_v4(),
				collection_id: collection.collection_id,
				owner_id: collection.owner_id,
				name: name.to_owned(),
				slug: slug.clone(),
				visibility: req.visibility.as_str().to_owned(),
				content: req.content.clone(),
				content_updated_at: now,
				created_at: now,
				updated_at: now,
			};
			let mut tx = pool.begin().await?;

			match queries::insert_note(&mut *tx, &record).await {
				Ok(()) => {
					if !roster.is_empty() {
						match queries::insert_note_collaborators(
							&mut *tx,
							record.note_id,
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
					self.invalidate_collection_views(record.collection_id).await;

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

	pub async fn rename_note(
		&self,
		requester: Principal,
		req: RenameNoteRequest,
	) -> Result<NoteSummary> {
		let requester_id = require_authenticated(requester)?;
		let name = req.name.trim();

		if name.is_empty() {
			return Err(Error::InvalidRequest { message: "name is required.".to_string() });
		}

		let mut tx = self.db.pool.begin().await?;
		let mut record = self.note_for_update(&mut tx, req.note_id, requester_id).await?;
		let now = OffsetDateTime::now_utc();

		queries::update_note_name(&mut *tx, record.note_id, name, now).await?;
		tx.commit().await?;

		record.name = name.to_owned();
		record.updated_at = now;

		self.invalidate_collection_views(record.collection_id).await;

		summary(&record)
	}

	pub async fn set_note_content(
		&self,
		requester: Principal,
		req: SetNoteContentRequest,
	) -> Result<NoteSummary> {
		let requester_id = require_authenticated(requester)?;
		let mut tx = self.db.pool.begin().await?;
		let mut record = self.note_for_update(&mut tx, req.note_id, requester_id).await?;
		let now = OffsetDateTime::now_utc();

		queries::update_note_content(&mut *tx, record.note_id, &req.content, now).await?;
		tx.commit().await?;

		record.content = req.content;
		record.content_updated_at = now;
		record.updated_at = now;

		self.invalidate_collection_views(record.collection_id).await;

		summary(&record)
	}

	pub async fn set_note_visibility(
		&self,
		requester: Principal,
		req: SetNoteVisibilityRequest,
	) -> Result<NoteSummary> {
		let requester_id = require_authenticated(requester)?;
		let mut tx = self.db.pool.begin().await?;
		let mut record = self.note_for_update(&mut tx, req.note_id, requester_id).await?;
		let now = OffsetDateTime::now_utc();

		queries::update_note_visibility(&mut *tx, record.note_id, req.visibility.as_str(), now)
			.await?;
		tx.commit().await?;

		record.visibility = req.visibility.as_str().to_owned();
		record.updated_at = now;

		self.invalidate_collection_views(record.collection_id).await;

		summary(&record)
	}

	pub async fn set_note_collaborators(
		&self,
		requester: Principal,
		req: SetNoteCollaboratorsRequest,
	) -> Result<SetNoteCollaboratorsResponse> {
		let requester_id = require_authenticated(requester)?;
		let mut tx = self.db.pool.begin().await?;
		let record = self.note_for_update(&mut tx, req.note_id, requester_id).await?;
		let roster = sanitize_collaborators(record.owner_id, &req.collaborator_ids);
		let now = OffsetDateTime::now_utc();

		queries::delete_note_collaborators(&mut *tx, record.note_id).await?;

		match queries::insert_note_collaborators(&mut *tx, record.note_id, &roster, now).await {
			Ok(()) => {},
			Err(err) if err.is_foreign_key_violation() =>
				return Err(Error::InvalidRequest {
					message: "Collaborator list contains an unknown principal.".to_string(),
				}),
			Err(err) => return Err(err.into()),
		}

		queries::touch_note(&mut *tx, record.note_id, now).await?;
		tx.commit().await?;

		self.invalidate_collection_views(record.collection_id).await;

		Ok(SetNoteCollaboratorsResponse { note_id: record.note_id, collaborator_ids: roster })
	}

	pub async fn delete_note(
		&self,
		requester: Principal,
		note_id: Uuid,
	) -> Result<DeleteNoteResponse> {
		let requester_id = require_authenticated(requester)?;
		let mut tx = self.db.pool.begin().await?;
		let record = self.note_for_update(&mut tx, note_id, requester_id).await?;

		queries::delete_note(&mut *tx, record.note_id).await?;
		tx.commit().await?;

		self.invalidate_collection_views(record.collection_id).await;

		Ok(DeleteNoteResponse { note_id: record.note_id, deleted: true })
	}

	async fn note_for_update(
		&self,
		tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
		note_id: Uuid,
		requester_id: Uuid,
	) -> Result<NoteRecord> {
		let record = queries::get_note_for_update(&mut **tx, note_id)
			.await?
			.ok_or_else(|| Error::NoteNotFound { message: format!("No note {note_id}.") })?;

		if record.owner_id != requester_id {
			return Err(Error::AccessDenied {
				message: "Only the owner can modify a note.".to_string(),
			});
		}

		Ok(record)
	}
}

fn summary(record: &NoteRecord) -> Result<NoteSummary> {
	Ok(NoteSummary {
		note_id: record.note_id,
		collection_id: record.collection_id,
		owner_id: record.owner_id,
		name: record.name.clone(),
		slug: record.slug.clone(),
		visibility: parse_visibility(&record.visibility, "note")?,
		content: record.content.clone(),
		content_updated_at: record.content_updated_at,
		created_at: record.created_at,
		updated_at: record.updated_at,
	})
}
