use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	models::{CollectionRecord, NoteRecord, PrincipalRecord},
};

pub async fn insert_principal<'e, E>(executor: E, principal: &PrincipalRecord) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO principals (
	principal_id,
	handle,
	display_name,
	avatar_url,
	created_at
)
VALUES ($1,$2,$3,$4,$5)",
	)
	.bind(principal.principal_id)
	.bind(principal.handle.as_str())
	.bind(principal.display_name.as_str())
	.bind(principal.avatar_url.as_deref())
	.bind(principal.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_principal<'e, E>(
	executor: E,
	principal_id: Uuid,
) -> Result<Option<PrincipalRecord>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, PrincipalRecord>(
		"\
SELECT principal_id, handle, display_name, avatar_url, created_at
FROM principals
WHERE principal_id = $1
LIMIT 1",
	)
	.bind(principal_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

// Handles are matched case-insensitively; the unique index on LOWER(handle)
// guarantees at most one row.
pub async fn get_principal_by_handle<'e, E>(
	executor: E,
	handle: &str,
) -> Result<Option<PrincipalRecord>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, PrincipalRecord>(
		"\
SELECT principal_id, handle, display_name, avatar_url, created_at
FROM principals
WHERE LOWER(handle) = LOWER($1)
LIMIT 1",
	)
	.bind(handle)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn get_principals_by_ids<'e, E>(
	executor: E,
	principal_ids: &[Uuid],
) -> Result<Vec<PrincipalRecord>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, PrincipalRecord>(
		"\
SELECT principal_id, handle, display_name, avatar_url, created_at
FROM principals
WHERE principal_id = ANY($1)",
	)
	.bind(principal_ids)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn insert_collection<'e, E>(executor: E, collection: &CollectionRecord) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO collections (
	collection_id,
	owner_id,
	name,
	slug,
	visibility,
	created_at,
	updated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7)",
	)
	.bind(collection.collection_id)
	.bind(collection.owner_id)
	.bind(collection.name.as_str())
	.bind(collection.slug.as_str())
	.bind(collection.visibility.as_str())
	.bind(collection.created_at)
	.bind(collection.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_collection<'e, E>(
	executor: E,
	collection_id: Uuid,
) -> Result<Option<CollectionRecord>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, CollectionRecord>(
		"\
SELECT collection_id, owner_id, name, slug, visibility, created_at, updated_at
FROM collections
WHERE collection_id = $1
LIMIT 1",
	)
	.bind(collection_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn get_collection_for_update<'e, E>(
	executor: E,
	collection_id: Uuid,
) -> Result<Option<CollectionRecord>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, CollectionRecord>(
		"\
SELECT collection_id, owner_id, name, slug, visibility, created_at, updated_at
FROM collections
WHERE collection_id = $1
FOR UPDATE",
	)
	.bind(collection_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn get_collection_by_slug<'e, E>(
	executor: E,
	owner_id: Uuid,
	slug: &str,
) -> Result<Option<CollectionRecord>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, CollectionRecord>(
		"\
SELECT collection_id, owner_id, name, slug, visibility, created_at, updated_at
FROM collections
WHERE owner_id = $1 AND slug = $2
LIMIT 1",
	)
	.bind(owner_id)
	.bind(slug)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn list_collection_slugs<'e, E>(executor: E, owner_id: Uuid) -> Result<Vec<String>>
where
	E: PgExecutor<'e>,
{
	let slugs = sqlx::query_scalar::<_, String>(
		"\
SELECT slug
FROM collections
WHERE owner_id = $1",
	)
	.bind(owner_id)
	.fetch_all(executor)
	.await?;

	Ok(slugs)
}

pub async fn update_collection_name<'e, E>(
	executor: E,
	collection_id: Uuid,
	name: &str,
	updated_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE collections
SET name = $2, updated_at = $3
WHERE collection_id = $1",
	)
	.bind(collection_id)
	.bind(name)
	.bind(updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn update_collection_visibility<'e, E>(
	executor: E,
	collection_id: Uuid,
	visibility: &str,
	updated_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE collections
SET visibility = $2, updated_at = $3
WHERE collection_id = $1",
	)
	.bind(collection_id)
	.bind(visibility)
	.bind(updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn touch_collection<'e, E>(
	executor: E,
	collection_id: Uuid,
	updated_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE collections
SET updated_at = $2
WHERE collection_id = $1",
	)
	.bind(collection_id)
	.bind(updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

// Collaborator rows and notes go with the collection via ON DELETE CASCADE.
pub async fn delete_collection<'e, E>(executor: E, collection_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("DELETE FROM collections WHERE collection_id = $1")
		.bind(collection_id)
		.execute(executor)
		.await?;

	Ok(())
}

pub async fn delete_collection_collaborators<'e, E>(executor: E, collection_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("DELETE FROM collection_collaborators WHERE collection_id = $1")
		.bind(collection_id)
		.execute(executor)
		.await?;

	Ok(())
}

pub async fn insert_collection_collaborators<'e, E>(
	executor: E,
	collection_id: Uuid,
	principal_ids: &[Uuid],
	added_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO collection_collaborators (collection_id, principal_id, added_at)
SELECT $1, principal_id, $3
FROM unnest($2::uuid[]) AS t (principal_id)",
	)
	.bind(collection_id)
	.bind(principal_ids)
	.bind(added_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn list_collection_collaborators<'e, E>(
	executor: E,
	collection_id: Uuid,
) -> Result<Vec<Uuid>>
where
	E: PgExecutor<'e>,
{
	let ids = sqlx::query_scalar::<_, Uuid>(
		"\
SELECT principal_id
FROM collection_collaborators
WHERE collection_id = $1
ORDER BY added_at, principal_id",
	)
	.bind(collection_id)
	.fetch_all(executor)
	.await?;

	Ok(ids)
}

pub async fn insert_note<'e, E>(executor: E, note: &NoteRecord) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO notes (
	note_id,
	collection_id,
	owner_id,
	name,
	slug,
	visibility,
	content,
	content_updated_at,
	created_at,
	updated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)",
	)
	.bind(note.note_id)
	.bind(note.collection_id)
	.bind(note.owner_id)
	.bind(note.name.as_str())
	.bind(note.slug.as_str())
	.bind(note.visibility.as_str())
	.bind(note.content.as_str())
	.bind(note.content_updated_at)
	.bind(note.created_at)
	.bind(note.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_note<'e, E>(executor: E, note_id: Uuid) -> Result<Option<NoteRecord>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, NoteRecord>(
		"\
SELECT
	note_id,
	collection_id,
	owner_id,
	name,
	slug,
	visibility,
	content,
	content_updated_at,
	created_at,
	updated_at
FROM notes
WHERE note_id = $1
LIMIT 1",
	)
	.bind(note_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn get_note_for_update<'e, E>(executor: E, note_id: Uuid) -> Result<Option<NoteRecord>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, NoteRecord>(
		"\
SELECT
	note_id,
	collection_id,
	owner_id,
	name,
	slug,
	visibility,
	content,
	content_updated_at,
	created_at,
	updated_at
FROM notes
WHERE note_id = $1
FOR UPDATE",
	)
	.bind(note_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

// Newest first; note_id breaks creation-time ties deterministically.
pub async fn list_collection_notes<'e, E>(
	executor: E,
	collection_id: Uuid,
) -> Result<Vec<NoteRecord>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, NoteRecord>(
		"\
SELECT
	note_id,
	collection_id,
	owner_id,
	name,
	slug,
	visibility,
	content,
	content_updated_at,
	created_at,
	updated_at
FROM notes
WHERE collection_id = $1
ORDER BY created_at DESC, note_id DESC",
	)
	.bind(collection_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn list_note_slugs<'e, E>(executor: E, collection_id: Uuid) -> Result<Vec<String>>
where
	E: PgExecutor<'e>,
{
	let slugs = sqlx::query_scalar::<_, String>(
		"\
SELECT slug
FROM notes
WHERE collection_id = $1",
	)
	.bind(collection_id)
	.fetch_all(executor)
	.await?;

	Ok(slugs)
}

pub async fn update_note_name<'e, E>(
	executor: E,
	note_id: Uuid,
	name: &str,
	updated_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE notes
SET name = $2, updated_at = $3
WHERE note_id = $1",
	)
	.bind(note_id)
	.bind(name)
	.bind(updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn update_note_content<'e, E>(
	executor: E,
	note_id: Uuid,
	content: &str,
	updated_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE notes
SET content = $2, content_updated_at = $3, updated_at = $3
WHERE note_id = $1",
	)
	.bind(note_id)
	.bind(content)
	.bind(updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn update_note_visibility<'e, E>(
	executor: E,
	note_id: Uuid,
	visibility: &str,
	updated_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE notes
SET visibility = $2, updated_at = $3
WHERE note_id = $1",
	)
	.bind(note_id)
	.bind(visibility)
	.bind(updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn touch_note<'e, E>(
	executor: E,
	note_id: Uuid,
	updated_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE notes
SET updated_at = $2
WHERE note_id = $1",
	)
	.bind(note_id)
	.bind(updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn delete_note<'e, E>(executor: E, note_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("DELETE FROM notes WHERE note_id = $1").bind(note_id).execute(executor).await?;

	Ok(())
}

pub async fn delete_note_collaborators<'e, E>(executor: E, note_id: Uuid) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("DELETE FROM note_collaborators WHERE note_id = $1")
		.bind(note_id)
		.execute(executor)
		.await?;

	Ok(())
}

pub async fn insert_note_collaborators<'e, E>(
	executor: E,
	note_id: Uuid,
	principal_ids: &[Uuid],
	added_at: OffsetDateTime,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO note_collaborators (note_id, principal_id, added_at)
SELECT $1, principal_id, $3
FROM unnest($2::uuid[]) AS t (principal_id)",
	)
	.bind(note_id)
	.bind(principal_ids)
	.bind(added_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn list_note_collaborators<'e, E>(executor: E, note_id: Uuid) -> Result<Vec<Uuid>>
where
	E: PgExecutor<'e>,
{
	let ids = sqlx::query_scalar::<_, Uuid>(
		"\
SELECT principal_id
FROM note_collaborators
WHERE note_id = $1
ORDER BY added_at, principal_id",
	)
	.bind(note_id)
	.fetch_all(executor)
	.await?;

	Ok(ids)
}

// One round trip for every note roster under a collection.
pub async fn list_collection_note_collaborators<'e, E>(
	executor: E,
	collection_id: Uuid,
) -> Result<Vec<(Uuid, Uuid)>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, (Uuid, Uuid)>(
		"\
SELECT nc.note_id, nc.principal_id
FROM note_collaborators nc
JOIN notes n ON n.note_id = nc.note_id
WHERE n.collection_id = $1
ORDER BY nc.added_at, nc.principal_id",
	)
	.bind(collection_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
