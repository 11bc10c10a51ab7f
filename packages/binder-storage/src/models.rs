use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PrincipalRecord {
	pub principal_id: Uuid,
	pub handle: String,
	pub display_name: String,
	pub avatar_url: Option<String>,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRecord {
	pub collection_id: Uuid,
	pub owner_id: Uuid,
	pub name: String,
	pub slug: String,
	// Stored as text; parsed into the domain enum at the service boundary.
	pub visibility: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NoteRecord {
	pub note_id: Uuid,
	pub collection_id: Uuid,
	pub owner_id: Uuid,
	pub name: String,
	pub slug: String,
	pub visibility: String,
	pub content: String,
	pub content_updated_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
