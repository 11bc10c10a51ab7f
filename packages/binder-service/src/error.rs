pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Access denied: {message}")]
	AccessDenied { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("User not found: {message}")]
	UserNotFound { message: String },
	#[error("Collection not found: {message}")]
	CollectionNotFound { message: String },
	#[error("Note not found: {message}")]
	NoteNotFound { message: String },
	#[error("Slug space exhausted: {message}")]
	SlugExhausted { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<binder_storage::Error> for Error {
	fn from(err: binder_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
