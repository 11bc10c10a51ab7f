#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
}
impl Error {
	/// True when the underlying driver error is a unique index violation.
	///
	/// Slug inserts race against concurrent writers; the unique index is the
	/// backstop and callers retry with the next candidate on this signal.
	pub fn is_unique_violation(&self) -> bool {
		match self {
			Self::Sqlx(sqlx::Error::Database(db)) => db.is_unique_violation(),
			_ => false,
		}
	}

	/// True when the underlying driver error is a foreign key violation.
	pub fn is_foreign_key_violation(&self) -> bool {
		match self {
			Self::Sqlx(sqlx::Error::Database(db)) => db.is_foreign_key_violation(),
			_ => false,
		}
	}
}
