//! Principal directory and operator maintenance.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{BinderService, Error, Result, cache};
use binder_domain::CollaboratorProfile;
use binder_storage::{models::PrincipalRecord, queries};

// Handles that would shadow fixed routes.
const RESERVED_HANDLES: &[&str] = &["admin", "api", "health", "v1"];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatePrincipalRequest {
	pub handle: String,
	pub display_name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrincipalSummary {
	pub principal_id: Uuid,
	pub handle: String,
	pub display_name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub avatar_url: Option<String>,
	#[serde(with = "binder_domain::time_serde")]
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeScope {
	Expired,
	All,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PurgeCacheRequest {
	pub scope: PurgeScope,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PurgeCacheResponse {
	pub scope: PurgeScope,
	pub purged: u64,
}

impl BinderService {
	/// Registers a principal.
	///
	/// Handles are matched case-insensitively everywhere else, so the unique
	/// index on `LOWER(handle)` is what actually arbitrates ties.
	pub async fn create_principal(&self, req: CreatePrincipalRequest) -> Result<PrincipalSummary> {
		let handle = req.handle.trim();
		let display_name = req.display_name.trim();

		if !is_valid_handle(handle) {
			return Err(Error::InvalidRequest {
				message: "handle must be 1-32 chars of [A-Za-z0-9_-], starting alphanumeric."
					.to_string(),
			});
		}
		if RESERVED_HANDLES.contains(&handle.to_ascii_lowercase().as_str()) {
			return Err(Error::InvalidRequest {
				message: format!("Handle {handle:?} is reserved."),
			});
		}
		if display_name.is_empty() {
			return Err(Error::InvalidRequest { message: "display_name is required.".to_string() });
		}

		let avatar_url = req
			.avatar_url
			.as_deref()
			.map(str::trim)
			.filter(|url| !url.is_empty())
			.map(ToOwned::to_owned);
		let record = PrincipalRecord {
			principal_id: Uuid::new_v4(),
			handle: handle.to_owned(),
			display_name: display_name.to_owned(),
			avatar_url,
			created_at: OffsetDateTime::now_utc(),
		};

		match queries::insert_principal(&self.db.pool, &record).await {
			Ok(()) => {},
			Err(err) if err.is_unique_violation() =>
				return Err(Error::Conflict { message: "Handle is already taken.".to_string() }),
			Err(err) => return Err(err.into()),
		}

		Ok(PrincipalSummary {
			principal_id: record.principal_id,
			handle: record.handle,
			display_name: record.display_name,
			avatar_url: record.avatar_url,
			created_at: record.created_at,
		})
	}

	/// Drops cached views, either the expired ones or everything.
	pub async fn purge_cache(&self, req: PurgeCacheRequest) -> Result<PurgeCacheResponse> {
		let pool = &self.db.pool;
		let purged = match req.scope {
			PurgeScope::Expired => cache::purge_expired(pool, OffsetDateTime::now_utc()).await?,
			PurgeScope::All => cache::purge_all(pool).await?,
		};

		tracing::info!(scope = ?req.scope, purged, "Cache purge completed.");

		Ok(PurgeCacheResponse { scope: req.scope, purged })
	}
}

/// Loads the profiles behind a set of principal ids, keyed by id.
///
/// Duplicate ids collapse and ids with no matching principal are simply
/// absent from the map.
pub(crate) async fn load_profiles(
	pool: &PgPool,
	principal_ids: &[Uuid],
) -> Result<HashMap<Uuid, CollaboratorProfile>> {
	if principal_ids.is_empty() {
		return Ok(HashMap::new());
	}

	let rows = queries::get_principals_by_ids(pool, principal_ids).await?;

	Ok(rows
		.into_iter()
		.map(|row| {
			(row.principal_id, CollaboratorProfile {
				principal_id: row.principal_id,
				handle: row.handle,
				display_name: row.display_name,
				avatar_url: row.avatar_url,
			})
		})
		.collect())
}

fn is_valid_handle(handle: &str) -> bool {
	let pattern = r"^[A-Za-z0-9][A-Za-z0-9_-]{0,31}$";

	Regex::new(pattern).map(|re| re.is_match(handle)).unwrap_or(false)
}
