//! Read-through cache for projected collection views, backed by Postgres.
//!
//! Every helper here is best effort from the caller's point of view: a failed
//! read or write is logged and the request falls back to a fresh projection.

use std::time::Duration as StdDuration;

use serde_json::Value;
use sqlx::{PgPool, Row};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, Result};
use binder_domain::Principal;

/// Bumped whenever the cached payload shape changes; entries written under an
/// older version stop matching and age out through their TTL.
pub(crate) const KEY_VERSION: &str = "v1";

pub(crate) struct CachePayload {
	pub(crate) value: Value,
	pub(crate) size_bytes: usize,
}

pub(crate) struct StoreViewArgs<'a> {
	pub(crate) key: &'a str,
	pub(crate) owner_id: Uuid,
	pub(crate) collection_id: Uuid,
	pub(crate) payload: Value,
	pub(crate) now: OffsetDateTime,
	pub(crate) ttl: Duration,
	pub(crate) max_payload_bytes: Option<u64>,
}

// The handle is folded to lowercase so /Alice/x and /alice/x share an entry;
// handle lookup is case-insensitive everywhere else too.
pub(crate) fn build_view_key(
	owner_handle: &str,
	collection_slug: &str,
	requester: Principal,
) -> Result<String> {
	let requester_key =
		requester.id().map(|id| id.to_string()).unwrap_or_else(|| "guest".to_owned());
	let payload = serde_json::json!({
		"kind": "collection_view",
		"version": KEY_VERSION,
		"owner": owner_handle.to_lowercase(),
		"path": collection_slug,
		"requester": requester_key,
	});

	hash_key(&payload)
}

fn hash_key(payload: &Value) -> Result<String> {
	let raw = serde_json::to_vec(payload).map_err(|err| Error::Storage {
		message: format!("Failed to encode cache key payload: {err}"),
	})?;

	Ok(blake3::hash(&raw).to_hex().to_string())
}

pub(crate) fn key_prefix(key: &str) -> &str {
	let len = key.len().min(12);

	&key[..len]
}

/// Fetches a live cache entry, bounded by `read_timeout`.
///
/// A slow cache must never stall the read path, so hitting the timeout is
/// reported as an error for the caller to log and treat as a miss.
pub(crate) async fn fetch_view(
	pool: &PgPool,
	key: &str,
	now: OffsetDateTime,
	read_timeout: StdDuration,
) -> Result<Option<CachePayload>> {
	match tokio::time::timeout(read_timeout, fetch_view_uncapped(pool, key, now)).await {
		Ok(result) => result,
		Err(_) => Err(Error::Storage {
			message: format!("Cache read timed out after {}ms.", read_timeout.as_millis()),
		}),
	}
}

async fn fetch_view_uncapped(
	pool: &PgPool,
	key: &str,
	now: OffsetDateTime,
) -> Result<Option<CachePayload>> {
	let row =
		sqlx::query("SELECT payload FROM view_cache WHERE cache_key = $1 AND expires_at > $2")
			.bind(key)
			.bind(now)
			.fetch_optional(pool)
			.await?;
	let Some(row) = row else {
		return Ok(None);
	};
	let payload: Value = row.try_get("payload")?;
	let size_bytes = serde_json::to_vec(&payload)
		.map_err(|err| Error::Storage {
			message: format!("Failed to encode cache payload: {err}"),
		})?
		.len();

	sqlx::query(
		"\
UPDATE view_cache
SET last_accessed_at = $1, hit_count = hit_count + 1
WHERE cache_key = $2",
	)
	.bind(now)
	.bind(key)
	.execute(pool)
	.await?;

	Ok(Some(CachePayload { value: payload, size_bytes }))
}

pub(crate) async fn store_view(pool: &PgPool, args: StoreViewArgs<'_>) -> Result<Option<usize>> {
	let StoreViewArgs { key, owner_id, collection_id, payload, now, ttl, max_payload_bytes } = args;
	let payload_bytes = serde_json::to_vec(&payload).map_err(|err| Error::Storage {
		message: format!("Failed to encode cache payload: {err}"),
	})?;
	let payload_size = payload_bytes.len();

	if let Some(max) = max_payload_bytes
		&& payload_size as u64 > max
	{
		return Ok(None);
	}

	let expires_at = now + ttl;

	sqlx::query(
		"\
INSERT INTO view_cache (
	cache_key,
	owner_id,
	collection_id,
	payload,
	created_at,
	last_accessed_at,
	expires_at,
	hit_count
)
VALUES ($1,$2,$3,$4,$5,$5,$6,0)
ON CONFLICT (cache_key) DO UPDATE
SET
	payload = EXCLUDED.payload,
	last_accessed_at = EXCLUDED.last_accessed_at,
	expires_at = EXCLUDED.expires_at,
	hit_count = 0",
	)
	.bind(key)
	.bind(owner_id)
	.bind(collection_id)
	.bind(payload)
	.bind(now)
	.bind(expires_at)
	.execute(pool)
	.await?;

	Ok(Some(payload_size))
}

// Write paths call this after their transaction commits; the next read
// recomputes from fresh rows.
pub(crate) async fn invalidate_collection(pool: &PgPool, collection_id: Uuid) -> Result<u64> {
	let result = sqlx::query("DELETE FROM view_cache WHERE collection_id = $1")
		.bind(collection_id)
		.execute(pool)
		.await?;

	Ok(result.rows_affected())
}

pub(crate) async fn purge_expired(pool: &PgPool, now: OffsetDateTime) -> Result<u64> {
	let result =
		sqlx::query("DELETE FROM view_cache WHERE expires_at <= $1").bind(now).execute(pool).await?;

	Ok(result.rows_affected())
}

pub(crate) async fn purge_all(pool: &PgPool) -> Result<u64> {
	let result = sqlx::query("DELETE FROM view_cache").execute(pool).await?;

	Ok(result.rows_affected())
}
