use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub slugs: Slugs,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Cache {
	pub enabled: bool,
	/// Lifetime of a cached collection view. The cache is a read-through
	/// layer over already-filtered payloads; the TTL is the staleness
	/// backstop behind invalidate-on-write.
	pub ttl_seconds: i64,
	/// Upper bound on a single cache lookup. A lookup that exceeds it is
	/// treated as a miss and the view is recomputed.
	pub read_timeout_ms: u64,
	pub max_payload_bytes: Option<u64>,
}
impl Default for Cache {
	fn default() -> Self {
		Self {
			enabled: true,
			ttl_seconds: 60,
			read_timeout_ms: 250,
			max_payload_bytes: Some(1_048_576),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Slugs {
	/// Candidates tried against the in-scope taken set before giving up.
	pub max_attempts: u32,
	/// Insert retries after a unique-index collision with a concurrent
	/// writer.
	pub insert_retries: u32,
}
impl Default for Slugs {
	fn default() -> Self {
		Self { max_attempts: 1_000, insert_retries: 3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}
