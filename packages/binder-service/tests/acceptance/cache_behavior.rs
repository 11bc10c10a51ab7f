use binder_domain::{Principal, Visibility};
use binder_service::{
	PurgeCacheRequest, PurgeScope, RenameCollectionRequest, SetNoteContentRequest,
};

async fn cache_rows(pool: &sqlx::PgPool) -> Vec<(String, i64)> {
	sqlx::query_as::<_, (String, i64)>(
		"SELECT cache_key, hit_count FROM view_cache ORDER BY cache_key",
	)
	.fetch_all(pool)
	.await
	.expect("Failed to read view_cache.")
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn repeat_reads_hit_the_cache() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping cache_behavior; set BINDER_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;
	let as_alice = Principal::Authenticated { id: alice.principal_id };
	let zine = super::add_collection(&service, as_alice, "Zine", Visibility::Public).await;

	super::add_note(&service, as_alice, zine.collection_id, "Page", Visibility::Public, "p1")
		.await;

	let first = service
		.collection_view(Principal::Anonymous, super::view_req("alice", "zine"))
		.await
		.expect("Failed to read view.");
	let rows = cache_rows(&service.db.pool).await;

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].1, 0);

	let second = service
		.collection_view(Principal::Anonymous, super::view_req("alice", "zine"))
		.await
		.expect("Failed to read view.");
	let rows = cache_rows(&service.db.pool).await;

	assert_eq!(first, second);
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].1, 1);

	// Requester identity is part of the key, so the owner's read is a miss.
	let owned = service
		.collection_view(as_alice, super::view_req("alice", "zine"))
		.await
		.expect("Failed to read view as the owner.");
	let rows = cache_rows(&service.db.pool).await;

	assert_eq!(owned.collection_id, zine.collection_id);
	assert_eq!(rows.len(), 2);

	// Handle case folds into the key; this read reuses the anonymous entry.
	service
		.collection_view(Principal::Anonymous, super::view_req("Alice", "zine"))
		.await
		.expect("Failed to read view with a differently-cased handle.");

	let rows = cache_rows(&service.db.pool).await;

	assert_eq!(rows.len(), 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn writes_invalidate_cached_views() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping cache_behavior; set BINDER_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;
	let as_alice = Principal::Authenticated { id: alice.principal_id };
	let news = super::add_collection(&service, as_alice, "News", Visibility::Public).await;
	let item =
		super::add_note(&service, as_alice, news.collection_id, "Item", Visibility::Public, "v1")
			.await;

	service
		.collection_view(Principal::Anonymous, super::view_req("alice", "news"))
		.await
		.expect("Failed to read view.");

	assert_eq!(cache_rows(&service.db.pool).await.len(), 1);

	service
		.rename_collection(as_alice, RenameCollectionRequest {
			collection_id: news.collection_id,
			name: "Olds".to_string(),
		})
		.await
		.expect("Failed to rename collection.");

	assert!(cache_rows(&service.db.pool).await.is_empty());

	let view = service
		.collection_view(Principal::Anonymous, super::view_req("alice", "news"))
		.await
		.expect("Failed to read view after rename.");

	assert_eq!(view.name, "Olds");

	// Note-level writes drop the parent collection's entries too.
	service
		.set_note_content(as_alice, SetNoteContentRequest {
			note_id: item.note_id,
			content: "v2".to_string(),
		})
		.await
		.expect("Failed to set content.");

	assert!(cache_rows(&service.db.pool).await.is_empty());

	let view = service
		.collection_view(Principal::Anonymous, super::view_req("alice", "news"))
		.await
		.expect("Failed to read view after the edit.");

	assert_eq!(view.notes[0].content, "v2");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn disabled_cache_stores_nothing() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping cache_behavior; set BINDER_PG_DSN to run this test.");

		return;
	};
	let mut cfg = super::test_config(test_db.dsn().to_string());

	cfg.cache.enabled = false;

	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;
	let as_alice = Principal::Authenticated { id: alice.principal_id };

	super::add_collection(&service, as_alice, "Plain", Visibility::Public).await;
	service
		.collection_view(Principal::Anonymous, super::view_req("alice", "plain"))
		.await
		.expect("Failed to read view.");

	assert!(cache_rows(&service.db.pool).await.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn oversized_payloads_are_not_cached() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping cache_behavior; set BINDER_PG_DSN to run this test.");

		return;
	};
	let mut cfg = super::test_config(test_db.dsn().to_string());

	cfg.cache.max_payload_bytes = Some(64);

	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;
	let as_alice = Principal::Authenticated { id: alice.principal_id };
	let big = super::add_collection(&service, as_alice, "Big", Visibility::Public).await;

	super::add_note(
		&service,
		as_alice,
		big.collection_id,
		"Blob",
		Visibility::Public,
		&"x".repeat(4_096),
	)
	.await;

	let view = service
		.collection_view(Principal::Anonymous, super::view_req("alice", "big"))
		.await
		.expect("An uncacheable view must still be served.");

	assert_eq!(view.notes.len(), 1);
	assert!(cache_rows(&service.db.pool).await.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn purge_scopes_expired_or_everything() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping cache_behavior; set BINDER_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;
	let as_alice = Principal::Authenticated { id: alice.principal_id };

	super::add_collection(&service, as_alice, "One", Visibility::Public).await;
	super::add_collection(&service, as_alice, "Two", Visibility::Public).await;
	service
		.collection_view(Principal::Anonymous, super::view_req("alice", "one"))
		.await
		.expect("Failed to read view.");
	service
		.collection_view(Principal::Anonymous, super::view_req("alice", "two"))
		.await
		.expect("Failed to read view.");

	// Age one entry past its TTL by hand.
	sqlx::query(
		"\
UPDATE view_cache
SET expires_at = NOW() - INTERVAL '1 minute'
WHERE cache_key = (SELECT MIN(cache_key) FROM view_cache)",
	)
	.execute(&service.db.pool)
	.await
	.expect("Failed to age a cache entry.");

	let purged = service
		.purge_cache(PurgeCacheRequest { scope: PurgeScope::Expired })
		.await
		.expect("Failed to purge expired entries.");

	assert_eq!(purged.purged, 1);
	assert_eq!(cache_rows(&service.db.pool).await.len(), 1);

	let purged = service
		.purge_cache(PurgeCacheRequest { scope: PurgeScope::All })
		.await
		.expect("Failed to purge the cache.");

	assert_eq!(purged.purged, 1);
	assert!(cache_rows(&service.db.pool).await.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
