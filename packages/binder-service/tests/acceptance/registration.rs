use binder_service::{CreatePrincipalRequest, Error};

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn handles_are_unique_ignoring_case() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping registration; set BINDER_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;

	assert_eq!(alice.handle, "alice");

	let err = service
		.create_principal(CreatePrincipalRequest {
			handle: "Alice".to_string(),
			display_name: "Impostor".to_string(),
			avatar_url: None,
		})
		.await
		.expect_err("Handles must be unique ignoring case.");

	assert!(matches!(err, Error::Conflict { .. }));

	let err = service
		.create_principal(CreatePrincipalRequest {
			handle: "health".to_string(),
			display_name: "Probe".to_string(),
			avatar_url: None,
		})
		.await
		.expect_err("Reserved handles must be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	let err = service
		.create_principal(CreatePrincipalRequest {
			handle: "not a handle".to_string(),
			display_name: "Spacey".to_string(),
			avatar_url: None,
		})
		.await
		.expect_err("Malformed handles must be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	// A blank avatar collapses to no avatar.
	let carol = service
		.create_principal(CreatePrincipalRequest {
			handle: "carol".to_string(),
			display_name: "Carol".to_string(),
			avatar_url: Some("   ".to_string()),
		})
		.await
		.expect("Failed to create principal.");

	assert_eq!(carol.avatar_url, None);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
