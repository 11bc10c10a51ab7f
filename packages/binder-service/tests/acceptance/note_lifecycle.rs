use uuid::Uuid;

use binder_domain::{Principal, Visibility};
use binder_service::{
	CreateNoteRequest, Error, RenameNoteRequest, SetNoteCollaboratorsRequest,
	SetNoteContentRequest, SetNoteVisibilityRequest,
};

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn note_slugs_are_scoped_to_the_collection() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping note_lifecycle; set BINDER_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;
	let as_alice = Principal::Authenticated { id: alice.principal_id };
	let inbox = super::add_collection(&service, as_alice, "Inbox", Visibility::Private).await;
	let archive = super::add_collection(&service, as_alice, "Archive", Visibility::Private).await;

	let first =
		super::add_note(&service, as_alice, inbox.collection_id, "Draft", Visibility::Private, "")
			.await;
	let second =
		super::add_note(&service, as_alice, inbox.collection_id, "Draft", Visibility::Private, "")
			.await;
	let elsewhere = super::add_note(
		&service,
		as_alice,
		archive.collection_id,
		"Draft",
		Visibility::Private,
		"",
	)
	.await;

	assert_eq!(first.slug, "draft");
	assert_eq!(second.slug, "draft-1");
	assert_eq!(elsewhere.slug, "draft");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn content_updates_move_the_content_clock() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping note_lifecycle; set BINDER_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;
	let as_alice = Principal::Authenticated { id: alice.principal_id };
	let log = super::add_collection(&service, as_alice, "Log", Visibility::Public).await;
	let note =
		super::add_note(&service, as_alice, log.collection_id, "Entry", Visibility::Public, "v1")
			.await;

	let updated = service
		.set_note_content(as_alice, SetNoteContentRequest {
			note_id: note.note_id,
			content: "v2".to_string(),
		})
		.await
		.expect("Failed to set content.");

	assert_eq!(updated.content, "v2");
	assert!(updated.content_updated_at > note.content_updated_at);

	// A rename touches the note but not its content clock.
	let renamed = service
		.rename_note(as_alice, RenameNoteRequest {
			note_id: note.note_id,
			name: "Entry One".to_string(),
		})
		.await
		.expect("Failed to rename note.");

	assert_eq!(renamed.name, "Entry One");
	assert_eq!(renamed.slug, "entry");
	// The content clock stays behind the note clock after a metadata change.
	assert!(renamed.content_updated_at < renamed.updated_at);
	assert!(renamed.updated_at > updated.updated_at);

	// The share view reflects the new content at once.
	let view = service
		.collection_view(Principal::Anonymous, super::view_req("alice", "log"))
		.await
		.expect("Failed to read view.");

	assert_eq!(view.notes[0].content, "v2");
	assert_eq!(view.notes[0].name, "Entry One");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn note_visibility_controls_presence_in_the_view() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping note_lifecycle; set BINDER_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;
	let as_alice = Principal::Authenticated { id: alice.principal_id };
	let blog = super::add_collection(&service, as_alice, "Blog", Visibility::Public).await;
	let post =
		super::add_note(&service, as_alice, blog.collection_id, "Post", Visibility::Public, "Hi.")
			.await;

	let view = service
		.collection_view(Principal::Anonymous, super::view_req("alice", "blog"))
		.await
		.expect("Failed to read view.");

	assert_eq!(view.notes.len(), 1);

	service
		.set_note_visibility(as_alice, SetNoteVisibilityRequest {
			note_id: post.note_id,
			visibility: Visibility::Private,
		})
		.await
		.expect("Failed to set note visibility.");

	// Hidden notes drop out silently; the collection itself stays readable.
	let view = service
		.collection_view(Principal::Anonymous, super::view_req("alice", "blog"))
		.await
		.expect("Failed to read view.");

	assert!(view.notes.is_empty());

	let view = service
		.collection_view(as_alice, super::view_req("alice", "blog"))
		.await
		.expect("Failed to read view.");

	assert_eq!(view.notes.len(), 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn note_collaborators_see_hidden_notes() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping note_lifecycle; set BINDER_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;
	let bob = super::register(&service, "bob").await;
	let as_alice = Principal::Authenticated { id: alice.principal_id };
	let as_bob = Principal::Authenticated { id: bob.principal_id };
	let pad = super::add_collection(&service, as_alice, "Pad", Visibility::Public).await;
	let draft =
		super::add_note(&service, as_alice, pad.collection_id, "Draft", Visibility::Private, "..")
			.await;

	service
		.set_note_collaborators(as_alice, SetNoteCollaboratorsRequest {
			note_id: draft.note_id,
			collaborator_ids: vec![bob.principal_id],
		})
		.await
		.expect("Failed to set note collaborators.");

	let view = service
		.collection_view(as_bob, super::view_req("alice", "pad"))
		.await
		.expect("Failed to read view as bob.");

	assert_eq!(view.notes.len(), 1);

	let roster = view.notes[0].collaborators.clone().expect("Bob must see the roster.");

	assert_eq!(roster[0].handle, "bob");

	let view = service
		.collection_view(Principal::Anonymous, super::view_req("alice", "pad"))
		.await
		.expect("Failed to read view anonymously.");

	assert!(view.notes.is_empty());

	let err = service
		.set_note_collaborators(as_alice, SetNoteCollaboratorsRequest {
			note_id: draft.note_id,
			collaborator_ids: vec![Uuid::new_v4()],
		})
		.await
		.expect_err("Unknown principals must be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn only_the_note_owner_mutates() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping note_lifecycle; set BINDER_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;
	let bob = super::register(&service, "bob").await;
	let as_alice = Principal::Authenticated { id: alice.principal_id };
	let as_bob = Principal::Authenticated { id: bob.principal_id };
	let desk = super::add_collection(&service, as_alice, "Desk", Visibility::Private).await;
	let memo =
		super::add_note(&service, as_alice, desk.collection_id, "Memo", Visibility::Private, "-")
			.await;

	let err = service
		.create_note(as_bob, CreateNoteRequest {
			collection_id: desk.collection_id,
			name: "Intruder".to_string(),
			visibility: Visibility::Private,
			content: String::new(),
			collaborator_ids: Vec::new(),
		})
		.await
		.expect_err("Only the collection owner may add notes.");

	assert!(matches!(err, Error::AccessDenied { .. }));

	let err = service
		.set_note_content(as_bob, SetNoteContentRequest {
			note_id: memo.note_id,
			content: "hijack".to_string(),
		})
		.await
		.expect_err("Only the note owner may edit.");

	assert!(matches!(err, Error::AccessDenied { .. }));

	let err = service
		.create_note(as_alice, CreateNoteRequest {
			collection_id: Uuid::new_v4(),
			name: "Orphan".to_string(),
			visibility: Visibility::Private,
			content: String::new(),
			collaborator_ids: Vec::new(),
		})
		.await
		.expect_err("Unknown collections must not resolve.");

	assert!(matches!(err, Error::CollectionNotFound { .. }));

	let err = service
		.delete_note(as_alice, Uuid::new_v4())
		.await
		.expect_err("Unknown notes must not resolve.");

	assert!(matches!(err, Error::NoteNotFound { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BINDER_PG_DSN to run."]
async fn deleted_notes_leave_the_view() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping note_lifecycle; set BINDER_PG_DSN to run this test.");

		return;
	};
	let cfg = super::test_config(test_db.dsn().to_string());
	let service = super::build_service(cfg).await.expect("Failed to build service.");
	let alice = super::register(&service, "alice").await;
	let as_alice = Principal::Authenticated { id: alice.principal_id };
	let pile = super::add_collection(&service, as_alice, "Pile", Visibility::Public).await;
	let scrap =
		super::add_note(&service, as_alice, pile.collection_id, "Scrap", Visibility::Public, "x")
			.await;

	let view = service
		.collection_view(Principal::Anonymous, super::view_req("alice", "pile"))
		.await
		.expect("Failed to read view.");

	assert_eq!(view.notes.len(), 1);

	let response =
		service.delete_note(as_alice, scrap.note_id).await.expect("Failed to delete note.");

	assert!(response.deleted);

	let view = service
		.collection_view(Principal::Anonymous, super::view_req("alice", "pile"))
		.await
		.expect("Failed to read view.");

	assert!(view.notes.is_empty());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
