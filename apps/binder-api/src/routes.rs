use axum::{
	Json, Router,
	extract::{Path, State},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use binder_domain::{CollectionView, Principal, Visibility};
use binder_service::{
	CollectionSummary, CollectionViewRequest, CreateCollectionRequest, CreateNoteRequest,
	CreatePrincipalRequest, DeleteCollectionResponse, DeleteNoteResponse, Error as ServiceError,
	NoteSummary, PrincipalSummary, PurgeCacheRequest, PurgeCacheResponse, RenameCollectionRequest,
	RenameNoteRequest, SetCollectionCollaboratorsRequest, SetCollectionCollaboratorsResponse,
	SetCollectionVisibilityRequest, SetNoteCollaboratorsRequest, SetNoteCollaboratorsResponse,
	SetNoteContentRequest, SetNoteVisibilityRequest,
};

use crate::state::AppState;

/// Requester identity header, set by upstream auth. Absent means anonymous.
pub const REQUESTER_HEADER: &str = "x-binder-requester-id";

pub fn router(state: AppState) -> Router {
	// The share-view route captures two bare segments, so every fixed route
	// must be registered on a reserved first segment.
	Router::new()
		.route("/health", get(health))
		.route("/v1/collections", post(create_collection))
		.route("/v1/collections/{collection_id}", delete(delete_collection))
		.route("/v1/collections/{collection_id}/name", put(rename_collection))
		.route("/v1/collections/{collection_id}/visibility", put(set_collection_visibility))
		.route("/v1/collections/{collection_id}/collaborators", put(set_collection_collaborators))
		.route("/v1/collections/{collection_id}/notes", post(create_note))
		.route("/v1/notes/{note_id}", delete(delete_note))
		.route("/v1/notes/{note_id}/name", put(rename_note))
		.route("/v1/notes/{note_id}/content", put(set_note_content))
		.route("/v1/notes/{note_id}/visibility", put(set_note_visibility))
		.route("/v1/notes/{note_id}/collaborators", put(set_note_collaborators))
		.route("/{owner_handle}/{collection_slug}", get(collection_view))
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/principals", post(create_principal))
		.route("/v1/admin/cache/purge", post(purge_cache))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn collection_view(
	State(state): State<AppState>,
	Path((owner_handle, collection_slug)): Path<(String, String)>,
	headers: HeaderMap,
) -> Result<Json<CollectionView>, ApiError> {
	let requester = requester_from(&headers)?;
	let view = state
		.service
		.collection_view(requester, CollectionViewRequest { owner_handle, collection_slug })
		.await?;

	Ok(Json(view))
}

async fn create_collection(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<CreateCollectionRequest>,
) -> Result<Json<CollectionSummary>, ApiError> {
	let requester = requester_from(&headers)?;
	let response = state.service.create_collection(requester, payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct NameBody {
	name: String,
}

async fn rename_collection(
	State(state): State<AppState>,
	Path(collection_id): Path<Uuid>,
	headers: HeaderMap,
	Json(body): Json<NameBody>,
) -> Result<Json<CollectionSummary>, ApiError> {
	let requester = requester_from(&headers)?;
	let response = state
		.service
		.rename_collection(requester, RenameCollectionRequest { collection_id, name: body.name })
		.await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct VisibilityBody {
	visibility: Visibility,
}

async fn set_collection_visibility(
	State(state): State<AppState>,
	Path(collection_id): Path<Uuid>,
	headers: HeaderMap,
	Json(body): Json<VisibilityBody>,
) -> Result<Json<CollectionSummary>, ApiError> {
	let requester = requester_from(&headers)?;
	let response = state
		.service
		.set_collection_visibility(requester, SetCollectionVisibilityRequest {
			collection_id,
			visibility: body.visibility,
		})
		.await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct CollaboratorsBody {
	collaborator_ids: Vec<Uuid>,
}

async fn set_collection_collaborators(
	State(state): State<AppState>,
	Path(collection_id): Path<Uuid>,
	headers: HeaderMap,
	Json(body): Json<CollaboratorsBody>,
) -> Result<Json<SetCollectionCollaboratorsResponse>, ApiError> {
	let requester = requester_from(&headers)?;
	let response = state
		.service
		.set_collection_collaborators(requester, SetCollectionCollaboratorsRequest {
			collection_id,
			collaborator_ids: body.collaborator_ids,
		})
		.await?;

	Ok(Json(response))
}

async fn delete_collection(
	State(state): State<AppState>,
	Path(collection_id): Path<Uuid>,
	headers: HeaderMap,
) -> Result<Json<DeleteCollectionResponse>, ApiError> {
	let requester = requester_from(&headers)?;
	let response = state.service.delete_collection(requester, collection_id).await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct CreateNoteBody {
	name: String,
	visibility: Visibility,
	#[serde(default)]
	content: String,
	#[serde(default)]
	collaborator_ids: Vec<Uuid>,
}

async fn create_note(
	State(state): State<AppState>,
	Path(collection_id): Path<Uuid>,
	headers: HeaderMap,
	Json(body): Json<CreateNoteBody>,
) -> Result<Json<NoteSummary>, ApiError> {
	let requester = requester_from(&headers)?;
	let response = state
		.service
		.create_note(requester, CreateNoteRequest {
			collection_id,
			name: body.name,
			visibility: body.visibility,
			content: body.content,
			collaborator_ids: body.collaborator_ids,
		})
		.await?;

	Ok(Json(response))
}

async fn rename_note(
	State(state): State<AppState>,
	Path(note_id): Path<Uuid>,
	headers: HeaderMap,
	Json(body): Json<NameBody>,
) -> Result<Json<NoteSummary>, ApiError> {
	let requester = requester_from(&headers)?;
	let response = state
		.service
		.rename_note(requester, RenameNoteRequest { note_id, name: body.name })
		.await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct ContentBody {
	content: String,
}

async fn set_note_content(
	State(state): State<AppState>,
	Path(note_id): Path<Uuid>,
	headers: HeaderMap,
	Json(body): Json<ContentBody>,
) -> Result<Json<NoteSummary>, ApiError> {
	let requester = requester_from(&headers)?;
	let response = state
		.service
		.set_note_content(requester, SetNoteContentRequest { note_id, content: body.content })
		.await?;

	Ok(Json(response))
}

async fn set_note_visibility(
	State(state): State<AppState>,
	Path(note_id): Path<Uuid>,
	headers: HeaderMap,
	Json(body): Json<VisibilityBody>,
) -> Result<Json<NoteSummary>, ApiError> {
	let requester = requester_from(&headers)?;
	let response = state
		.service
		.set_note_visibility(requester, SetNoteVisibilityRequest {
			note_id,
			visibility: body.visibility,
		})
		.await?;

	Ok(Json(response))
}

async fn set_note_collaborators(
	State(state): State<AppState>,
	Path(note_id): Path<Uuid>,
	headers: HeaderMap,
	Json(body): Json<CollaboratorsBody>,
) -> Result<Json<SetNoteCollaboratorsResponse>, ApiError> {
	let requester = requester_from(&headers)?;
	let response = state
		.service
		.set_note_collaborators(requester, SetNoteCollaboratorsRequest {
			note_id,
			collaborator_ids: body.collaborator_ids,
		})
		.await?;

	Ok(Json(response))
}

async fn delete_note(
	State(state): State<AppState>,
	Path(note_id): Path<Uuid>,
	headers: HeaderMap,
) -> Result<Json<DeleteNoteResponse>, ApiError> {
	let requester = requester_from(&headers)?;
	let response = state.service.delete_note(requester, note_id).await?;

	Ok(Json(response))
}

async fn create_principal(
	State(state): State<AppState>,
	Json(payload): Json<CreatePrincipalRequest>,
) -> Result<Json<PrincipalSummary>, ApiError> {
	let response = state.service.create_principal(payload).await?;

	Ok(Json(response))
}

async fn purge_cache(
	State(state): State<AppState>,
	Json(payload): Json<PurgeCacheRequest>,
) -> Result<Json<PurgeCacheResponse>, ApiError> {
	let response = state.service.purge_cache(payload).await?;

	Ok(Json(response))
}

fn requester_from(headers: &HeaderMap) -> Result<Principal, ApiError> {
	let Some(raw) = headers.get(REQUESTER_HEADER) else {
		return Ok(Principal::Anonymous);
	};
	let id =
		raw.to_str().ok().and_then(|value| Uuid::parse_str(value.trim()).ok()).ok_or_else(|| {
			ApiError::new(
				StatusCode::BAD_REQUEST,
				"VALIDATION_ERROR",
				format!("{REQUESTER_HEADER} must be a UUID."),
			)
		})?;

	Ok(Principal::Authenticated { id })
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: &'static str,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}

impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
		Self { status, error_code, message: message.into() }
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message),
			ServiceError::AccessDenied { message } =>
				Self::new(StatusCode::FORBIDDEN, "ACCESS_DENIED", message),
			ServiceError::UserNotFound { message } =>
				Self::new(StatusCode::NOT_FOUND, "USER_NOT_FOUND", message),
			ServiceError::CollectionNotFound { message } =>
				Self::new(StatusCode::NOT_FOUND, "COLLECTION_NOT_FOUND", message),
			ServiceError::NoteNotFound { message } =>
				Self::new(StatusCode::NOT_FOUND, "NOTE_NOT_FOUND", message),
			ServiceError::Conflict { message } =>
				Self::new(StatusCode::CONFLICT, "CONFLICT", message),
			ServiceError::SlugExhausted { message } =>
				Self::new(StatusCode::CONFLICT, "SLUG_EXHAUSTED", message),
			ServiceError::Storage { message } => {
				tracing::error!(error = message.as_str(), "Storage failure.");

				Self::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"STORAGE_ERROR",
					"Internal storage error.",
				)
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
