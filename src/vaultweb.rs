//! HTTP surface for the record store
//!
//! Thin handlers over the lifecycle and navigation layers. Store calls
//! run on the blocking pool under a bounded deadline so a stuck medium
//! surfaces as a timeout instead of hanging the request. All `/api/log`
//! routes sit behind the shared-secret check; health probes stay open.

use axum::{
    extract::{Path, Query, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, error};
use uuid::Uuid;

use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::errors::{VaultError, VaultResult};
use crate::log_record::{DeleteMode, LogRecord, RecordDraft};

const SECRET_HEADER: &str = "x-secret-key";

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    uuid: Uuid,
    #[serde(flatten)]
    draft: RecordDraft,
}

#[derive(Debug, Deserialize)]
struct AdminQuery {
    #[serde(default)]
    admin: bool,
}

#[derive(Debug, Serialize)]
struct MutationResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uuid: Option<Uuid>,
}

impl MutationResponse {
    fn success() -> Self {
        MutationResponse {
            status: "success",
            sequence_id: None,
            uuid: None,
        }
    }

    fn created(sequence_id: u64, uuid: Uuid) -> Self {
        MutationResponse {
            status: "success",
            sequence_id: Some(sequence_id),
            uuid: Some(uuid),
        }
    }
}

#[derive(Debug, Serialize)]
struct NewIdResponse {
    new_id: u64,
}

#[derive(Debug, Serialize)]
struct FirstIdResponse {
    first_id: Option<u64>,
}

#[derive(Debug, Serialize)]
struct NextIdResponse {
    next_id: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PreviousIdResponse {
    previous_id: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ExistsResponse {
    exists: bool,
}

#[derive(Debug, Serialize)]
struct UuidResponse {
    uuid: Uuid,
}

/// Build the full application router around shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/log/add", post(add_log))
        .route("/api/log/update", post(update_log))
        .route("/api/log/first", get(first_id))
        .route("/api/log/new", get(new_id))
        .route("/api/log/next/{id}", get(next_id))
        .route("/api/log/previous/{id}", get(previous_id))
        .route("/api/log/exists/{id}", get(exists_id))
        .route("/api/log/uuid/{id}", get(uuid_for_sequence))
        .route("/api/log/get/{uuid}", get(get_log))
        .route("/api/log/delete/{id}/{uuid}", delete(delete_log))
        .route("/api/log/admin-delete/{id}/{uuid}", delete(admin_delete_log))
        .layer(middleware::from_fn_with_state(state.clone(), require_secret));

    Router::new()
        .merge(api)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Shared-secret gate. Disabled entirely when no secret is configured.
async fn require_secret(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = &state.secret_key {
        let presented = request
            .headers()
            .get(SECRET_HEADER)
            .and_then(|value| value.to_str().ok());
        match presented {
            None => return Err(AppError::unauthorized("missing x-secret-key header")),
            Some(candidate) if candidate != expected => {
                return Err(AppError::forbidden("invalid secret key"));
            }
            Some(_) => {}
        }
    }
    Ok(next.run(request).await)
}

/// Run a store call on the blocking pool under the configured deadline.
async fn run_store<T, F>(
    state: &Arc<AppState>,
    operation: &'static str,
    task: F,
) -> Result<T, AppError>
where
    F: FnOnce() -> VaultResult<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(task);
    let joined = match tokio::time::timeout(state.io_timeout, handle).await {
        Ok(joined) => joined,
        Err(_) => {
            error!(operation, "store call exceeded its deadline");
            return Err(AppError::from(VaultError::storage_timeout(operation)));
        }
    };
    let result = joined.map_err(|e| {
        error!(operation, error = %e, "store task failed to complete");
        AppError::internal("store task failed")
    })?;

    result.map_err(|e| {
        match &e {
            VaultError::Validation { .. }
            | VaultError::NotFound { .. }
            | VaultError::Mismatch { .. } => debug!(operation, error = %e, "request rejected"),
            _ => error!(operation, error = %e, "store call failed"),
        }
        AppError::from(e)
    })
}

#[axum::debug_handler]
async fn add_log(
    State(state): State<Arc<AppState>>,
    Json(draft): Json<RecordDraft>,
) -> Result<Json<MutationResponse>, AppError> {
    let st = state.clone();
    let (sequence_id, uuid) =
        run_store(&state, "create record", move || st.lifecycle.create(&draft)).await?;
    Ok(Json(MutationResponse::created(sequence_id, uuid)))
}

#[axum::debug_handler]
async fn update_log(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let st = state.clone();
    run_store(&state, "update record", move || {
        st.lifecycle.update(request.uuid, &request.draft)
    })
    .await?;
    Ok(Json(MutationResponse::success()))
}

async fn first_id(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FirstIdResponse>, AppError> {
    let st = state.clone();
    let first_id = run_store(&state, "first id", move || st.navigation.first()).await?;
    Ok(Json(FirstIdResponse { first_id }))
}

async fn new_id(State(state): State<Arc<AppState>>) -> Result<Json<NewIdResponse>, AppError> {
    let st = state.clone();
    let new_id = run_store(&state, "new id", move || st.navigation.new_id()).await?;
    Ok(Json(NewIdResponse { new_id }))
}

async fn next_id(
    State(state): State<Arc<AppState>>,
    Path(current): Path<u64>,
) -> Result<Json<NextIdResponse>, AppError> {
    let st = state.clone();
    let next_id = run_store(&state, "next id", move || st.navigation.next(current)).await?;
    Ok(Json(NextIdResponse { next_id }))
}

async fn previous_id(
    State(state): State<Arc<AppState>>,
    Path(current): Path<u64>,
) -> Result<Json<PreviousIdResponse>, AppError> {
    let st = state.clone();
    let previous_id =
        run_store(&state, "previous id", move || st.navigation.previous(current)).await?;
    Ok(Json(PreviousIdResponse { previous_id }))
}

async fn exists_id(
    State(state): State<Arc<AppState>>,
    Path(sequence_id): Path<u64>,
) -> Result<Json<ExistsResponse>, AppError> {
    let st = state.clone();
    let exists = run_store(&state, "exists", move || {
        st.navigation.exists(sequence_id)
    })
    .await?;
    Ok(Json(ExistsResponse { exists }))
}

async fn uuid_for_sequence(
    State(state): State<Arc<AppState>>,
    Path(sequence_id): Path<u64>,
) -> Result<Json<UuidResponse>, AppError> {
    let st = state.clone();
    let uuid = run_store(&state, "resolve uuid", move || {
        st.allocator.resolve_uuid(sequence_id)
    })
    .await?;
    Ok(Json(UuidResponse { uuid }))
}

async fn get_log(
    State(state): State<Arc<AppState>>,
    Path(uuid): Path<Uuid>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<LogRecord>, AppError> {
    let st = state.clone();
    let record = run_store(&state, "read record", move || {
        st.lifecycle.fetch(uuid, query.admin)
    })
    .await?;
    Ok(Json(record))
}

async fn delete_log(
    State(state): State<Arc<AppState>>,
    Path((sequence_id, uuid)): Path<(u64, Uuid)>,
) -> Result<Json<MutationResponse>, AppError> {
    let st = state.clone();
    run_store(&state, "delete record", move || {
        st.lifecycle.delete(sequence_id, uuid, DeleteMode::Soft)
    })
    .await?;
    Ok(Json(MutationResponse::success()))
}

async fn admin_delete_log(
    State(state): State<Arc<AppState>>,
    Path((sequence_id, uuid)): Path<(u64, Uuid)>,
) -> Result<Json<MutationResponse>, AppError> {
    let st = state.clone();
    run_store(&state, "admin delete record", move || {
        st.lifecycle.delete(sequence_id, uuid, DeleteMode::Hard)
    })
    .await?;
    Ok(Json(MutationResponse::success()))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn readyz(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let st = state.clone();
    let handle = tokio::task::spawn_blocking(move || st.store.max_sequence());
    let ready = matches!(
        tokio::time::timeout(state.io_timeout, handle).await,
        Ok(Ok(Ok(_)))
    );
    Json(serde_json::json!({ "ready": ready }))
}
