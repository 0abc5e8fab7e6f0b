//! REST endpoints for the onboarding wizard.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::error::{Error, OnboardingError, UploadError};

use super::controller::{OnboardingService, SubmitOutcome};
use super::flow::FlowVariant;
use super::model::StepInput;

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OnboardingService>,
}

/// Build the Axum router with onboarding REST routes.
pub fn onboarding_routes(service: Arc<OnboardingService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(health))
        .route("/api/onboarding/{user_id}/status", get(get_status))
        .route("/api/onboarding/{user_id}/step", post(submit_step))
        .route("/api/onboarding/{user_id}/previous", post(go_previous))
        .route("/api/onboarding/{user_id}/skip", post(skip))
        .route("/api/onboarding/{user_id}/autosave", post(autosave))
        .route("/api/onboarding/{user_id}/avatar", post(upload_avatar))
        .route("/api/onboarding/{user_id}", delete(delete_profile))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Query selecting the flow variant; defaults to the generic flow.
#[derive(Debug, Default, Deserialize)]
struct FlowQuery {
    #[serde(default)]
    flow: Option<String>,
}

impl FlowQuery {
    fn variant(&self) -> FlowVariant {
        self.flow
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "onboard"
    }))
}

/// GET /api/onboarding/{user_id}/status
async fn get_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FlowQuery>,
) -> impl IntoResponse {
    let session = state.service.session(&user_id, query.variant()).await;
    Json(session.status().await)
}

/// POST /api/onboarding/{user_id}/step
///
/// Body: tagged step fields, e.g. `{"kind": "profile", "first_name": ...}`.
async fn submit_step(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FlowQuery>,
    Json(input): Json<StepInput>,
) -> impl IntoResponse {
    let session = state.service.session(&user_id, query.variant()).await;
    match session.submit(input).await {
        Ok(outcome) => {
            let code = match &outcome {
                SubmitOutcome::Advanced { .. } | SubmitOutcome::Completed => StatusCode::OK,
                SubmitOutcome::Invalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                SubmitOutcome::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                SubmitOutcome::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (code, Json(serde_json::to_value(&outcome).unwrap_or_default())).into_response()
        }
        Err(e) => onboarding_error_response(e),
    }
}

/// POST /api/onboarding/{user_id}/previous
async fn go_previous(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FlowQuery>,
) -> impl IntoResponse {
    let session = state.service.session(&user_id, query.variant()).await;
    match session.previous().await {
        Ok(step) => Json(serde_json::json!({"status": "ok", "step": step})).into_response(),
        Err(e) => onboarding_error_response(e),
    }
}

/// POST /api/onboarding/{user_id}/skip
///
/// Investor flow, step 1 only. Persists nothing; the caller navigates to
/// its completion handler on success.
async fn skip(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FlowQuery>,
) -> impl IntoResponse {
    let session = state.service.session(&user_id, query.variant()).await;
    match session.skip().await {
        Ok(()) => Json(serde_json::json!({"status": "skipped"})).into_response(),
        Err(e) => onboarding_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct AutosaveRequest {
    step: u32,
    fields: serde_json::Value,
}

/// POST /api/onboarding/{user_id}/autosave
///
/// Queues a debounced best-effort save; always accepted. The save status
/// is reported via the status endpoint.
async fn autosave(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<FlowQuery>,
    Json(request): Json<AutosaveRequest>,
) -> impl IntoResponse {
    let session = state.service.session(&user_id, query.variant()).await;
    session.queue_autosave(request.step, request.fields);
    StatusCode::ACCEPTED
}

/// POST /api/onboarding/{user_id}/avatar
///
/// Raw image bytes with a `Content-Type` header. Constraints are checked
/// before the blob store is touched.
async fn upload_avatar(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    match state
        .service
        .upload_avatar(&user_id, body.to_vec(), &mime)
        .await
    {
        Ok(url) => Json(serde_json::json!({"url": url})).into_response(),
        Err(Error::Upload(e @ (UploadError::TooLarge { .. } | UploadError::UnsupportedType { .. }))) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": e.to_string(), "field": "avatar"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// DELETE /api/onboarding/{user_id}
///
/// Administrative removal of the profile and everything it owns.
async fn delete_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.service.delete_profile(&user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

fn onboarding_error_response(error: OnboardingError) -> axum::response::Response {
    let code = match &error {
        OnboardingError::InvalidTransition { .. } => StatusCode::CONFLICT,
        OnboardingError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        OnboardingError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (code, Json(serde_json::json!({"error": error.to_string()}))).into_response()
}
