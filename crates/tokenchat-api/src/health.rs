use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use tokenchat_types::api::{HealthResponse, TestResponse};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn root() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        time: chrono::Utc::now(),
    })
}

/// GET /api/test — liveness plus store sizes.
pub async fn api_test(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(TestResponse {
        ok: true,
        message: "API is running",
        users_count: state.users.count()?,
        messages_count: state.messages.count()?,
    }))
}
