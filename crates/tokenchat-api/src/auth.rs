use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracing::warn;

use tokenchat_store::StoreError;
use tokenchat_types::api::{LoginRequest, RegisterRequest, UserResponse};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/register — `{email, password, role}`.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    let role = req.role.unwrap_or_default();

    // Argon2 is CPU bound; keep it off the async workers
    let users = state.users.clone();
    let user = tokio::task::spawn_blocking(move || users.register(&email, &password, &role))
        .await??;

    Ok(Json(UserResponse { ok: true, user }))
}

/// POST /api/login — `{email, password, role?}`. Stateless: credentials are
/// checked on every call and no session is issued.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();
    let role = req.role;

    let users = state.users.clone();
    let user = tokio::task::spawn_blocking(move || {
        users.authenticate(&email, &password, role.as_deref())
    })
    .await?
    .inspect_err(|e| {
        if matches!(e, StoreError::Auth) {
            warn!("Login failed");
        }
    })?;

    Ok(Json(UserResponse { ok: true, user }))
}
