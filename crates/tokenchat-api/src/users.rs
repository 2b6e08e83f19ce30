use axum::{
    Json,
    extract::{Path, Query, State, rejection::{PathRejection, QueryRejection}},
    response::IntoResponse,
};

use tokenchat_store::StoreError;
use tokenchat_types::api::{UserResponse, UsersQuery};
use tokenchat_types::models::Role;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/users[?role=model] — used by the model picker.
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<UsersQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;

    let role = match query.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(r) => Some(
            r.parse::<Role>()
                .map_err(|e| StoreError::validation(e.to_string()))?,
        ),
        None => None,
    };

    Ok(Json(state.users.list(role)?))
}

/// GET /api/users/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    user_id: Result<Path<u64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(user_id) = user_id?;
    let user = state.users.find_by_id(user_id)?;
    Ok(Json(UserResponse { ok: true, user }))
}
