use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use tokenchat_store::StoreError;
use tokenchat_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Request could not be read: bad JSON, bad query string or path.
    #[error("{0}")]
    BadRequest(String),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::Validation(_))
            | Self::Store(StoreError::Conflict)
            | Self::Store(StoreError::InsufficientTokens { .. })
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::Auth) => StatusCode::UNAUTHORIZED,
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Crypto(_))
            | Self::Store(StoreError::Poisoned(_))
            | Self::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                ok: false,
                error: message,
            }),
        )
            .into_response()
    }
}
