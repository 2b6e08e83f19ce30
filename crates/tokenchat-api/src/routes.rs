use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;
use crate::{auth, health, messages, users};

/// All HTTP routes. Cross-cutting layers (CORS, tracing) are added by the
/// binary so tests can drive the bare router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/api/test", get(health::api_test))
        .route("/api/users", get(users::list_users))
        .route("/api/users/{user_id}", get(users::get_user))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route(
            "/api/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .route("/api/messages/send", post(messages::send_message))
        .route(
            "/api/messages/forUser/{user_id}",
            get(messages::messages_for_user),
        )
        .with_state(state)
}
