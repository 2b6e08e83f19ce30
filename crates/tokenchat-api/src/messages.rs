use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};

use tokenchat_types::api::{
    ConversationResponse, MessageQuery, SendMessageRequest, SendMessageResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/messages
///
/// Two forms:
/// - `?conversationId=X` returns `{ok, conversationId, messages}`
/// - `?userId=A&partnerId=B` returns the bare array of messages between A and B
///
/// Both are in creation order. An unknown conversation is an empty list.
pub async fn get_messages(
    State(state): State<AppState>,
    query: Result<Query<MessageQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;

    if let Some(conversation_id) = non_blank(query.conversation_id) {
        let messages = state.messages.query_by_conversation(&conversation_id)?;
        return Ok(Json(ConversationResponse {
            ok: true,
            conversation_id,
            messages,
        })
        .into_response());
    }

    match (non_blank(query.user_id), non_blank(query.partner_id)) {
        (Some(user_id), Some(partner_id)) => {
            let user_id = parse_id("userId", &user_id)?;
            let partner_id = parse_id("partnerId", &partner_id)?;
            let messages = state.messages.query_by_participants(user_id, partner_id)?;
            Ok(Json(messages).into_response())
        }
        _ => Err(ApiError::BadRequest(
            "conversationId or userId and partnerId are required".to_string(),
        )),
    }
}

/// GET /api/messages/forUser/{user_id} — everything the user sent or received.
pub async fn messages_for_user(
    State(state): State<AppState>,
    user_id: Result<Path<u64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(user_id) = user_id?;
    state.users.find_by_id(user_id)?;
    Ok(Json(state.messages.query_for_user(user_id)?))
}

/// POST /api/messages and /api/messages/send
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let sent = state.ledger.send_message(&req)?;

    Ok(Json(SendMessageResponse {
        ok: true,
        message: sent.message,
        remaining_tokens: sent.remaining_tokens,
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_id(field: &str, raw: &str) -> Result<u64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("{} must be a non-negative integer", field)))
}
