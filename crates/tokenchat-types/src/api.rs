use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Message, PublicUser};

// -- Auth --

/// Fields are optional so a missing one surfaces as a validation error with
/// a readable message instead of a body rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub ok: bool,
    pub user: PublicUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UsersQuery {
    pub role: Option<String>,
}

// -- Messages --

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// String or number; numbers are stringified.
    pub conversation_id: Option<Value>,
    pub from_user_id: Option<u64>,
    pub to_user_id: Option<u64>,
    pub sender_role: Option<String>,
    pub text: Option<String>,
    /// Anything non-numeric falls back to the configured default cost.
    pub cost: Option<Value>,
}

impl SendMessageRequest {
    /// The explicit conversation id, if one was supplied and is not blank.
    pub fn conversation_key(&self) -> Option<String> {
        match &self.conversation_id {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(number_key(n)),
            _ => None,
        }
    }
}

/// Integral numbers keep their integer spelling, so `1.0` and `1` name the
/// same conversation.
fn number_key(n: &serde_json::Number) -> String {
    if let Some(v) = n.as_u64() {
        return v.to_string();
    }
    if let Some(v) = n.as_i64() {
        return v.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub ok: bool,
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_tokens: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageQuery {
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
    pub partner_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub ok: bool,
    pub conversation_id: String,
    pub messages: Vec<Message>,
}

// -- Service --

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    pub ok: bool,
    pub message: &'static str,
    pub users_count: usize,
    pub messages_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}
