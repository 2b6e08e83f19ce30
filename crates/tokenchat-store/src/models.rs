//! Stored row types. `UserRow` carries the credential hash and stays inside
//! this crate; callers only ever see `PublicUser`.

use chrono::{DateTime, Utc};
use tokenchat_types::models::{PublicUser, Role};

pub(crate) struct UserRow {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub tokens: u64,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            tokens: self.tokens,
            created_at: self.created_at,
        }
    }

    pub fn email_matches(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.to_lowercase()
    }
}

/// A message before the store assigns its id and timestamp.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: String,
    pub from_user_id: u64,
    pub to_user_id: u64,
    pub sender_role: Role,
    pub text: String,
    pub cost: u64,
}
