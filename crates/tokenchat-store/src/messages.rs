use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use tokenchat_types::models::Message;

use crate::models::NewMessage;
use crate::{MessageStore, Result, StoreError};

struct MessageLog {
    rows: Vec<Message>,
    next_id: u64,
}

/// Append-only in-process message log.
///
/// Rows are kept in id order, which is also creation and timestamp order, so
/// queries are a filter over the log with no re-sort needed.
pub struct MemoryMessageStore {
    log: Mutex<MessageLog>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self {
            log: Mutex::new(MessageLog {
                rows: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MessageLog>> {
        self.log
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn filter<F>(&self, predicate: F) -> Result<Vec<Message>>
    where
        F: Fn(&Message) -> bool,
    {
        Ok(self
            .lock()?
            .rows
            .iter()
            .filter(|m| predicate(m))
            .cloned()
            .collect())
    }
}

impl Default for MemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore for MemoryMessageStore {
    fn append(&self, new: NewMessage) -> Result<Message> {
        let mut log = self.lock()?;
        let id = log.next_id;
        log.next_id += 1;

        let message = Message {
            id,
            conversation_id: new.conversation_id,
            from_user_id: new.from_user_id,
            to_user_id: new.to_user_id,
            sender_role: new.sender_role,
            text: new.text,
            cost: new.cost,
            timestamp: chrono::Utc::now(),
        };
        log.rows.push(message.clone());
        Ok(message)
    }

    fn query_by_conversation(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let messages = self.filter(|m| m.conversation_id == conversation_id)?;
        debug!(conversation_id, count = messages.len(), "Conversation query");
        Ok(messages)
    }

    fn query_by_participants(&self, a: u64, b: u64) -> Result<Vec<Message>> {
        self.filter(|m| {
            (m.from_user_id == a && m.to_user_id == b) || (m.from_user_id == b && m.to_user_id == a)
        })
    }

    fn query_for_user(&self, user_id: u64) -> Result<Vec<Message>> {
        self.filter(|m| m.from_user_id == user_id || m.to_user_id == user_id)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.lock()?.rows.len())
    }
}
