pub mod error;
pub mod ledger;
pub mod messages;
pub mod models;
pub mod users;

use tokenchat_types::models::{Message, PublicUser, Role};

pub use error::{Result, StoreError};
pub use ledger::{Ledger, SentMessage};
pub use messages::MemoryMessageStore;
pub use models::NewMessage;
pub use users::MemoryUserStore;

/// Starting client balance when nothing else is configured.
pub const DEFAULT_CLIENT_START_TOKENS: u64 = 100;

/// Cost of a message whose sender does not name one.
pub const DEFAULT_MESSAGE_COST: u64 = 1;

/// Account storage. Implementations must keep the balance check and the
/// debit in `debit_if_sufficient` inside a single critical section.
pub trait UserStore: Send + Sync {
    /// Create an account. Blank fields and unknown roles are rejected, as is
    /// a second account with the same (case-insensitive) email and role.
    fn register(&self, email: &str, password: &str, role: &str) -> Result<PublicUser>;

    /// Match credentials. Email is case-insensitive, password is exact.
    /// With no role, the earliest account whose credentials match wins.
    fn authenticate(&self, email: &str, password: &str, role: Option<&str>) -> Result<PublicUser>;

    /// All accounts in registration order, optionally restricted to a role.
    fn list(&self, role: Option<Role>) -> Result<Vec<PublicUser>>;

    fn find_by_id(&self, id: u64) -> Result<PublicUser>;

    /// Subtract `amount` from the balance if it covers it.
    /// Returns the new balance; leaves it untouched on failure.
    fn debit_if_sufficient(&self, id: u64, amount: u64) -> Result<u64>;

    /// Add `amount` back to the balance. Returns the new balance.
    fn credit(&self, id: u64, amount: u64) -> Result<u64>;

    fn count(&self) -> Result<usize>;
}

/// Message storage. Every query returns messages in creation order.
pub trait MessageStore: Send + Sync {
    fn append(&self, new: NewMessage) -> Result<Message>;

    fn query_by_conversation(&self, conversation_id: &str) -> Result<Vec<Message>>;

    /// Messages exchanged between `a` and `b`, in either direction.
    fn query_by_participants(&self, a: u64, b: u64) -> Result<Vec<Message>>;

    /// Messages sent or received by `user_id`.
    fn query_for_user(&self, user_id: u64) -> Result<Vec<Message>>;

    fn count(&self) -> Result<usize>;
}

/// Product knobs for balances and pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub client_start_tokens: u64,
    pub default_message_cost: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            client_start_tokens: DEFAULT_CLIENT_START_TOKENS,
            default_message_cost: DEFAULT_MESSAGE_COST,
        }
    }
}
