use std::sync::Arc;

use tokenchat_store::{
    Ledger, MemoryMessageStore, MemoryUserStore, MessageStore, StoreConfig, UserStore,
};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub users: Arc<dyn UserStore>,
    pub messages: Arc<dyn MessageStore>,
    pub ledger: Ledger,
}

impl AppStateInner {
    pub fn new(
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
        config: StoreConfig,
    ) -> Self {
        let ledger = Ledger::new(users.clone(), messages.clone(), config.default_message_cost);
        Self {
            users,
            messages,
            ledger,
        }
    }

    /// Fresh, empty in-memory stores.
    pub fn in_memory(config: StoreConfig) -> AppState {
        Arc::new(Self::new(
            Arc::new(MemoryUserStore::new(config.client_start_tokens)),
            Arc::new(MemoryMessageStore::new()),
            config,
        ))
    }
}
