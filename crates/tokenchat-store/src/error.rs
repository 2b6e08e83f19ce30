use thiserror::Error;
use tokenchat_crypto::CryptoError;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    #[error("user already exists")]
    Conflict,

    #[error("login failed")]
    Auth,

    #[error("{0}")]
    NotFound(String),

    #[error("not enough tokens: balance {balance}, cost {cost}")]
    InsufficientTokens { balance: u64, cost: u64 },

    #[error("credential error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn user_not_found(id: u64) -> Self {
        Self::NotFound(format!("user {} not found", id))
    }
}
