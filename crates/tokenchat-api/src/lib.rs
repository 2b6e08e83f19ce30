pub mod auth;
pub mod error;
pub mod health;
pub mod messages;
pub mod routes;
pub mod state;
pub mod users;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
