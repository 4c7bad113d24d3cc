//! HTTP/WebSocket surface for the editing pipeline.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, SessionRegistry};
