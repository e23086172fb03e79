//! HTTP front end for the one-time download service.
//!
//! Routes:
//! - `/{namespace}/generate_code` -- issue a code (200, code in body)
//! - `/{namespace}/{code}` -- redeem a code (201 valid, 405 expired, 403 invalid)
//! - `/health` -- liveness and configuration status
//!
//! Any other path is 404. Every internal failure is a bare 503; the detail
//! is logged, never returned.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ServerConfig, StoreBackend, BUCKET_ENV_VAR};
pub use error::{ServerError, ServerResult};
pub use server::OtdServer;
pub use state::AppState;
