//! Axum HTTP API server for the job board.
//!
//! This crate provides:
//! - Job posting and job application endpoints
//! - Cookie-based JWT sessions
//! - Security headers, CORS and request logging
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

pub use config::{ApiConfig, ConfigError, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::ApplicationService;
pub use session::{SessionClaims, SessionCodec, SessionError};
pub use state::AppState;
