//! HTTP surface of the agegate verification service.
//!
//! The axum router exposes the verification lifecycle (`/verify/*`), the
//! signed-asset gate (`/assets/signed`), and the operational endpoints
//! (`/health`, `/metrics`). The webhook route is the trust boundary: it
//! works on raw body bytes and nothing reaches the orchestrator without a
//! valid provider signature.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use logging::{init_logging, LogFormat};
pub use metrics::ApiMetrics;
pub use server::{build_router, ApiServer};
pub use state::AppState;
