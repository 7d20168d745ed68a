//! HTTP middleware components.

pub mod auth;
pub mod logging;
pub mod metrics;

pub use auth::{require_admin, ADMIN_KEY_HEADER};
pub use logging::{init_logging, request_span, REQUEST_ID_HEADER};
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
