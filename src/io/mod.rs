//! IO modules - external interfaces
//!
//! This module contains the service boundary:
//! - `http` - hyper HTTP server (JSON API, static frontend, /metrics)
//! - `request` - Validation of inbound location payloads
//! - `prometheus` - Prometheus text exposition

pub mod http;
pub mod prometheus;
pub mod request;

// Re-export commonly used types
pub use http::{start_http_server, AppState};
pub use request::{parse_location_body, ValidationError};
