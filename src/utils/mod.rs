//! # Utility Modules
//!
//! Supporting utilities for logging, timing, and observability.
//!
//! ## Components
//! - **Logging**: tracing-subscriber setup from [`crate::config::LoggingConfig`]
//! - **Timeout**: Default bounds and async timeout wrappers
//! - **Metrics**: Per-connection atomic counters

pub mod logging;
pub mod metrics;
pub mod timeout;

pub use metrics::{Metrics, MetricsSnapshot};
