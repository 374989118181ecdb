//! Utility modules for common functionality.
//!
//! - cron_utils: Validation and simulation of six-field cron expressions
//! - http: Retryable HTTP clients and the retry policy
//! - logging: Logging setup and the shared error context
//! - metrics: Prometheus metrics and the metrics server
//! - parsing: Size, hex quantity and address parsing
//! - tests: Builders used by unit, integration and property tests

mod cron_utils;

pub mod http;
pub mod logging;
pub mod metrics;
pub mod parsing;
pub mod tests;

pub use cron_utils::*;
pub use http::*;
pub use parsing::*;
