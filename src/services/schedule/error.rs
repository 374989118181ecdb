//! Schedule error types.
//!
//! Raised while converting polling intervals, calendar rules and raw cron
//! expressions into scheduler jobs.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents errors that can occur while building schedules
#[derive(ThisError, Debug)]
pub enum ScheduleError {
	/// A numeric field is outside its allowed range
	#[error("Invalid range: {0}")]
	InvalidRange(ErrorContext),

	/// A cron expression cannot be parsed or never fires
	#[error("Invalid expression: {0}")]
	InvalidExpression(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl ScheduleError {
	// Invalid range error; validation failures are reported by the caller
	pub fn invalid_range(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidRange(ErrorContext::new(msg, source, metadata))
	}

	// Invalid expression error
	pub fn invalid_expression(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidExpression(ErrorContext::new(msg, source, metadata))
	}
}

impl TraceableError for ScheduleError {
	fn trace_id(&self) -> String {
		match self {
			Self::InvalidRange(ctx) => ctx.trace_id.clone(),
			Self::InvalidExpression(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
