//! Trigger error types and handling.
//!
//! Provides error types for trigger lifecycle operations: configuration
//! rejections, connectivity failures, undecodable chain data and registry
//! conflicts.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents errors that can occur during trigger operations
#[derive(ThisError, Debug)]
pub enum TriggerError {
	/// The trigger configuration cannot be started. Never retried.
	#[error("Configuration error: {0}")]
	ConfigurationError(ErrorContext),

	/// A connection could not be built or a read failed
	#[error("Connectivity error: {0}")]
	ConnectivityError(ErrorContext),

	/// Chain data could not be decoded
	#[error("Decode error: {0}")]
	DecodeError(ErrorContext),

	/// Another trigger is already live under the key
	#[error("Duplicate trigger: {0}")]
	DuplicateTrigger(ErrorContext),

	/// The trigger was stopped while it was starting
	#[error("Cancelled: {0}")]
	Cancelled(ErrorContext),

	/// Jobs could not be added to or removed from the scheduler
	#[error("Scheduler error: {0}")]
	SchedulerError(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl TriggerError {
	// Configuration error
	pub fn configuration_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConfigurationError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Configuration error without logging, used while validating config files
	pub fn configuration_error_without_log(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConfigurationError(ErrorContext::new(msg, source, metadata))
	}

	// Connectivity error
	pub fn connectivity_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::ConnectivityError(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Decode error, not logged on construction
	pub fn decode_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::DecodeError(ErrorContext::new(msg, source, metadata))
	}

	// Duplicate trigger error
	pub fn duplicate_trigger(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::DuplicateTrigger(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Cancelled error
	pub fn cancelled(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::Cancelled(ErrorContext::new(msg, source, metadata))
	}

	// Scheduler error
	pub fn scheduler_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::SchedulerError(ErrorContext::new_with_log(msg, source, metadata))
	}

	/// Returns true for errors that reject a configuration outright
	pub fn is_configuration(&self) -> bool {
		matches!(self, Self::ConfigurationError(_))
	}
}

impl TraceableError for TriggerError {
	fn trace_id(&self) -> String {
		match self {
			Self::ConfigurationError(ctx) => ctx.trace_id.clone(),
			Self::ConnectivityError(ctx) => ctx.trace_id.clone(),
			Self::DecodeError(ctx) => ctx.trace_id.clone(),
			Self::DuplicateTrigger(ctx) => ctx.trace_id.clone(),
			Self::Cancelled(ctx) => ctx.trace_id.clone(),
			Self::SchedulerError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
