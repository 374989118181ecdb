//! Error types for filter operations.
//!
//! Defines the error cases raised while building log filters, encoding view
//! calls and decoding chain data.

use crate::utils::logging::error::{ErrorContext, TraceableError};
use std::collections::HashMap;
use thiserror::Error as ThisError;
use uuid::Uuid;

/// Represents errors that can occur during filter operations
#[derive(ThisError, Debug)]
pub enum FilterError {
	/// The filter parameters are inconsistent
	#[error("Invalid filter: {0}")]
	InvalidFilter(ErrorContext),

	/// Chain data could not be decoded
	#[error("Decode error: {0}")]
	DecodeError(ErrorContext),

	/// An ABI fragment or call argument is unusable
	#[error("ABI error: {0}")]
	AbiError(ErrorContext),

	/// Other errors that don't fit into the categories above
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl FilterError {
	// Invalid filter error
	pub fn invalid_filter(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::InvalidFilter(ErrorContext::new_with_log(msg, source, metadata))
	}

	// Decode error; not logged on construction since undecodable logs are routine
	pub fn decode_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::DecodeError(ErrorContext::new(msg, source, metadata))
	}

	// ABI error
	pub fn abi_error(
		msg: impl Into<String>,
		source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
		metadata: Option<HashMap<String, String>>,
	) -> Self {
		Self::AbiError(ErrorContext::new_with_log(msg, source, metadata))
	}
}

impl TraceableError for FilterError {
	fn trace_id(&self) -> String {
		match self {
			Self::InvalidFilter(ctx) => ctx.trace_id.clone(),
			Self::DecodeError(ctx) => ctx.trace_id.clone(),
			Self::AbiError(ctx) => ctx.trace_id.clone(),
			Self::Other(_) => Uuid::new_v4().to_string(),
		}
	}
}
