//! Log filtering and normalization.
//!
//! Implements the EVM side of log watches:
//! - Building topic filters from direction and counterparty parameters
//! - Normalizing matched logs into execution records
//! - ABI helpers shared with view function watches

mod builder;
mod error;
mod helpers;
mod normalizer;

pub use builder::{build_filter, LogFilter, MAX_TOPICS};
pub use error::FilterError;
pub use normalizer::{normalize, FUNGIBLE_TOPIC_COUNT, NON_FUNGIBLE_TOPIC_COUNT};

pub mod evm_helpers {
	pub use super::helpers::*;
}
