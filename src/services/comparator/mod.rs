//! Polling snapshot comparator.
//!
//! Balance and view function watches read a value on every tick and compare it
//! with the previous read. This module provides the comparison state and the
//! readers producing the values.

mod reader;
mod snapshot;

pub use reader::{read_balance, ViewFunctionReader};
pub use snapshot::{Fired, Observation, Snapshot, SnapshotValue};
