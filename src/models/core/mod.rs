//! Core domain models for the trigger subsystem.
//!
//! This module contains the fundamental data structures that represent:
//! - Networks: Provider kinds and endpoint specifications
//! - Watches: The conditions a trigger waits for
//! - Triggers: Resolved per-instance trigger configuration
//! - Records: The normalized payload emitted when a trigger fires

mod network;
mod record;
mod trigger;
mod watch;

pub use network::{NetworkEndpointSpec, ProviderKind, API_KEY_PLACEHOLDER};
pub use record::{ExecutionRecord, ExecutionRecordBuilder};
pub use trigger::{ProviderCredential, TriggerConfig};
pub use watch::{
	BalanceWatch, CalendarMode, CalendarRule, Direction, IntervalUnit, LogDirection, LogWatch,
	ScheduleSpec, ScheduleWatch, ViewFunctionWatch, WatchSpec,
};
