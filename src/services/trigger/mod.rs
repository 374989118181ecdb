//! Trigger lifecycle management.
//!
//! This module provides the registry that starts and stops triggers by key,
//! the validation run before a trigger is started, and the per watch kind
//! strategies that produce execution records.

mod error;
mod registry;
mod validation;
mod watchers;

pub use error::TriggerError;
pub use registry::{StartOutcome, TriggerRegistry};
pub use validation::validate_trigger_config;
pub use watchers::{balance_record, schedule_record, view_record, Emitter};
