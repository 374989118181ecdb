//! Repository implementations for configuration management.
//!
//! This module provides the trigger repository, which loads trigger
//! definitions from JSON files, validates them and gives access to them
//! through a service layer.

mod error;
mod trigger;

pub use error::RepositoryError;
pub use trigger::{TriggerRepository, TriggerRepositoryTrait, TriggerService};
