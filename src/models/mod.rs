//! Domain models and data structures for chain triggers.
//!
//! This module contains all the core data structures used throughout the application:
//!
//! - `blockchain`: Raw chain data as delivered by RPC endpoints (EVM logs)
//! - `config`: Configuration loading and validation
//! - `core`: Core domain models (networks, watches, trigger configs, records)
//! - `security`: Security models (Secret)

mod blockchain;
mod config;
mod core;
mod security;

// Re-export blockchain types
pub use blockchain::evm::EVMLog;

// Re-export core types
pub use core::{
	BalanceWatch, CalendarMode, CalendarRule, Direction, ExecutionRecord, ExecutionRecordBuilder,
	IntervalUnit, LogDirection, LogWatch, NetworkEndpointSpec, ProviderCredential, ProviderKind,
	ScheduleSpec, ScheduleWatch, TriggerConfig, ViewFunctionWatch, WatchSpec, API_KEY_PLACEHOLDER,
};

// Re-export config types
pub use config::{ConfigError, ConfigLoader, ProviderSettings, TriggerConfigFile};

// Re-export security types
pub use security::{SecretString, SecretValue, SecurityError, SecurityResult};
