//! Blockchain workflow trigger core.
//!
//! This library starts and stops triggers that watch EVM networks and emits an
//! execution record every time one fires. It includes:
//!
//! - A static endpoint catalog and a provider factory with fallback and pooling
//! - Log filters with direction and counterparty, and log normalization
//! - Snapshot comparison for balance and view function polling
//! - Cron schedule building for polling intervals and calendar rules
//! - A keyed trigger registry delivering records to the workflow engine
//!
//! # Module Structure
//!
//! - `bootstrap`: Bootstraps the application
//! - `models`: Trigger configuration, watch conditions and execution records
//! - `repositories`: Trigger configuration loading
//! - `services`: Catalog, providers, filters, comparator, schedules and registry
//! - `utils`: Common utilities and helper functions

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
