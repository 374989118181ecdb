//! Core services implementing the business logic.
//!
//! This module contains the main service implementations:
//! - `blockchain`: Provider factory, connection pool and RPC transports
//! - `catalog`: Static endpoint catalog per network and provider kind
//! - `comparator`: Snapshot comparison for polling watches
//! - `emitter`: Emission contract with the workflow engine
//! - `filter`: Log filter building and log normalization
//! - `schedule`: Cron expression building and job scheduling
//! - `trigger`: Trigger lifecycle registry

pub mod blockchain;
pub mod catalog;
pub mod comparator;
pub mod emitter;
pub mod filter;
pub mod schedule;
pub mod trigger;
