//! Ethereum Virtual Machine (EVM) specific data structures.

mod log;

pub use log::Log as EVMLog;
