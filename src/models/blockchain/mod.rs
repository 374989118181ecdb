//! Blockchain-specific model implementations.
//!
//! Only EVM chains are supported. The `evm` submodule holds the raw RPC shapes
//! consumed by the log normalizer.

pub mod evm;
