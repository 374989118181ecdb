//! Chain connection implementations.
//!
//! Contains the EVM client used for every supported network.

mod evm {
	pub mod client;
}

pub use evm::client::EvmClient;
