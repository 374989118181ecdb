//! EVM log data structure.

use alloy::primitives::{Address, Bytes, B256, U64};
use serde::{Deserialize, Serialize};

/// Raw log as returned by `eth_getLogs` and `eth_subscribe("logs")`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
	/// Emitting contract
	pub address: Address,
	/// Topics
	pub topics: Vec<B256>,
	/// Data
	#[serde(default)]
	pub data: Bytes,
	/// Block Hash
	#[serde(rename = "blockHash", default)]
	pub block_hash: Option<B256>,
	/// Block Number
	#[serde(rename = "blockNumber", default)]
	pub block_number: Option<U64>,
	/// Transaction Hash
	#[serde(rename = "transactionHash", default)]
	pub transaction_hash: Option<B256>,
	/// Log Index in Block
	#[serde(rename = "logIndex", default)]
	pub log_index: Option<U64>,
	/// Whether the log was removed by a reorg
	#[serde(default)]
	pub removed: Option<bool>,
}
