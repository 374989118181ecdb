//! Converts raw EVM logs into execution records.
//!
//! ERC-20 and ERC-721 transfers share the `Transfer(address,address,uint256)`
//! signature and differ only in whether the value is indexed, so the expected
//! topic count decides which shape a log is read as.

use alloy::primitives::U256;
use serde_json::Value;

use crate::{
	models::{EVMLog, ExecutionRecord, NetworkEndpointSpec},
	services::filter::helpers::{b256_to_string, h160_to_string, topic_to_address},
};

/// Topic count of a transfer with the value in the data section (ERC-20)
pub const FUNGIBLE_TOPIC_COUNT: usize = 3;

/// Topic count of a transfer with an indexed token id (ERC-721)
pub const NON_FUNGIBLE_TOPIC_COUNT: usize = 4;

/// Parses a token id from an indexed topic.
///
/// Leading zero bytes are stripped before parsing; an all-zero topic is `0`.
fn token_id_from_topic(topic: &[u8]) -> String {
	let significant = match topic.iter().position(|byte| *byte != 0) {
		Some(start) => &topic[start..],
		None => return "0".to_string(),
	};
	U256::from_be_slice(significant).to_string()
}

/// Normalizes a raw log into an execution record.
///
/// Returns `None` when the log was removed by a reorg, when its topic count
/// differs from `expected_topic_count`, or when its data cannot be decoded.
pub fn normalize(
	log: &EVMLog,
	network: &NetworkEndpointSpec,
	expected_topic_count: usize,
) -> Option<ExecutionRecord> {
	if log.removed == Some(true) {
		tracing::debug!("Skipping removed log");
		return None;
	}
	if log.topics.len() != expected_topic_count {
		return None;
	}

	let contract = h160_to_string(log.address);
	let transaction_hash = log.transaction_hash.map(b256_to_string);

	let mut builder = ExecutionRecord::builder()
		.field("contractAddress", contract.clone())
		.field("network", network.network.clone())
		.field("chainId", network.chain_id)
		.field(
			"topics",
			log.topics
				.iter()
				.map(|topic| Value::String(b256_to_string(*topic)))
				.collect::<Vec<_>>(),
		)
		.field("data", format!("0x{}", hex::encode(&log.data)))
		.optional_field("from", log.topics.get(1).map(|t| h160_to_string(topic_to_address(t))))
		.optional_field("to", log.topics.get(2).map(|t| h160_to_string(topic_to_address(t))))
		.optional_field("transactionHash", transaction_hash.clone())
		.optional_field("blockNumber", log.block_number.map(|n| n.to::<u64>()))
		.optional_field("logIndex", log.log_index.map(|n| n.to::<u64>()));

	let mut token_id = None;
	if expected_topic_count == NON_FUNGIBLE_TOPIC_COUNT {
		let id = token_id_from_topic(log.topics[3].as_slice());
		builder = builder.field("tokenId", id.clone());
		token_id = Some(id);
	} else if expected_topic_count == FUNGIBLE_TOPIC_COUNT {
		let Some(word) = log.data.get(..32) else {
			tracing::debug!(
				contract = %contract,
				data_len = log.data.len(),
				"Dropping log whose data is shorter than one word"
			);
			return None;
		};
		builder = builder.field("amount", U256::from_be_slice(word).to_string());
	}

	if let Some(hash) = &transaction_hash {
		builder = builder.field("explorerLink", network.transaction_link(hash));
	}
	if let Some(id) = &token_id {
		builder = builder.optional_field("openseaLink", network.marketplace_link(&contract, id));
	}

	Some(builder.build())
}
