//! EVM log filter construction and matching.
//!
//! A [`LogFilter`] pins any of the four topic slots and optionally the emitting
//! contract. The direction parameters of a log watch pin the counterparty to
//! slot 1 (`from`) or slot 2 (`to`); `either` cannot be expressed as a single
//! RPC topic filter, so both slots stay wildcards on the wire and the
//! counterparty is checked on the client.

use alloy::primitives::{Address, B256};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::{
	models::{EVMLog, LogDirection},
	services::filter::{
		error::FilterError,
		helpers::{b256_to_string, h160_to_string, pad_address},
	},
};

/// Number of indexed topic slots an EVM log can carry
pub const MAX_TOPICS: usize = 4;

/// Log filter shared by push subscriptions and `eth_getLogs` polling
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LogFilter {
	/// Emitting contract, if restricted
	pub address: Option<Address>,
	/// Pinned topic per slot; `None` is a wildcard
	pub topics: [Option<B256>; MAX_TOPICS],
	/// Counterparty that must appear in slot 1 or slot 2
	pub participant: Option<B256>,
}

/// Builds a log filter from the direction parameters of a log watch.
///
/// # Arguments
/// * `direction` - Which slot the counterparty is pinned to
/// * `counterparty` - Address expected in that slot
/// * `contract_address` - Restricts matching to one emitting contract
///
/// # Errors
/// Returns `FilterError::InvalidFilter` when a direction is given without a counterparty.
pub fn build_filter(
	direction: Option<LogDirection>,
	counterparty: Option<Address>,
	contract_address: Option<Address>,
) -> Result<LogFilter, FilterError> {
	let mut filter = LogFilter {
		address: contract_address,
		..Default::default()
	};

	let Some(direction) = direction else {
		return Ok(filter);
	};

	let counterparty = counterparty.ok_or_else(|| {
		FilterError::invalid_filter(
			"direction requires a counterparty address",
			None,
			Some(HashMap::from([(
				"direction".to_string(),
				format!("{:?}", direction).to_lowercase(),
			)])),
		)
	})?;
	let padded = pad_address(counterparty);

	match direction {
		LogDirection::From => filter.topics[1] = Some(padded),
		LogDirection::To => filter.topics[2] = Some(padded),
		LogDirection::Either => filter.participant = Some(padded),
	}

	Ok(filter)
}

impl LogFilter {
	/// Pins a topic slot. Slots outside `0..4` are ignored.
	pub fn with_topic(mut self, index: usize, topic: B256) -> Self {
		if let Some(slot) = self.topics.get_mut(index) {
			*slot = Some(topic);
		}
		self
	}

	/// Returns true when the log satisfies every pinned slot, the address
	/// restriction and the participant check
	pub fn matches(&self, log: &EVMLog) -> bool {
		if let Some(address) = self.address {
			if log.address != address {
				return false;
			}
		}

		let slots_match = self
			.topics
			.iter()
			.enumerate()
			.all(|(index, pinned)| match pinned {
				Some(topic) => log.topics.get(index) == Some(topic),
				None => true,
			});
		if !slots_match {
			return false;
		}

		match &self.participant {
			Some(participant) => {
				log.topics.get(1) == Some(participant) || log.topics.get(2) == Some(participant)
			}
			None => true,
		}
	}

	/// JSON-RPC filter object accepted by `eth_subscribe("logs")` and `eth_getLogs`.
	///
	/// Trailing wildcard slots are omitted.
	pub fn to_rpc_object(&self) -> Value {
		let mut object = Map::new();

		if let Some(address) = self.address {
			object.insert("address".to_string(), json!(h160_to_string(address)));
		}

		let last_pinned = self.topics.iter().rposition(Option::is_some);
		if let Some(last) = last_pinned {
			let topics: Vec<Value> = self.topics[..=last]
				.iter()
				.map(|topic| match topic {
					Some(topic) => json!(b256_to_string(*topic)),
					None => Value::Null,
				})
				.collect();
			object.insert("topics".to_string(), Value::Array(topics));
		}

		Value::Object(object)
	}
}
