//! Property-based tests for log filter building and matching.

use crate::properties::strategies::{address_strategy, log_direction_strategy};
use alloy::primitives::{Address, B256};
use chain_triggers::{
	models::{EVMLog, LogDirection},
	services::filter::{
		build_filter,
		evm_helpers::{event_signature, pad_address},
	},
	utils::tests::builders::trigger::LogBuilder,
};
use proptest::{prelude::*, test_runner::Config};

fn transfer(contract: Address, from: Address, to: Address) -> EVMLog {
	LogBuilder::new()
		.address(contract)
		.topic(event_signature("Transfer(address,address,uint256)"))
		.topic(pad_address(from))
		.topic(pad_address(to))
		.build()
}

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn counterparty_pinned_to_direction_slot(
		direction in log_direction_strategy(),
		counterparty in address_strategy(),
		contract in proptest::option::of(address_strategy()),
	) {
		let filter = build_filter(Some(direction), Some(counterparty), contract).unwrap();
		let padded = Some(pad_address(counterparty));

		prop_assert_eq!(filter.address, contract);
		prop_assert_eq!(filter.topics[0], None);
		match direction {
			LogDirection::From => {
				prop_assert_eq!(filter.topics[1], padded);
				prop_assert_eq!(filter.topics[2], None);
			}
			LogDirection::To => {
				prop_assert_eq!(filter.topics[1], None);
				prop_assert_eq!(filter.topics[2], padded);
			}
			LogDirection::Either => {
				prop_assert_eq!(filter.topics[1], None);
				prop_assert_eq!(filter.topics[2], None);
				prop_assert_eq!(filter.participant, padded);
			}
		}
	}

	#[test]
	fn direction_without_counterparty_is_rejected(
		direction in log_direction_strategy(),
		contract in proptest::option::of(address_strategy()),
	) {
		prop_assert!(build_filter(Some(direction), None, contract).is_err());
	}

	#[test]
	fn filter_matches_logs_it_describes(
		direction in log_direction_strategy(),
		counterparty in address_strategy(),
		other in address_strategy(),
		contract in address_strategy(),
	) {
		let filter = build_filter(Some(direction), Some(counterparty), Some(contract))
			.unwrap()
			.with_topic(0, event_signature("Transfer(address,address,uint256)"));

		let outgoing = transfer(contract, counterparty, other);
		let incoming = transfer(contract, other, counterparty);

		match direction {
			LogDirection::From => prop_assert!(filter.matches(&outgoing)),
			LogDirection::To => prop_assert!(filter.matches(&incoming)),
			LogDirection::Either => {
				prop_assert!(filter.matches(&outgoing));
				prop_assert!(filter.matches(&incoming));
			}
		}
	}

	#[test]
	fn filter_rejects_unrelated_logs(
		direction in log_direction_strategy(),
		counterparty in address_strategy(),
		a in address_strategy(),
		b in address_strategy(),
		contract in address_strategy(),
		foreign in address_strategy(),
	) {
		prop_assume!(a != counterparty && b != counterparty && foreign != contract);

		let filter = build_filter(Some(direction), Some(counterparty), Some(contract)).unwrap();

		prop_assert!(!filter.matches(&transfer(contract, a, b)));
		// Wrong emitter, right participants
		prop_assert!(!filter.matches(&transfer(foreign, counterparty, counterparty)));
	}

	#[test]
	fn rpc_object_lists_pinned_slots(
		direction in log_direction_strategy(),
		counterparty in address_strategy(),
		topic0 in prop::array::uniform32(any::<u8>()).prop_map(B256::from),
	) {
		let filter = build_filter(Some(direction), Some(counterparty), None)
			.unwrap()
			.with_topic(0, topic0);
		let object = filter.to_rpc_object();
		let topics = object["topics"].as_array().unwrap();

		let expected_len = match direction {
			LogDirection::From => 2,
			LogDirection::To => 3,
			LogDirection::Either => 1,
		};
		prop_assert_eq!(topics.len(), expected_len);
		prop_assert!(object.get("address").is_none());
	}
}
