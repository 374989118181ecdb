//! Property-based tests for the polling snapshot comparator.
//! Tests cover baseline handling, direction semantics and delta computation.

use crate::properties::strategies::{direction_strategy, u256_strategy};
use alloy::primitives::{I256, U256};
use chain_triggers::{
	models::Direction,
	services::comparator::{Snapshot, SnapshotValue},
};
use proptest::{prelude::*, test_runner::Config};
use serde_json::json;

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn first_read_never_fires(value in u256_strategy(), direction in direction_strategy()) {
		let mut snapshot = Snapshot::new();
		prop_assert!(snapshot.observe(value, direction).is_none());
		prop_assert_eq!(snapshot.baseline(), Some(&value));
	}

	#[test]
	fn equal_reads_never_fire(
		value in u256_strategy(),
		direction in direction_strategy(),
		repeats in 1usize..10,
	) {
		let mut snapshot = Snapshot::new();
		snapshot.observe(value, direction);
		for _ in 0..repeats {
			prop_assert!(snapshot.observe(value, direction).is_none());
		}
	}

	#[test]
	fn any_fires_iff_value_differs(previous in u256_strategy(), current in u256_strategy()) {
		let mut snapshot = Snapshot::new();
		snapshot.observe(previous, Direction::Any);
		let fired = snapshot.observe(current, Direction::Any);
		prop_assert_eq!(fired.is_some(), previous != current);
	}

	#[test]
	fn direction_decides_firing(
		previous in u256_strategy(),
		current in u256_strategy(),
		direction in direction_strategy(),
	) {
		let mut snapshot = Snapshot::new();
		snapshot.observe(previous, direction);
		let fired = snapshot.observe(current, direction);

		let expected = match direction {
			Direction::Increase => current > previous,
			Direction::Decrease => current < previous,
			Direction::Any => current != previous,
		};
		prop_assert_eq!(fired.is_some(), expected);
		// Every read replaces the baseline, fired or not
		prop_assert_eq!(snapshot.baseline(), Some(&current));
	}

	#[test]
	fn delta_is_signed_difference(previous in u256_strategy(), current in u256_strategy()) {
		prop_assume!(previous != current);

		let mut snapshot = Snapshot::new();
		snapshot.observe(previous, Direction::Any);
		let fired = snapshot.observe(current, Direction::Any).unwrap();

		let expected = if current > previous {
			(current - previous).to_string()
		} else {
			format!("-{}", previous - current)
		};
		prop_assert_eq!(fired.delta, Some(expected));
		prop_assert_eq!(fired.previous, previous);
		prop_assert_eq!(fired.current, current);
	}

	#[test]
	fn signed_delta_matches_i128_arithmetic(previous in any::<i64>(), current in any::<i64>()) {
		prop_assume!(previous != current);

		let mut snapshot = Snapshot::new();
		snapshot.observe(I256::try_from(previous).unwrap(), Direction::Any);
		let fired = snapshot
			.observe(I256::try_from(current).unwrap(), Direction::Any)
			.unwrap();

		let expected = (current as i128 - previous as i128).to_string();
		prop_assert_eq!(fired.delta, Some(expected));
	}

	#[test]
	fn structured_values_only_fire_on_any(
		previous in "[a-z]{1,8}",
		current in "[a-z]{1,8}",
		direction in direction_strategy(),
	) {
		prop_assume!(previous != current);

		let mut snapshot = Snapshot::new();
		snapshot.observe(SnapshotValue::Structured(json!([previous])), direction);
		let fired = snapshot.observe(SnapshotValue::Structured(json!([current])), direction);

		prop_assert_eq!(fired.is_some(), direction == Direction::Any);
		if let Some(fired) = fired {
			prop_assert!(fired.delta.is_none());
		}
	}

	#[test]
	fn failed_reads_keep_baseline(
		baseline in u256_strategy(),
		failures in 1usize..5,
		direction in direction_strategy(),
	) {
		let mut snapshot: Snapshot<U256> = Snapshot::new();
		snapshot.observe(baseline, direction);
		for _ in 0..failures {
			let result = snapshot.evaluate(Err::<U256, &str>("endpoint down"), direction);
			prop_assert!(result.is_err());
		}
		prop_assert_eq!(snapshot.baseline(), Some(&baseline));
	}
}
