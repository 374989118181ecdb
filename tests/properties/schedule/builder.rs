//! Property-based tests for cron schedule building.
//! Tests cover interval ranges, calendar rules and expression validity.

use crate::properties::strategies::{calendar_rule_strategy, interval_unit_strategy};
use chain_triggers::{
	models::{IntervalUnit, ScheduleSpec},
	services::schedule::{from_calendar, from_poll_interval, resolve},
	utils::{get_cron_interval_ms, validate_cron},
};
use proptest::{prelude::*, test_runner::Config};

fn max_value(unit: IntervalUnit) -> u32 {
	match unit {
		IntervalUnit::Seconds | IntervalUnit::Minutes => 59,
		IntervalUnit::Hours => 23,
	}
}

fn unit_ms(unit: IntervalUnit) -> i64 {
	match unit {
		IntervalUnit::Seconds => 1_000,
		IntervalUnit::Minutes => 60_000,
		IntervalUnit::Hours => 3_600_000,
	}
}

proptest! {
	#![proptest_config(Config {
		failure_persistence: None,
		..Config::default()
	})]

	#[test]
	fn valid_interval_resolves_to_one_expression(
		unit in interval_unit_strategy(),
		fraction in 0.0f64..1.0,
	) {
		let value = 1 + (fraction * max_value(unit) as f64) as u32;
		let value = value.min(max_value(unit));

		let expressions = resolve(&ScheduleSpec::Interval { value, unit }).unwrap();
		prop_assert_eq!(expressions.len(), 1);
		prop_assert_eq!(expressions[0].split_whitespace().count(), 6);
		prop_assert!(validate_cron(&expressions[0]).is_ok());
	}

	#[test]
	fn divisor_interval_has_exact_period(unit in interval_unit_strategy(), index in 0usize..4) {
		// Step values dividing the unit range evenly tick at a constant period
		let value = match unit {
			IntervalUnit::Seconds | IntervalUnit::Minutes => [1u32, 5, 15, 30][index],
			IntervalUnit::Hours => [1u32, 2, 6, 12][index],
		};

		let expressions = from_poll_interval(value, unit).unwrap();
		prop_assert_eq!(
			get_cron_interval_ms(&expressions[0]),
			Some(value as i64 * unit_ms(unit))
		);
	}

	#[test]
	fn out_of_range_interval_is_rejected(unit in interval_unit_strategy(), excess in 1u32..1000) {
		prop_assert!(from_poll_interval(0, unit).is_err());
		prop_assert!(from_poll_interval(max_value(unit) + excess, unit).is_err());
	}

	#[test]
	fn calendar_rule_builds_valid_expression(rule in calendar_rule_strategy()) {
		let expressions = from_calendar(&rule).unwrap();
		prop_assert_eq!(expressions.len(), 1);
		prop_assert!(validate_cron(&expressions[0]).is_ok());

		let fields: Vec<&str> = expressions[0].split_whitespace().collect();
		prop_assert_eq!(fields[0], "0");
		prop_assert_eq!(fields[1], rule.minute.to_string());
		prop_assert_eq!(fields[2], rule.hour.to_string());
	}

	#[test]
	fn calendar_out_of_range_time_is_rejected(
		mut rule in calendar_rule_strategy(),
		hour in 24u32..100,
		minute in 60u32..100,
	) {
		let mut late = rule.clone();
		late.hour = hour;
		prop_assert!(from_calendar(&late).is_err());

		rule.minute = minute;
		prop_assert!(from_calendar(&rule).is_err());
	}

	#[test]
	fn calendar_union_is_deduplicated(
		rules in prop::collection::vec(calendar_rule_strategy(), 1..6),
		copies in 1usize..4,
	) {
		let repeated: Vec<_> = rules
			.iter()
			.flat_map(|rule| std::iter::repeat(rule.clone()).take(copies))
			.collect();

		let single = resolve(&ScheduleSpec::Calendar { rules: rules.clone() }).unwrap();
		let union = resolve(&ScheduleSpec::Calendar { rules: repeated }).unwrap();

		prop_assert_eq!(&union, &single);
		let mut sorted = union.clone();
		sorted.sort();
		sorted.dedup();
		prop_assert_eq!(sorted.len(), union.len());
	}
}
