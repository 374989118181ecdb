use alloy::primitives::{Address, U256};
use chain_triggers::models::{
	CalendarMode, CalendarRule, Direction, IntervalUnit, LogDirection,
};
use proptest::prelude::*;

pub fn address_strategy() -> impl Strategy<Value = Address> {
	prop::array::uniform20(any::<u8>()).prop_map(Address::from)
}

pub fn u256_strategy() -> impl Strategy<Value = U256> {
	prop_oneof![
		any::<u64>().prop_map(U256::from),
		any::<u128>().prop_map(U256::from),
		prop::array::uniform32(any::<u8>()).prop_map(U256::from_be_bytes),
	]
}

pub fn direction_strategy() -> impl Strategy<Value = Direction> {
	prop_oneof![
		Just(Direction::Increase),
		Just(Direction::Decrease),
		Just(Direction::Any),
	]
}

pub fn log_direction_strategy() -> impl Strategy<Value = LogDirection> {
	prop_oneof![
		Just(LogDirection::From),
		Just(LogDirection::To),
		Just(LogDirection::Either),
	]
}

pub fn interval_unit_strategy() -> impl Strategy<Value = IntervalUnit> {
	prop_oneof![
		Just(IntervalUnit::Seconds),
		Just(IntervalUnit::Minutes),
		Just(IntervalUnit::Hours),
	]
}

/// Calendar rules whose fields are all in range
pub fn calendar_rule_strategy() -> impl Strategy<Value = CalendarRule> {
	(0u32..3, 0u32..24, 0u32..60, 0u32..8, 1u32..32).prop_map(
		|(mode, hour, minute, weekday, day_of_month)| match mode {
			0 => CalendarRule {
				mode: CalendarMode::EveryDay,
				hour,
				minute,
				weekday: None,
				day_of_month: None,
			},
			1 => CalendarRule {
				mode: CalendarMode::EveryWeek,
				hour,
				minute,
				weekday: Some(weekday),
				day_of_month: None,
			},
			_ => CalendarRule {
				mode: CalendarMode::EveryMonth,
				hour,
				minute,
				weekday: None,
				day_of_month: Some(day_of_month),
			},
		},
	)
}
