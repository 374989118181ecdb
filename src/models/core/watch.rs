//! Watch definitions describing the condition a trigger waits for.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which way a polled value must move for a trigger to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
	/// Fire when the value strictly increases
	#[default]
	Increase,
	/// Fire when the value strictly decreases
	Decrease,
	/// Fire on any change, including non-numeric results
	Any,
}

/// Which indexed topic slot carries the counterparty of a log watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogDirection {
	/// Counterparty is the sender (topic slot 1)
	From,
	/// Counterparty is the recipient (topic slot 2)
	To,
	/// Counterparty is either sender or recipient
	Either,
}

/// Unit of a discrete polling interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
	Seconds,
	Minutes,
	Hours,
}

/// Recurrence mode of a calendar rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CalendarMode {
	EveryDay,
	EveryWeek,
	EveryMonth,
}

/// A single calendar rule. All times are UTC.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRule {
	pub mode: CalendarMode,
	pub hour: u32,
	pub minute: u32,
	/// Day of week, 0 and 7 are Sunday. Required by `everyWeek`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub weekday: Option<u32>,
	/// Day of month (1-31). Required by `everyMonth`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub day_of_month: Option<u32>,
}

/// How often a polling or schedule watch ticks.
///
/// Every variant resolves to one or more six-field cron expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ScheduleSpec {
	/// Raw cron expressions (`sec min hour dom month dow`)
	Cron { expressions: Vec<String> },
	/// Fixed polling interval
	Interval { value: u32, unit: IntervalUnit },
	/// Union of calendar rules
	Calendar { rules: Vec<CalendarRule> },
}

impl Default for ScheduleSpec {
	fn default() -> Self {
		Self::Interval {
			value: 1,
			unit: IntervalUnit::Minutes,
		}
	}
}

/// Log watch: fires for every emitted log matching the filter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogWatch {
	/// Restricts matching to logs emitted by this contract
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub contract_address: Option<Address>,
	/// Event signature hash pinned to topic slot 0
	pub topic0: B256,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub direction: Option<LogDirection>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub counterparty: Option<Address>,
	/// Number of topics a log must carry to be normalized
	pub expected_topic_count: usize,
}

/// Native balance watch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceWatch {
	pub address: Address,
	#[serde(default)]
	pub direction: Direction,
	#[serde(default)]
	pub schedule: ScheduleSpec,
}

/// Contract view function watch
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewFunctionWatch {
	pub contract_address: Address,
	/// Either a full JSON ABI array or a single function fragment
	pub abi_fragment: Value,
	pub function_name: String,
	#[serde(default)]
	pub args: Vec<Value>,
	#[serde(default)]
	pub direction: Direction,
	#[serde(default)]
	pub schedule: ScheduleSpec,
}

/// Time schedule watch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWatch {
	pub schedule: ScheduleSpec,
}

/// The condition a trigger waits for
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatchSpec {
	Log(LogWatch),
	Balance(BalanceWatch),
	ViewFunction(ViewFunctionWatch),
	Schedule(ScheduleWatch),
}

impl WatchSpec {
	/// Short name of the watch kind, used for logging and metric labels
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Log(_) => "log",
			Self::Balance(_) => "balance",
			Self::ViewFunction(_) => "view_function",
			Self::Schedule(_) => "schedule",
		}
	}

	/// Returns true when the watch needs an RPC connection
	pub fn needs_connection(&self) -> bool {
		!matches!(self, Self::Schedule(_))
	}

	/// Returns the polling schedule for watches driven by cron jobs
	pub fn schedule(&self) -> Option<&ScheduleSpec> {
		match self {
			Self::Log(_) => None,
			Self::Balance(watch) => Some(&watch.schedule),
			Self::ViewFunction(watch) => Some(&watch.schedule),
			Self::Schedule(watch) => Some(&watch.schedule),
		}
	}
}
