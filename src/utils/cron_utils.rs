//! Utility functions for working with cron schedules and time intervals
//!
//! This module provides helper functions for validating cron expressions and
//! simulating when they fire. All expressions use the six-field
//! `sec min hour dom month dow` format and are evaluated in UTC.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

/// Parses a cron expression, returning the parser error message on failure
pub fn validate_cron(expression: &str) -> Result<Schedule, String> {
	if expression.split_whitespace().count() != 6 {
		return Err(format!(
			"expected 6 fields (sec min hour dom month dow), got '{}'",
			expression
		));
	}
	Schedule::from_str(expression).map_err(|e| e.to_string())
}

/// Returns the next `count` fire times of an expression strictly after `after`
///
/// Returns an empty vector when the expression is invalid.
pub fn next_occurrences(expression: &str, after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
	match validate_cron(expression) {
		Ok(schedule) => schedule.after(&after).take(count).collect(),
		Err(_) => Vec::new(),
	}
}

/// Calculates the time interval between two consecutive occurrences of a cron schedule
///
/// # Arguments
///
/// * `cron_schedule` - A string slice containing a valid cron expression (e.g., "0 */5 * * * *")
///
/// # Returns
///
/// * `Some(i64)` - The number of milliseconds between consecutive schedule runs
/// * `None` - If the cron expression is invalid or if two consecutive occurrences cannot be
///   determined
pub fn get_cron_interval_ms(cron_schedule: &str) -> Option<i64> {
	let mut occurrences = next_occurrences(cron_schedule, Utc::now(), 2).into_iter();

	if let (Some(first), Some(second)) = (occurrences.next(), occurrences.next()) {
		Some((second - first).num_milliseconds())
	} else {
		None
	}
}
