//! Cron expression builders.
//!
//! Converts polling intervals and calendar rules into six-field cron
//! expressions (`sec min hour dom month dow`, UTC). Weekdays are emitted by
//! name because numeric day-of-week values differ between cron dialects.

use std::collections::HashMap;

use crate::{
	models::{CalendarMode, CalendarRule, IntervalUnit, ScheduleSpec},
	services::schedule::error::ScheduleError,
	utils::validate_cron,
};

const WEEKDAYS: [&str; 8] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

fn check_range(
	field: &str,
	value: u32,
	min: u32,
	max: u32,
) -> Result<u32, ScheduleError> {
	if (min..=max).contains(&value) {
		Ok(value)
	} else {
		Err(ScheduleError::invalid_range(
			format!("{} must be between {} and {}", field, min, max),
			None,
			Some(HashMap::from([(field.to_string(), value.to_string())])),
		))
	}
}

/// Builds the expression for a fixed polling interval
///
/// # Arguments
/// * `value` - Seconds or minutes in 1-59, hours in 1-23
/// * `unit` - Unit of `value`
pub fn from_poll_interval(value: u32, unit: IntervalUnit) -> Result<Vec<String>, ScheduleError> {
	let expression = match unit {
		IntervalUnit::Seconds => format!("*/{} * * * * *", check_range("seconds", value, 1, 59)?),
		IntervalUnit::Minutes => format!("0 */{} * * * *", check_range("minutes", value, 1, 59)?),
		IntervalUnit::Hours => format!("0 0 */{} * * *", check_range("hours", value, 1, 23)?),
	};
	Ok(vec![expression])
}

/// Builds the expression for one calendar rule
pub fn from_calendar(rule: &CalendarRule) -> Result<Vec<String>, ScheduleError> {
	let hour = check_range("hour", rule.hour, 0, 23)?;
	let minute = check_range("minute", rule.minute, 0, 59)?;

	let expression = match rule.mode {
		CalendarMode::EveryDay => format!("0 {} {} * * *", minute, hour),
		CalendarMode::EveryWeek => {
			let weekday = rule.weekday.ok_or_else(|| {
				ScheduleError::invalid_range("everyWeek requires a weekday", None, None)
			})?;
			let weekday = check_range("weekday", weekday, 0, 7)?;
			format!("0 {} {} * * {}", minute, hour, WEEKDAYS[weekday as usize])
		}
		CalendarMode::EveryMonth => {
			let day = rule.day_of_month.ok_or_else(|| {
				ScheduleError::invalid_range("everyMonth requires a day of month", None, None)
			})?;
			let day = check_range("dayOfMonth", day, 1, 31)?;
			format!("0 {} {} {} * *", minute, hour, day)
		}
	};
	Ok(vec![expression])
}

/// Resolves a schedule into the distinct cron expressions it fires on.
///
/// Calendar rules are unioned; duplicate expressions are removed while
/// keeping the first occurrence.
pub fn resolve(spec: &ScheduleSpec) -> Result<Vec<String>, ScheduleError> {
	let expressions = match spec {
		ScheduleSpec::Cron { expressions } => {
			for expression in expressions {
				validate_cron(expression).map_err(|e| {
					ScheduleError::invalid_expression(
						e,
						None,
						Some(HashMap::from([(
							"expression".to_string(),
							expression.clone(),
						)])),
					)
				})?;
			}
			expressions.iter().map(|e| e.trim().to_string()).collect()
		}
		ScheduleSpec::Interval { value, unit } => from_poll_interval(*value, *unit)?,
		ScheduleSpec::Calendar { rules } => {
			let mut expressions = Vec::new();
			for rule in rules {
				expressions.extend(from_calendar(rule)?);
			}
			expressions
		}
	};

	let mut unique: Vec<String> = Vec::with_capacity(expressions.len());
	for expression in expressions {
		if !unique.contains(&expression) {
			unique.push(expression);
		}
	}

	if unique.is_empty() {
		return Err(ScheduleError::invalid_expression(
			"schedule has no expressions",
			None,
			None,
		));
	}
	Ok(unique)
}
