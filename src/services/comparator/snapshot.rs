//! Snapshot comparison for polling watches.
//!
//! A [`Snapshot`] remembers the last value read by a polling job. The first
//! read only establishes the baseline. Every later read that differs from the
//! baseline replaces it, and fires when the change matches the configured
//! [`Direction`]. Numeric comparisons use full 256-bit precision.

use alloy::primitives::{I256, U256};
use serde_json::{json, Value};
use std::cmp::Ordering;

use crate::models::Direction;

/// A value that can be tracked by a [`Snapshot`]
pub trait Observation: Clone + PartialEq + Send + Sync + 'static {
	/// Numeric ordering against another observation; `None` when not comparable
	fn compare(&self, other: &Self) -> Option<Ordering>;

	/// Signed decimal difference `self - previous`, when numeric
	fn delta_from(&self, previous: &Self) -> Option<String>;

	/// JSON representation used in execution records
	fn to_json(&self) -> Value;
}

impl Observation for U256 {
	fn compare(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}

	fn delta_from(&self, previous: &Self) -> Option<String> {
		Some(if self >= previous {
			(*self - *previous).to_string()
		} else {
			format!("-{}", *previous - *self)
		})
	}

	fn to_json(&self) -> Value {
		json!(self.to_string())
	}
}

impl Observation for I256 {
	fn compare(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}

	fn delta_from(&self, previous: &Self) -> Option<String> {
		// The magnitude of any difference of two I256 values fits in a U256
		Some(match self.cmp(previous) {
			Ordering::Less => format!("-{}", previous.into_raw().wrapping_sub(self.into_raw())),
			_ => self.into_raw().wrapping_sub(previous.into_raw()).to_string(),
		})
	}

	fn to_json(&self) -> Value {
		json!(self.to_string())
	}
}

/// Value read from a contract view function
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotValue {
	/// Single unsigned integer output
	Unsigned(U256),
	/// Single signed integer output
	Signed(I256),
	/// Any other output, compared by its canonical JSON form
	Structured(Value),
}

impl Observation for SnapshotValue {
	fn compare(&self, other: &Self) -> Option<Ordering> {
		match (self, other) {
			(Self::Unsigned(a), Self::Unsigned(b)) => Some(a.cmp(b)),
			(Self::Signed(a), Self::Signed(b)) => Some(a.cmp(b)),
			_ => None,
		}
	}

	fn delta_from(&self, previous: &Self) -> Option<String> {
		match (self, previous) {
			(Self::Unsigned(a), Self::Unsigned(b)) => a.delta_from(b),
			(Self::Signed(a), Self::Signed(b)) => a.delta_from(b),
			_ => None,
		}
	}

	fn to_json(&self) -> Value {
		match self {
			Self::Unsigned(value) => value.to_json(),
			Self::Signed(value) => value.to_json(),
			Self::Structured(value) => value.clone(),
		}
	}
}

/// A change that satisfied the watch direction
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<V> {
	pub previous: V,
	pub current: V,
	/// `current - previous` as a signed decimal string, for numeric values
	pub delta: Option<String>,
}

/// Last known value of a polling watch
#[derive(Debug, Clone, Default)]
pub struct Snapshot<V> {
	last: Option<V>,
}

impl<V: Observation> Snapshot<V> {
	pub fn new() -> Self {
		Self { last: None }
	}

	/// The current baseline, if one was established
	pub fn baseline(&self) -> Option<&V> {
		self.last.as_ref()
	}

	/// Records a successful read and decides whether it fires.
	///
	/// The first read only sets the baseline. Reads equal to the baseline never
	/// fire. Any unequal read becomes the new baseline, whether it fires or not.
	pub fn observe(&mut self, value: V, direction: Direction) -> Option<Fired<V>> {
		let previous = match self.last.take() {
			None => {
				self.last = Some(value);
				return None;
			}
			Some(previous) if previous == value => {
				self.last = Some(previous);
				return None;
			}
			Some(previous) => previous,
		};
		self.last = Some(value.clone());

		let fires = match direction {
			Direction::Any => true,
			Direction::Increase => value.compare(&previous) == Some(Ordering::Greater),
			Direction::Decrease => value.compare(&previous) == Some(Ordering::Less),
		};
		if !fires {
			return None;
		}

		Some(Fired {
			delta: value.delta_from(&previous),
			previous,
			current: value,
		})
	}

	/// Applies the outcome of one tick.
	///
	/// A failed read leaves the baseline untouched and is handed back to the caller.
	pub fn evaluate<E>(
		&mut self,
		read: Result<V, E>,
		direction: Direction,
	) -> Result<Option<Fired<V>>, E> {
		read.map(|value| self.observe(value, direction))
	}
}
