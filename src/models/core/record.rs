use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Normalized payload delivered to the workflow engine when a trigger fires.
///
/// A record is assembled once and cannot be mutated afterwards. It serializes
/// as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ExecutionRecord(Map<String, Value>);

impl ExecutionRecord {
	/// Starts assembling a new record
	pub fn builder() -> ExecutionRecordBuilder {
		ExecutionRecordBuilder::default()
	}

	/// Wraps a JSON value, returning `None` unless it is an object
	pub fn from_value(value: Value) -> Option<Self> {
		match value {
			Value::Object(map) => Some(Self(map)),
			_ => None,
		}
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Convenience accessor for string fields
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(Value::as_str)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}

	pub fn into_value(self) -> Value {
		Value::Object(self.0)
	}
}

/// Builder for [`ExecutionRecord`]
#[derive(Debug, Default)]
pub struct ExecutionRecordBuilder {
	fields: Map<String, Value>,
}

impl ExecutionRecordBuilder {
	pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.fields.insert(key.to_string(), value.into());
		self
	}

	/// Inserts the field only when a value is present
	pub fn optional_field(self, key: &str, value: Option<impl Into<Value>>) -> Self {
		match value {
			Some(value) => self.field(key, value),
			None => self,
		}
	}

	pub fn build(self) -> ExecutionRecord {
		ExecutionRecord(self.fields)
	}
}
