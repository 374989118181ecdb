//! Emission contract with the workflow engine.
//!
//! The engine registers one handler per trigger key with `on`; the registry
//! delivers execution records with `emit` and removes the handler with `off`
//! when the trigger stops. Handlers run synchronously on the emitting task and
//! must not block.

use std::{
	collections::HashMap,
	sync::{Arc, RwLock},
};

use crate::models::ExecutionRecord;

/// Callback receiving the records emitted for one trigger key
pub type EmissionHandler = Arc<dyn Fn(ExecutionRecord) + Send + Sync>;

/// Narrow interface through which triggers wake workflows
pub trait EmissionSink: Send + Sync {
	/// Registers the handler for a key, replacing any previous one
	fn on(&self, key: &str, handler: EmissionHandler);

	/// Removes the handler for a key. Unknown keys are ignored.
	fn off(&self, key: &str);

	/// Delivers a record. Returns false when no handler is registered for the key.
	fn emit(&self, key: &str, record: ExecutionRecord) -> bool;
}

/// In-process [`EmissionSink`] keeping one handler per key
#[derive(Default)]
pub struct ListenerBus {
	handlers: RwLock<HashMap<String, EmissionHandler>>,
}

impl ListenerBus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true when a handler is registered for the key
	pub fn has_listener(&self, key: &str) -> bool {
		self.handlers
			.read()
			.map(|handlers| handlers.contains_key(key))
			.unwrap_or(false)
	}
}

impl EmissionSink for ListenerBus {
	fn on(&self, key: &str, handler: EmissionHandler) {
		let mut handlers = self
			.handlers
			.write()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		handlers.insert(key.to_string(), handler);
	}

	fn off(&self, key: &str) {
		let mut handlers = self
			.handlers
			.write()
			.unwrap_or_else(|poisoned| poisoned.into_inner());
		handlers.remove(key);
	}

	fn emit(&self, key: &str, record: ExecutionRecord) -> bool {
		// Clone the handler so it runs without holding the lock
		let handler = match self.handlers.read() {
			Ok(handlers) => handlers.get(key).cloned(),
			Err(poisoned) => poisoned.into_inner().get(key).cloned(),
		};

		match handler {
			Some(handler) => {
				handler(record);
				true
			}
			None => {
				tracing::debug!(trigger_key = %key, "No listener registered, dropping record");
				false
			}
		}
	}
}
