//! Bootstrap module for loading trigger configurations and starting them.
//!
//! This module wires the provider factory, the connection pool, the job
//! scheduler and the emission sink into a [`TriggerRegistry`], and provides
//! the helpers the binary uses to start, check and describe triggers.
//!
//! # Helpers
//! - `initialize_services`: Loads trigger configurations and provider settings
//! - `create_registry`: Builds the registry backed by pooled connections
//! - `register_log_listeners`: Attaches a listener logging every record
//! - `start_triggers`: Starts every loaded trigger, continuing past failures
//! - `check_triggers`: Validates every loaded trigger without starting it

use std::{collections::HashMap, error::Error, path::Path, sync::Arc};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
	models::{ExecutionRecord, ProviderSettings, TriggerConfig},
	repositories::{TriggerRepositoryTrait, TriggerService},
	services::{
		blockchain::{ConnectionFactory, ConnectionPool, ProviderFactory},
		emitter::{EmissionHandler, EmissionSink, ListenerBus},
		schedule::{self, JobSchedulerTrait},
		trigger::{validate_trigger_config, StartOutcome, TriggerError, TriggerRegistry},
	},
	utils::{get_cron_interval_ms, next_occurrences},
};

/// Type alias for handling ServiceResult
pub type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Registry used by the binary
pub type Registry<J> = TriggerRegistry<ConnectionPool<ProviderFactory>, J, ListenerBus>;

/// Loads the trigger configurations and the provider settings.
///
/// # Arguments
/// * `trigger_service` - Optional pre-built service, loaded from `triggers_path` when `None`
/// * `triggers_path` - Directory of trigger files, the default directory when `None`
/// * `settings_path` - Provider settings file, the default location when `None`
///
/// # Errors
/// Returns an error if the trigger files or the settings file cannot be loaded
pub async fn initialize_services<T>(
	trigger_service: Option<TriggerService<T>>,
	triggers_path: Option<&Path>,
	settings_path: Option<&Path>,
) -> Result<(TriggerService<T>, ProviderSettings)>
where
	T: TriggerRepositoryTrait + Send + Sync + 'static,
{
	let trigger_service = match trigger_service {
		Some(service) => service,
		None => {
			let repository = T::new(triggers_path).await?;
			TriggerService::<T>::new_with_repository(repository)
		}
	};

	let settings = ProviderSettings::load(settings_path)?;

	Ok((trigger_service, settings))
}

/// Builds a registry over a pooled [`ProviderFactory`] and starts its scheduler
pub async fn create_registry<J: JobSchedulerTrait>(
	settings: ProviderSettings,
	sink: Arc<ListenerBus>,
) -> std::result::Result<Registry<J>, TriggerError> {
	let scheduler = J::new().await.map_err(|e| {
		TriggerError::scheduler_error("Failed to create scheduler", Some(e), None)
	})?;
	TriggerRegistry::new(
		ConnectionPool::new(ProviderFactory::new(settings)),
		scheduler,
		sink,
	)
	.await
}

/// Handler writing each record to the log as one JSON line
pub fn create_log_handler(key: &str) -> EmissionHandler {
	let key = key.to_string();
	Arc::new(move |record: ExecutionRecord| {
		match serde_json::to_string(&record) {
			Ok(json) => info!(trigger_key = %key, record = %json, "Trigger fired"),
			Err(e) => error!(trigger_key = %key, "Failed to serialize record: {}", e),
		}
	})
}

/// Registers [`create_log_handler`] for every key
pub fn register_log_listeners<'a>(sink: &ListenerBus, keys: impl IntoIterator<Item = &'a String>) {
	for key in keys {
		sink.on(key, create_log_handler(key));
	}
}

/// Counts of a [`start_triggers`] run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StartSummary {
	pub started: usize,
	pub failed: usize,
}

/// Starts every trigger in key order. A failing trigger is logged and skipped.
pub async fn start_triggers<F, J, S>(
	registry: &TriggerRegistry<F, J, S>,
	triggers: &HashMap<String, TriggerConfig>,
) -> StartSummary
where
	F: ConnectionFactory,
	J: JobSchedulerTrait,
	S: EmissionSink + 'static,
{
	let mut keys: Vec<&String> = triggers.keys().collect();
	keys.sort();

	let mut summary = StartSummary::default();
	for key in keys {
		match registry.start(key, triggers[key].clone()).await {
			Ok(StartOutcome::Started) | Ok(StartOutcome::JobsAppended) => summary.started += 1,
			Ok(StartOutcome::AlreadyRunning) => {
				warn!(trigger_key = %key, "Trigger was already running");
			}
			Err(e) => {
				error!(trigger_key = %key, "Failed to start trigger: {}", e);
				summary.failed += 1;
			}
		}
	}
	summary
}

/// Validates every trigger, returning the failures keyed by trigger key
pub fn check_triggers(
	triggers: &HashMap<String, TriggerConfig>,
) -> Vec<(String, TriggerError)> {
	let mut failures: Vec<(String, TriggerError)> = triggers
		.iter()
		.filter_map(|(key, config)| {
			validate_trigger_config(config)
				.err()
				.map(|e| (key.clone(), e))
		})
		.collect();
	failures.sort_by(|a, b| a.0.cmp(&b.0));
	failures
}

/// One line description of when a trigger runs, `None` for log watches
pub fn describe_schedule(config: &TriggerConfig) -> Option<String> {
	let spec = config.watch.schedule()?;
	let expressions = match schedule::resolve(spec) {
		Ok(expressions) => expressions,
		Err(e) => return Some(format!("invalid schedule: {}", e)),
	};

	let now = Utc::now();
	let mut next: Vec<_> = expressions
		.iter()
		.flat_map(|expression| next_occurrences(expression, now, 1))
		.collect();
	next.sort();

	let interval = match expressions.as_slice() {
		[single] => get_cron_interval_ms(single).map(|ms| format!(", every {}s", ms / 1000)),
		_ => None,
	};

	Some(format!(
		"{} ({} job(s){}), next run {}",
		expressions.join(" | "),
		expressions.len(),
		interval.unwrap_or_default(),
		next.first()
			.map(|at| at.to_rfc3339())
			.unwrap_or_else(|| "never".to_string())
	))
}
