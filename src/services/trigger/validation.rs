//! Synchronous checks run before a trigger is started.
//!
//! Everything here is decided from the configuration alone, without contacting
//! an endpoint, so misconfigured triggers are rejected before any resource is
//! built.

use std::collections::HashMap;

use crate::{
	models::{ProviderKind, TriggerConfig, WatchSpec},
	services::{
		catalog,
		comparator::ViewFunctionReader,
		filter::{build_filter, MAX_TOPICS},
		schedule,
		trigger::error::TriggerError,
	},
};

fn metadata(config: &TriggerConfig) -> HashMap<String, String> {
	HashMap::from([
		("trigger_key".to_string(), config.trigger_key.clone()),
		("network".to_string(), config.network.clone()),
		("provider_kind".to_string(), config.provider_kind.to_string()),
	])
}

fn reject(
	msg: impl Into<String>,
	source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
	config: &TriggerConfig,
) -> TriggerError {
	TriggerError::configuration_error_without_log(msg, source, Some(metadata(config)))
}

fn is_blank(value: Option<&str>) -> bool {
	value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// Validates a trigger configuration
///
/// Checks that:
/// - The network is in the catalog and the provider kind serves it
/// - Vendor kinds carry an api key, custom kinds carry their URL
/// - The watch condition can be built (log filter, schedule, view call)
///
/// # Errors
/// Returns `TriggerError::ConfigurationError` describing the first problem found.
pub fn validate_trigger_config(config: &TriggerConfig) -> Result<(), TriggerError> {
	if !catalog::is_known_network(&config.network) {
		return Err(reject(
			format!("Unknown network '{}'", config.network),
			None,
			config,
		));
	}
	if catalog::endpoint_spec(&config.network, config.provider_kind).is_none() {
		return Err(reject(
			format!(
				"Provider '{}' does not serve network '{}'",
				config.provider_kind, config.network
			),
			None,
			config,
		));
	}

	let kind = config.provider_kind;
	if kind.requires_credential()
		&& is_blank(config.credential.as_ref().map(|c| c.api_key.as_str()))
	{
		return Err(reject(
			format!("Provider '{}' requires an api key", kind),
			None,
			config,
		));
	}
	match kind {
		ProviderKind::CustomHttp
			if is_blank(config.custom_http_url.as_ref().map(|u| u.as_str())) =>
		{
			return Err(reject("custom_http requires a custom HTTP URL", None, config));
		}
		ProviderKind::CustomWs
			if is_blank(config.custom_ws_url.as_ref().map(|u| u.as_str())) =>
		{
			return Err(reject(
				"custom_ws requires a custom WebSocket URL",
				None,
				config,
			));
		}
		_ => {}
	}

	match &config.watch {
		WatchSpec::Log(watch) => {
			build_filter(watch.direction, watch.counterparty, watch.contract_address)
				.map_err(|e| reject(format!("Invalid log filter: {}", e), Some(e.into()), config))?;
			if watch.expected_topic_count == 0 || watch.expected_topic_count > MAX_TOPICS {
				return Err(reject(
					format!(
						"expectedTopicCount must be between 1 and {}",
						MAX_TOPICS
					),
					None,
					config,
				));
			}
		}
		WatchSpec::ViewFunction(watch) => {
			ViewFunctionReader::new(watch)
				.map_err(|e| reject(format!("Invalid view call: {}", e), Some(e.into()), config))?;
		}
		WatchSpec::Balance(_) | WatchSpec::Schedule(_) => {}
	}

	if let Some(spec) = config.watch.schedule() {
		schedule::resolve(spec)
			.map_err(|e| reject(format!("Invalid schedule: {}", e), Some(e.into()), config))?;
	}

	Ok(())
}
