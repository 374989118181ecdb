//! Trigger configuration loading and validation.
//!
//! This module implements the ConfigLoader trait for trigger configurations,
//! allowing trigger instances to be loaded from JSON files. Each file holds a
//! map of entry names to configurations; an entry without an explicit
//! `triggerKey` is keyed by its name.

use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

use crate::{
	models::{config::error::ConfigError, ConfigLoader, SecretValue, TriggerConfig},
	services::trigger::validate_trigger_config,
};

const DEFAULT_TRIGGERS_DIR: &str = "config/triggers";

/// File structure for trigger configuration files
#[derive(Debug, Deserialize)]
pub struct TriggerConfigFile {
	/// Map of entry names to their configurations
	#[serde(flatten)]
	pub triggers: HashMap<String, TriggerConfig>,
}

async fn resolve_secret(secret: &SecretValue, what: &str) -> Result<SecretValue, ConfigError> {
	let resolved = secret.resolve().await.map_err(|e| {
		ConfigError::parse_error(
			format!("failed to resolve {}: {}", what, e),
			Some(e as Box<dyn std::error::Error + Send + Sync>),
			None,
		)
	})?;
	Ok(SecretValue::Plain(resolved))
}

#[async_trait]
impl ConfigLoader for TriggerConfig {
	async fn resolve_secrets(&self) -> Result<Self, ConfigError> {
		dotenvy::dotenv().ok();

		let mut config = self.clone();

		if let Some(credential) = config.credential.as_mut() {
			credential.api_key = resolve_secret(&credential.api_key, "provider api key").await?;
			if let Some(secret_key) = credential.secret_key.as_ref() {
				credential.secret_key =
					Some(resolve_secret(secret_key, "provider secret key").await?);
			}
		}
		if let Some(url) = config.custom_http_url.as_ref() {
			config.custom_http_url = Some(resolve_secret(url, "custom HTTP URL").await?);
		}
		if let Some(url) = config.custom_ws_url.as_ref() {
			config.custom_ws_url = Some(resolve_secret(url, "custom WebSocket URL").await?);
		}

		Ok(config)
	}

	/// Load all trigger configurations from a directory
	///
	/// Reads and parses all JSON files in the specified directory (or default
	/// config directory) as trigger configurations.
	async fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>,
	{
		let config_dir = path.unwrap_or(Path::new(DEFAULT_TRIGGERS_DIR));

		if !config_dir.exists() {
			return Err(ConfigError::file_error(
				"triggers directory not found",
				None,
				Some(HashMap::from([(
					"path".to_string(),
					config_dir.display().to_string(),
				)])),
			));
		}

		let entries = fs::read_dir(config_dir).map_err(|e| {
			ConfigError::file_error(
				format!("failed to read triggers directory: {}", e),
				Some(Box::new(e)),
				Some(HashMap::from([(
					"path".to_string(),
					config_dir.display().to_string(),
				)])),
			)
		})?;

		// Sorted so that key collisions are reported deterministically
		let mut file_paths = Vec::new();
		for entry in entries {
			let entry = entry.map_err(|e| {
				ConfigError::file_error(
					format!("failed to read directory entry: {}", e),
					Some(Box::new(e)),
					Some(HashMap::from([(
						"path".to_string(),
						config_dir.display().to_string(),
					)])),
				)
			})?;
			if Self::is_json_file(&entry.path()) {
				file_paths.push(entry.path());
			}
		}
		file_paths.sort();

		let mut trigger_pairs: Vec<(String, TriggerConfig)> = Vec::new();
		for file_path in file_paths {
			let content = fs::read_to_string(&file_path).map_err(|e| {
				ConfigError::file_error(
					format!("failed to read trigger config file: {}", e),
					Some(Box::new(e)),
					Some(HashMap::from([(
						"path".to_string(),
						file_path.display().to_string(),
					)])),
				)
			})?;
			let file_triggers: TriggerConfigFile =
				serde_json::from_str(&content).map_err(|e| {
					ConfigError::parse_error(
						format!("failed to parse trigger config: {}", e),
						Some(Box::new(e)),
						Some(HashMap::from([(
							"path".to_string(),
							file_path.display().to_string(),
						)])),
					)
				})?;

			let mut named: Vec<(String, TriggerConfig)> =
				file_triggers.triggers.into_iter().collect();
			named.sort_by(|a, b| a.0.cmp(&b.0));

			for (name, mut config) in named {
				if config.trigger_key.trim().is_empty() {
					config.trigger_key = name.clone();
				}

				config = config.resolve_secrets().await?;
				if let Err(validation_error) = config.validate() {
					return Err(ConfigError::validation_error(
						format!(
							"Validation failed for trigger '{}': {}",
							name, validation_error
						),
						Some(Box::new(validation_error)),
						Some(HashMap::from([
							("path".to_string(), file_path.display().to_string()),
							("trigger_name".to_string(), name.clone()),
						])),
					));
				}

				let existing: Vec<&TriggerConfig> =
					trigger_pairs.iter().map(|(_, config)| config).collect();
				Self::validate_uniqueness(&existing, &config, &file_path.display().to_string())?;

				trigger_pairs.push((config.trigger_key.clone(), config));
			}
		}
		Ok(T::from_iter(trigger_pairs))
	}

	/// Load a trigger configuration from a specific file
	///
	/// Reads and parses a single JSON file holding one trigger configuration.
	async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		let file = std::fs::File::open(path)
			.map_err(|e| ConfigError::file_error(e.to_string(), None, None))?;
		let mut config: TriggerConfig = serde_json::from_reader(file)
			.map_err(|e| ConfigError::parse_error(e.to_string(), None, None))?;

		if config.trigger_key.trim().is_empty() {
			if let Some(stem) = path.file_stem() {
				config.trigger_key = stem.to_string_lossy().to_string();
			}
		}

		config = config.resolve_secrets().await?;
		config.validate()?;

		Ok(config)
	}

	/// Validate the trigger configuration
	///
	/// Ensures that:
	/// - The trigger key is not empty
	/// - The network and provider kind resolve to an endpoint source
	/// - The watch filter, schedule and view call can be built
	fn validate(&self) -> Result<(), ConfigError> {
		if self.trigger_key.trim().is_empty() {
			return Err(ConfigError::validation_error(
				"Trigger key cannot be empty",
				None,
				None,
			));
		}

		validate_trigger_config(self).map_err(|e| {
			ConfigError::validation_error(
				e.to_string(),
				None,
				Some(HashMap::from([(
					"trigger_key".to_string(),
					self.trigger_key.clone(),
				)])),
			)
		})?;

		self.validate_protocol();

		Ok(())
	}

	/// Validate the safety of the protocols used by custom endpoints
	///
	/// Returns if safe, or logs a warning message if unsafe.
	fn validate_protocol(&self) {
		if let Some(url) = &self.custom_http_url {
			if url.as_str().starts_with("http://") {
				tracing::warn!(
					trigger_key = %self.trigger_key,
					"Custom HTTP endpoint uses an insecure protocol"
				);
			}
		}
		if let Some(url) = &self.custom_ws_url {
			if url.as_str().starts_with("ws://") {
				tracing::warn!(
					trigger_key = %self.trigger_key,
					"Custom WebSocket endpoint uses an insecure protocol"
				);
			}
		}
	}

	fn validate_uniqueness(
		instances: &[&Self],
		current_instance: &Self,
		file_path: &str,
	) -> Result<(), ConfigError> {
		if instances
			.iter()
			.any(|existing| existing.trigger_key == current_instance.trigger_key)
		{
			Err(ConfigError::validation_error(
				format!(
					"Duplicate trigger key found: '{}'",
					current_instance.trigger_key
				),
				None,
				Some(HashMap::from([
					(
						"trigger_key".to_string(),
						current_instance.trigger_key.clone(),
					),
					("path".to_string(), file_path.to_string()),
				])),
			))
		} else {
			Ok(())
		}
	}
}
