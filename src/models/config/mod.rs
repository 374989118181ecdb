//! Configuration loading and validation.
//!
//! This module provides the loader trait used for trigger definitions and the
//! provider settings shared by every connection.

#![allow(clippy::result_large_err)]

use async_trait::async_trait;
use std::path::Path;

mod error;
mod settings;
mod trigger_config;

pub use error::ConfigError;
pub use settings::ProviderSettings;
pub use trigger_config::TriggerConfigFile;

/// Common interface for loading configuration files
#[async_trait]
pub trait ConfigLoader: Sized {
	/// Load all configuration files from a directory
	///
	/// If no path is provided, uses the default config directory.
	async fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>;

	/// Load configuration from a specific file path
	async fn load_from_path(path: &Path) -> Result<Self, ConfigError>;

	/// Validate the configuration
	fn validate(&self) -> Result<(), ConfigError>;

	/// Warn about insecure transport in caller supplied URLs
	fn validate_protocol(&self);

	/// Check if a file is a JSON file based on extension
	fn is_json_file(path: &Path) -> bool {
		path.extension()
			.map(|ext| ext.to_string_lossy().to_lowercase() == "json")
			.unwrap_or(false)
	}

	/// Resolve all secrets in the configuration
	async fn resolve_secrets(&self) -> Result<Self, ConfigError>;

	/// Validate uniqueness of the configuration
	///
	/// # Arguments
	/// * `instances` - The instances loaded so far
	/// * `current_instance` - The instance being added
	/// * `file_path` - The file containing the current instance (for error metadata)
	fn validate_uniqueness(
		instances: &[&Self],
		current_instance: &Self,
		file_path: &str,
	) -> Result<(), ConfigError>;
}
