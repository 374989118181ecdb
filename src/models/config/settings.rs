//! Provider settings shared by every connection the factory builds.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path, time::Duration};

use crate::{models::config::error::ConfigError, utils::RetryConfig};

/// Default location of the optional settings file
pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.json";

fn default_stall_timeout_ms() -> u64 {
	1_000
}

fn default_readiness_timeout_ms() -> u64 {
	10_000
}

fn default_request_timeout_ms() -> u64 {
	30_000
}

fn default_log_poll_interval_ms() -> u64 {
	4_000
}

/// Timeouts and retry policy used when connecting to RPC endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
	/// How long a fallback connection waits on one endpoint before racing the next
	#[serde(default = "default_stall_timeout_ms")]
	pub stall_timeout_ms: u64,

	/// Upper bound for the readiness probe of a new endpoint
	#[serde(default = "default_readiness_timeout_ms")]
	pub readiness_timeout_ms: u64,

	/// Upper bound for a single RPC round-trip
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,

	/// Polling period for log watches on connections without push delivery
	#[serde(default = "default_log_poll_interval_ms")]
	pub log_poll_interval_ms: u64,

	/// Transient error retry policy for HTTP transports
	#[serde(default)]
	pub retry: RetryConfig,
}

impl Default for ProviderSettings {
	fn default() -> Self {
		Self {
			stall_timeout_ms: default_stall_timeout_ms(),
			readiness_timeout_ms: default_readiness_timeout_ms(),
			request_timeout_ms: default_request_timeout_ms(),
			log_poll_interval_ms: default_log_poll_interval_ms(),
			retry: RetryConfig::default(),
		}
	}
}

impl ProviderSettings {
	pub fn stall_timeout(&self) -> Duration {
		Duration::from_millis(self.stall_timeout_ms)
	}

	pub fn readiness_timeout(&self) -> Duration {
		Duration::from_millis(self.readiness_timeout_ms)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}

	pub fn log_poll_interval(&self) -> Duration {
		Duration::from_millis(self.log_poll_interval_ms)
	}

	/// Loads settings from `path` (or the default location).
	///
	/// A missing file yields the defaults; an unreadable or invalid file is an error.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let path = path.unwrap_or(Path::new(DEFAULT_SETTINGS_PATH));
		if !path.exists() {
			return Ok(Self::default());
		}

		let metadata = HashMap::from([("path".to_string(), path.display().to_string())]);
		let content = fs::read_to_string(path).map_err(|e| {
			ConfigError::file_error(
				"failed to read settings file",
				Some(Box::new(e)),
				Some(metadata.clone()),
			)
		})?;
		let settings: Self = serde_json::from_str(&content).map_err(|e| {
			ConfigError::parse_error(
				format!("failed to parse settings: {}", e),
				Some(Box::new(e)),
				Some(metadata.clone()),
			)
		})?;
		settings.validate()?;
		Ok(settings)
	}

	/// Rejects zero timeouts, which would make every endpoint look stalled
	pub fn validate(&self) -> Result<(), ConfigError> {
		let checks = [
			("stall_timeout_ms", self.stall_timeout_ms),
			("readiness_timeout_ms", self.readiness_timeout_ms),
			("request_timeout_ms", self.request_timeout_ms),
			("log_poll_interval_ms", self.log_poll_interval_ms),
		];
		for (name, value) in checks {
			if value == 0 {
				return Err(ConfigError::validation_error(
					format!("{} must be greater than zero", name),
					None,
					None,
				));
			}
		}
		Ok(())
	}
}
