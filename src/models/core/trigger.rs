use serde::{Deserialize, Serialize};

use crate::models::{ProviderKind, SecretValue, WatchSpec};

/// Credential for a vendor-hosted provider.
///
/// Injected already resolved by the workflow engine. Both values are held as
/// secrets and are never written to logs.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProviderCredential {
	/// Project or api key substituted into the endpoint URL
	pub api_key: SecretValue,

	/// Optional project secret, sent as HTTP basic auth (Infura)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secret_key: Option<SecretValue>,
}

/// Fully resolved configuration for one running trigger instance.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TriggerConfig {
	/// Opaque key under which emissions are delivered.
	///
	/// When loaded from a config file an empty key defaults to the entry name.
	#[serde(default)]
	pub trigger_key: String,

	/// Catalog network identifier
	pub network: String,

	pub provider_kind: ProviderKind,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub credential: Option<ProviderCredential>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub custom_http_url: Option<SecretValue>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub custom_ws_url: Option<SecretValue>,

	pub watch: WatchSpec,
}
