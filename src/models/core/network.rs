use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder substituted with the provider api key in catalog URL templates
pub const API_KEY_PLACEHOLDER: &str = "{apiKey}";

/// Kind of RPC provider a trigger connects through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
	/// Vendor-hosted endpoint authenticated by api key (and optional secret)
	Infura,
	/// Vendor-hosted endpoint authenticated by api key
	Alchemy,
	/// Keyless public endpoints combined into a fallback connection
	Public,
	/// Caller supplied HTTP endpoint
	CustomHttp,
	/// Caller supplied WebSocket endpoint
	CustomWs,
}

impl ProviderKind {
	/// Returns true when the kind is backed by a vendor that requires an api key
	pub fn requires_credential(&self) -> bool {
		matches!(self, Self::Infura | Self::Alchemy)
	}

	/// Returns true when the endpoint is supplied by the caller instead of the catalog
	pub fn is_custom(&self) -> bool {
		matches!(self, Self::CustomHttp | Self::CustomWs)
	}
}

impl fmt::Display for ProviderKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Infura => "infura",
			Self::Alchemy => "alchemy",
			Self::Public => "public",
			Self::CustomHttp => "custom_http",
			Self::CustomWs => "custom_ws",
		};
		write!(f, "{}", name)
	}
}

/// Connection details for one network reachable through one provider kind.
///
/// Values come from the static endpoint catalog and are never mutated. URL
/// templates may contain [`API_KEY_PLACEHOLDER`], which is substituted when the
/// provider factory builds a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkEndpointSpec {
	/// Catalog identifier of the network (e.g. "mainnet", "sepolia")
	pub network: String,

	/// Provider kind the URLs belong to
	pub kind: ProviderKind,

	/// EVM chain id
	pub chain_id: u64,

	/// HTTP JSON-RPC endpoints, in preference order
	pub rpc_urls: Vec<String>,

	/// WebSocket JSON-RPC endpoints, in preference order
	pub ws_urls: Vec<String>,

	/// Block explorer base URL without trailing slash
	pub explorer_url: String,

	/// Native currency symbol
	pub currency: String,

	/// NFT marketplace asset base URL, when the network has one
	pub marketplace_url: Option<String>,
}

impl NetworkEndpointSpec {
	/// Returns the HTTP URLs with the api key substituted
	pub fn rpc_urls_with_key(&self, api_key: Option<&str>) -> Vec<String> {
		self.rpc_urls
			.iter()
			.map(|url| substitute_api_key(url, api_key))
			.collect()
	}

	/// Returns the WebSocket URLs with the api key substituted
	pub fn ws_urls_with_key(&self, api_key: Option<&str>) -> Vec<String> {
		self.ws_urls
			.iter()
			.map(|url| substitute_api_key(url, api_key))
			.collect()
	}

	/// Explorer link for a transaction hash
	pub fn transaction_link(&self, tx_hash: &str) -> String {
		format!("{}/tx/{}", self.explorer_url, tx_hash)
	}

	/// Marketplace link for a token, if the network has a marketplace explorer
	pub fn marketplace_link(&self, contract: &str, token_id: &str) -> Option<String> {
		self.marketplace_url
			.as_ref()
			.map(|base| format!("{}/{}/{}", base, contract, token_id))
	}
}

fn substitute_api_key(template: &str, api_key: Option<&str>) -> String {
	match api_key {
		Some(key) => template.replace(API_KEY_PLACEHOLDER, key),
		None => template.to_string(),
	}
}
