//! Provider factory.
//!
//! Turns a provider kind, a catalog network and the optional credential or
//! custom URL of a trigger into a connected [`ConnectionHandle`]. Every check
//! that can be made without network I/O happens before any endpoint is
//! contacted, so misconfigured triggers fail with a configuration error.

use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use url::Url;

use crate::{
	models::{
		NetworkEndpointSpec, ProviderCredential, ProviderKind, ProviderSettings, SecretString,
		SecretValue, TriggerConfig, WatchSpec,
	},
	services::{
		blockchain::{
			client::ConnectionHandle,
			clients::EvmClient,
			error::BlockChainError,
			transports::{HttpTransportClient, WsTransportClient},
		},
		catalog,
	},
};

/// Which transport a connection should prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportPreference {
	/// Request/response only
	Http,
	/// Use a WebSocket endpoint when the provider offers one
	PreferWebSocket,
}

/// Everything needed to build a connection for one trigger
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionRequest {
	pub kind: ProviderKind,
	pub network: String,
	pub credential: Option<ProviderCredential>,
	pub custom_http_url: Option<SecretValue>,
	pub custom_ws_url: Option<SecretValue>,
	pub transport: TransportPreference,
}

impl ConnectionRequest {
	/// Derives the request from a trigger configuration.
	///
	/// Log watches prefer push delivery; polling watches only need HTTP.
	pub fn from_config(config: &TriggerConfig) -> Self {
		let transport = match config.watch {
			WatchSpec::Log(_) => TransportPreference::PreferWebSocket,
			_ => TransportPreference::Http,
		};

		Self {
			kind: config.provider_kind,
			network: config.network.clone(),
			credential: config.credential.clone(),
			custom_http_url: config.custom_http_url.clone(),
			custom_ws_url: config.custom_ws_url.clone(),
			transport,
		}
	}

	fn metadata(&self) -> HashMap<String, String> {
		HashMap::from([
			("network".to_string(), self.network.clone()),
			("provider_kind".to_string(), self.kind.to_string()),
		])
	}
}

/// Endpoints selected for a request, with secrets already substituted
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedEndpoints {
	/// One or more HTTP endpoints in preference order
	Http {
		urls: Vec<String>,
		auth: Option<SecretString>,
	},
	/// A WebSocket endpoint, with HTTP endpoints to fall back to if it cannot be reached
	WebSocket {
		url: String,
		auth: Option<SecretString>,
		http_fallback: Vec<String>,
	},
}

/// Secrets of a request after resolution
#[derive(Debug, Clone, Default)]
pub struct ResolvedSecrets {
	pub api_key: Option<SecretString>,
	pub secret_key: Option<SecretString>,
	pub custom_http_url: Option<SecretString>,
	pub custom_ws_url: Option<SecretString>,
}

/// Builds connections from connection requests
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
	/// Builds a connected handle for the request
	///
	/// # Errors
	/// `BlockChainError::ConfigurationError` when the request cannot be satisfied,
	/// `BlockChainError::ConnectionError` when no endpoint could be reached.
	async fn connect(&self, request: &ConnectionRequest)
		-> Result<ConnectionHandle, BlockChainError>;

	/// Gives back a handle obtained from [`ConnectionFactory::connect`]
	async fn release(&self, request: &ConnectionRequest) {
		let _ = request;
	}
}

/// Checks a caller supplied URL against the schemes a kind accepts
fn parse_custom_url(
	raw: Option<&SecretString>,
	schemes: &[&str],
	request: &ConnectionRequest,
) -> Result<String, BlockChainError> {
	let raw = raw
		.map(|url| url.as_str().trim())
		.filter(|url| !url.is_empty())
		.ok_or_else(|| {
			BlockChainError::configuration_error(
				format!("{} requires a URL", request.kind),
				None,
				Some(request.metadata()),
			)
		})?;

	let parsed = Url::parse(raw).map_err(|e| {
		BlockChainError::configuration_error(
			"Custom endpoint is not a valid URL",
			Some(Box::new(e)),
			Some(request.metadata()),
		)
	})?;
	if !schemes.contains(&parsed.scheme()) {
		return Err(BlockChainError::configuration_error(
			format!("Custom endpoint must use one of: {}", schemes.join(", ")),
			None,
			Some(request.metadata()),
		));
	}

	Ok(raw.to_string())
}

/// Selects the endpoints a request connects to.
///
/// # Arguments
/// * `spec` - Catalog entry for the requested network and kind
/// * `request` - The connection request
/// * `secrets` - Resolved credential and custom URLs
pub fn select_endpoints(
	spec: &NetworkEndpointSpec,
	request: &ConnectionRequest,
	secrets: &ResolvedSecrets,
) -> Result<ResolvedEndpoints, BlockChainError> {
	match request.kind {
		ProviderKind::Infura | ProviderKind::Alchemy => {
			let api_key = secrets
				.api_key
				.as_ref()
				.map(SecretString::as_str)
				.filter(|key| !key.trim().is_empty())
				.ok_or_else(|| {
					BlockChainError::configuration_error(
						format!("{} requires an api key", request.kind),
						None,
						Some(request.metadata()),
					)
				})?;

			// Only Infura understands the project secret
			let auth = match request.kind {
				ProviderKind::Infura => secrets.secret_key.clone(),
				_ => None,
			};
			let http_urls = spec.rpc_urls_with_key(Some(api_key));
			let ws_url = spec.ws_urls_with_key(Some(api_key)).into_iter().next();

			match (request.transport, ws_url) {
				(TransportPreference::PreferWebSocket, Some(url)) => {
					Ok(ResolvedEndpoints::WebSocket {
						url,
						auth,
						http_fallback: http_urls,
					})
				}
				_ if http_urls.is_empty() => Err(BlockChainError::configuration_error(
					"Provider has no HTTP endpoint for this network",
					None,
					Some(request.metadata()),
				)),
				_ => Ok(ResolvedEndpoints::Http {
					urls: http_urls,
					auth,
				}),
			}
		}
		ProviderKind::Public => {
			if spec.rpc_urls.is_empty() {
				return Err(BlockChainError::configuration_error(
					"No public endpoints configured for network",
					None,
					Some(request.metadata()),
				));
			}
			Ok(ResolvedEndpoints::Http {
				urls: spec.rpc_urls.clone(),
				auth: None,
			})
		}
		ProviderKind::CustomHttp => Ok(ResolvedEndpoints::Http {
			urls: vec![parse_custom_url(
				secrets.custom_http_url.as_ref(),
				&["http", "https"],
				request,
			)?],
			auth: None,
		}),
		ProviderKind::CustomWs => Ok(ResolvedEndpoints::WebSocket {
			url: parse_custom_url(secrets.custom_ws_url.as_ref(), &["ws", "wss"], request)?,
			auth: None,
			http_fallback: Vec::new(),
		}),
	}
}

async fn resolve_optional(
	value: Option<&SecretValue>,
	what: &str,
	request: &ConnectionRequest,
) -> Result<Option<SecretString>, BlockChainError> {
	match value {
		Some(value) => value.resolve().await.map(Some).map_err(|e| {
			BlockChainError::configuration_error(
				format!("Failed to resolve {}", what),
				Some(e as Box<dyn std::error::Error + Send + Sync>),
				Some(request.metadata()),
			)
		}),
		None => Ok(None),
	}
}

/// Default factory connecting directly to the selected endpoints
#[derive(Debug, Clone, Default)]
pub struct ProviderFactory {
	settings: ProviderSettings,
}

impl ProviderFactory {
	pub fn new(settings: ProviderSettings) -> Self {
		Self { settings }
	}

	pub fn settings(&self) -> &ProviderSettings {
		&self.settings
	}

	/// Looks up the catalog entry and resolves the secrets of a request
	pub async fn resolve(
		&self,
		request: &ConnectionRequest,
	) -> Result<ResolvedEndpoints, BlockChainError> {
		let spec = catalog::endpoint_spec(&request.network, request.kind).ok_or_else(|| {
			BlockChainError::configuration_error(
				"Unknown network for provider",
				None,
				Some(request.metadata()),
			)
		})?;

		let credential = request.credential.as_ref();
		let secrets = ResolvedSecrets {
			api_key: resolve_optional(credential.map(|c| &c.api_key), "api key", request).await?,
			secret_key: resolve_optional(
				credential.and_then(|c| c.secret_key.as_ref()),
				"secret key",
				request,
			)
			.await?,
			custom_http_url: resolve_optional(
				request.custom_http_url.as_ref(),
				"custom HTTP URL",
				request,
			)
			.await?,
			custom_ws_url: resolve_optional(
				request.custom_ws_url.as_ref(),
				"custom WebSocket URL",
				request,
			)
			.await?,
		};

		select_endpoints(&spec, request, &secrets)
	}

	async fn connect_http(
		&self,
		urls: &[String],
		auth: Option<&SecretString>,
		request: &ConnectionRequest,
	) -> Result<ConnectionHandle, BlockChainError> {
		let transport = HttpTransportClient::new(urls, auth, &self.settings)
			.await
			.map_err(|e| {
				BlockChainError::connection_error(
					"Failed to connect to HTTP endpoints",
					Some(e.into()),
					Some(request.metadata()),
				)
			})?;

		Ok(Arc::new(EvmClient::new_with_transport(
			transport,
			self.settings.log_poll_interval(),
		)))
	}
}

#[async_trait]
impl ConnectionFactory for ProviderFactory {
	async fn connect(
		&self,
		request: &ConnectionRequest,
	) -> Result<ConnectionHandle, BlockChainError> {
		match self.resolve(request).await? {
			ResolvedEndpoints::Http { urls, auth } => {
				self.connect_http(&urls, auth.as_ref(), request).await
			}
			ResolvedEndpoints::WebSocket {
				url,
				auth,
				http_fallback,
			} => match WsTransportClient::connect(&url, auth.as_ref(), &self.settings).await {
				Ok(transport) => Ok(Arc::new(EvmClient::new_with_transport(
					transport,
					self.settings.log_poll_interval(),
				))),
				Err(e) if !http_fallback.is_empty() => {
					tracing::warn!(
						network = %request.network,
						provider_kind = %request.kind,
						"WebSocket endpoint unavailable, falling back to HTTP: {:#}",
						e
					);
					self.connect_http(&http_fallback, auth.as_ref(), request)
						.await
				}
				Err(e) => Err(BlockChainError::connection_error(
					"Failed to connect to WebSocket endpoint",
					Some(e.into()),
					Some(request.metadata()),
				)),
			},
		}
	}
}
