//! HTTP transport implementation for blockchain interactions.
//!
//! This module provides a generic HTTP client implementation for interacting with blockchain nodes
//! via JSON-RPC, supporting:
//! - Multiple RPC endpoints raced with a per-endpoint stall timeout
//! - Configurable retry policies for transient errors
//! - HTTP basic authentication with a project secret
//! - Concurrent readiness probes when the connection is built

use anyhow::Context;
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use crate::{
	models::{ProviderSettings, SecretString},
	services::blockchain::transports::{
		basic_auth_value, BlockchainTransport, EndpointManager, TransientErrorRetryStrategy,
		TransportError,
	},
	utils::http::create_retryable_http_client,
};

/// Basic HTTP transport client for blockchain interactions
///
/// This client provides a foundation for making JSON-RPC requests to blockchain nodes
/// with built-in support for:
/// - Connection pooling and reuse
/// - Racing fallback endpoints when the active one stalls
/// - Configurable retry policies
///
/// The client is thread-safe and can be shared across multiple tasks.
#[derive(Clone, Debug)]
pub struct HttpTransportClient {
	/// Retryable HTTP client for making requests
	pub client: ClientWithMiddleware,
	/// Manages RPC endpoint order and request racing
	endpoint_manager: EndpointManager,
}

fn basic_auth_header(secret: &SecretString) -> Result<HeaderValue, anyhow::Error> {
	let mut value = HeaderValue::from_str(&basic_auth_value(secret))
		.context("Failed to build authorization header")?;
	value.set_sensitive(true);
	Ok(value)
}

/// Sends `net_version` to an endpoint and reports whether it answered
async fn probe(client: &ClientWithMiddleware, url: &Url, timeout: Duration) -> bool {
	let request = client.post(url.clone()).json(&json!({
		"jsonrpc": "2.0",
		"id": 1,
		"method": "net_version",
		"params": []
	}));

	match tokio::time::timeout(timeout, request.send()).await {
		Ok(Ok(response)) => response.status().is_success(),
		Ok(Err(e)) => {
			tracing::debug!(url = %url, "readiness probe failed: {}", e);
			false
		}
		Err(_) => {
			tracing::debug!(url = %url, "readiness probe timed out");
			false
		}
	}
}

impl HttpTransportClient {
	/// Creates a new HTTP transport client over the given endpoints
	///
	/// Every endpoint is probed concurrently with `net_version`. Endpoints that do
	/// not answer within the readiness timeout are left out; the remaining ones keep
	/// their given order.
	///
	/// # Arguments
	/// * `urls` - Endpoints in preference order
	/// * `auth` - Optional project secret sent as HTTP basic auth
	/// * `settings` - Timeouts and retry policy
	///
	/// # Returns
	/// * `Result<Self, anyhow::Error>` - New client instance or connection error
	pub async fn new(
		urls: &[String],
		auth: Option<&SecretString>,
		settings: &ProviderSettings,
	) -> Result<Self, anyhow::Error> {
		let mut headers = HeaderMap::new();
		if let Some(secret) = auth {
			headers.insert(AUTHORIZATION, basic_auth_header(secret)?);
		}

		let base_http_client = reqwest::ClientBuilder::new()
			.default_headers(headers)
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(32)
			.timeout(settings.request_timeout())
			.connect_timeout(Duration::from_secs(20))
			.build()
			.context("Failed to create base HTTP client")?;

		let retryable_client = create_retryable_http_client(
			&settings.retry,
			base_http_client,
			Some(TransientErrorRetryStrategy),
		);

		let parsed: Vec<Url> = urls
			.iter()
			.filter_map(|url| match Url::parse(url) {
				Ok(parsed) => Some(parsed),
				Err(e) => {
					tracing::warn!("Skipping invalid RPC URL: {}", e);
					None
				}
			})
			.collect();

		let readiness = join_all(
			parsed
				.iter()
				.map(|url| probe(&retryable_client, url, settings.readiness_timeout())),
		)
		.await;

		let ready_urls: Vec<String> = parsed
			.iter()
			.zip(readiness)
			.filter(|(_, ready)| *ready)
			.map(|(url, _)| url.as_str().to_string())
			.collect();

		if ready_urls.is_empty() {
			return Err(anyhow::anyhow!("All RPC URLs failed to connect"));
		}

		tracing::debug!(
			ready = ready_urls.len(),
			configured = urls.len(),
			"HTTP transport ready"
		);

		Ok(Self {
			client: retryable_client.clone(),
			endpoint_manager: EndpointManager::new(
				retryable_client,
				ready_urls,
				settings.stall_timeout(),
			),
		})
	}

	/// Endpoints in their current preference order
	pub async fn endpoints(&self) -> Vec<String> {
		self.endpoint_manager.urls.read().await.clone()
	}
}

#[async_trait]
impl BlockchainTransport for HttpTransportClient {
	/// Retrieves the endpoint requests currently start on
	async fn get_current_url(&self) -> String {
		self.endpoint_manager.active_url().await
	}

	/// Sends a JSON-RPC request to the blockchain node
	///
	/// # Arguments
	/// * `method` - The JSON-RPC method name to call
	/// * `params` - Optional parameters for the method call
	///
	/// # Returns
	/// * `Result<Value, TransportError>` - JSON response or error with context
	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		self.endpoint_manager
			.send_raw_request(self, method, params)
			.await
	}
}
