//! Network transport implementations for blockchain clients.
//!
//! Provides concrete JSON-RPC transports:
//!
//! - HTTP transport over one or more endpoints, raced by the endpoint manager
//! - WebSocket transport with `eth_subscribe` push delivery

mod endpoint_manager;
mod error;
mod http;
mod ws;

pub use endpoint_manager::EndpointManager;
pub use error::TransportError;
pub use http::HttpTransportClient;
pub use ws::WsTransportClient;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest_retry::{
	default_on_request_failure, default_on_request_success, Retryable, RetryableStrategy,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::models::SecretString;

/// A live push subscription opened through a transport
#[derive(Debug)]
pub struct TransportSubscription {
	/// Subscription id assigned by the node
	pub id: String,
	/// Receives the `result` payload of every notification
	pub receiver: mpsc::UnboundedReceiver<Value>,
}

/// Base trait for all blockchain transport clients
#[async_trait::async_trait]
pub trait BlockchainTransport: Send + Sync {
	/// Get the current URL being used by the transport
	async fn get_current_url(&self) -> String;

	/// Send a raw request to the blockchain
	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize;

	/// Customizes the request for specific blockchain requirements
	async fn customize_request<P>(&self, method: &str, params: Option<P>) -> Value
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		// Default implementation for JSON-RPC
		json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params.map(|p| p.into())
		})
	}

	/// Returns true when the transport can deliver `eth_subscribe` notifications
	fn supports_subscriptions(&self) -> bool {
		false
	}

	/// Opens an `eth_subscribe` subscription with the given params
	async fn subscribe(&self, params: Value) -> Result<TransportSubscription, TransportError> {
		let _ = params;
		Err(TransportError::subscription(
			"transport does not support subscriptions",
			None,
			None,
		))
	}

	/// Closes a subscription opened by [`BlockchainTransport::subscribe`]
	async fn unsubscribe(&self, id: &str) -> Result<(), TransportError> {
		let _ = id;
		Ok(())
	}
}

/// Value of the `Authorization` header for a project secret (empty user name)
pub(crate) fn basic_auth_value(secret: &SecretString) -> String {
	format!("Basic {}", STANDARD.encode(format!(":{}", secret.as_str())))
}

/// A default retry strategy that retries on requests based on the status code
/// This can be used to customise the retry strategy
pub struct TransientErrorRetryStrategy;
impl RetryableStrategy for TransientErrorRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(success) => default_on_request_success(success),
			Err(error) => default_on_request_failure(error),
		}
	}
}
