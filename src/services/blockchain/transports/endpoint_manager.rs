//! Races blockchain RPC endpoints with a per-endpoint stall timeout.
//!
//! A request starts on the preferred endpoint. Every time the stall timeout
//! elapses without an answer, the next endpoint is started in parallel with the
//! ones already in flight; a failed endpoint hands over to the next one at once.
//! The first endpoint to answer wins and is promoted to the front of the order,
//! so later requests start on it.

use futures::{stream::FuturesUnordered, StreamExt};
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;

use crate::services::blockchain::transports::{BlockchainTransport, TransportError};

/// Manages the ordered endpoint list of a fallback connection
///
/// # Fields
/// * `urls` - Endpoints in preference order; the first one is the active URL
/// * `client` - The client used for every endpoint
/// * `stall_timeout` - How long to wait on in-flight endpoints before racing the next
#[derive(Clone, Debug)]
pub struct EndpointManager {
	pub urls: Arc<RwLock<Vec<String>>>,
	client: ClientWithMiddleware,
	stall_timeout: Duration,
}

impl EndpointManager {
	/// Creates a new endpoint manager
	///
	/// # Arguments
	/// * `client` - The client to use for every endpoint
	/// * `urls` - Endpoints in preference order
	/// * `stall_timeout` - Per-endpoint stall timeout
	pub fn new(client: ClientWithMiddleware, urls: Vec<String>, stall_timeout: Duration) -> Self {
		Self {
			urls: Arc::new(RwLock::new(urls)),
			client,
			stall_timeout,
		}
	}

	/// Returns the endpoint requests currently start on
	pub async fn active_url(&self) -> String {
		self.urls.read().await.first().cloned().unwrap_or_default()
	}

	/// Moves `url` to the front of the endpoint order
	async fn promote(&self, url: &str) {
		let mut urls = self.urls.write().await;
		if let Some(position) = urls.iter().position(|candidate| candidate == url) {
			if position > 0 {
				let winner = urls.remove(position);
				urls.insert(0, winner);
				tracing::debug!(url = %url, "promoted endpoint to the front");
			}
		}
	}

	/// Sends a serialized request body to one endpoint
	///
	/// Any HTTP answer with a success status counts as an answer, including a
	/// JSON-RPC error object.
	async fn try_request_on_url(
		&self,
		url: String,
		body: String,
	) -> (String, Result<Value, TransportError>) {
		let metadata = HashMap::from([("url".to_string(), url.clone())]);

		let response_result = self
			.client
			.post(url.as_str())
			.header("Content-Type", "application/json")
			.body(body)
			.send()
			.await;

		let result = match response_result {
			Ok(response) => {
				let status = response.status();
				if status.is_success() {
					response.json::<Value>().await.map_err(|e| {
						TransportError::response_parse(
							"Failed to parse JSON response",
							Some(Box::new(e)),
							Some(metadata),
						)
					})
				} else {
					let error_body = response.text().await.unwrap_or_default();
					Err(TransportError::http(
						status,
						url.clone(),
						error_body,
						None,
						None,
					))
				}
			}
			Err(network_error) => Err(TransportError::network(
				network_error.to_string(),
				Some(Box::new(network_error)),
				Some(metadata),
			)),
		};

		(url, result)
	}

	/// Sends a raw request, racing endpoints until one answers
	///
	/// # Arguments
	/// * `transport` - The transport that shapes the request body
	/// * `method` - The RPC method name to call
	/// * `params` - The parameters for the RPC method call
	///
	/// # Returns
	/// * `Result<Value, TransportError>` - The first answer, or the last error once
	///   every endpoint has failed
	pub async fn send_raw_request<T, P>(
		&self,
		transport: &T,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		T: BlockchainTransport,
		P: Into<Value> + Send + Clone + Serialize,
	{
		let request_body = transport.customize_request(method, params).await;
		let body = serde_json::to_string(&request_body).map_err(|e| {
			TransportError::request_serialization(
				"Failed to serialize request JSON",
				Some(Box::new(e)),
				None,
			)
		})?;

		let urls = self.urls.read().await.clone();
		let Some(preferred) = urls.first().cloned() else {
			return Err(TransportError::network("no endpoints configured", None, None));
		};

		let mut pending = urls.iter();
		let mut in_flight = FuturesUnordered::new();
		let mut last_error: Option<TransportError> = None;

		loop {
			if in_flight.is_empty() {
				match pending.next() {
					Some(url) => in_flight.push(self.try_request_on_url(url.clone(), body.clone())),
					None => break,
				}
			}

			let stall = tokio::time::sleep(self.stall_timeout);
			tokio::select! {
				Some((url, result)) = in_flight.next() => match result {
					Ok(value) => {
						if url != preferred {
							self.promote(&url).await;
						}
						return Ok(value);
					}
					Err(error) => {
						tracing::warn!(url = %url, method = %method, "endpoint failed: {}", error);
						last_error = Some(error);
						if let Some(next) = pending.next() {
							in_flight.push(self.try_request_on_url(next.clone(), body.clone()));
						}
					}
				},
				_ = stall, if pending.len() > 0 => {
					if let Some(next) = pending.next() {
						tracing::debug!(url = %next, method = %method, "endpoint stalled, racing next");
						in_flight.push(self.try_request_on_url(next.clone(), body.clone()));
					}
				}
			}
		}

		Err(last_error.unwrap_or_else(|| {
			TransportError::timeout(
				format!("no endpoint answered {}", method),
				None,
				None,
			)
		}))
	}
}
