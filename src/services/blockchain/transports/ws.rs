//! WebSocket transport implementation for blockchain interactions.
//!
//! One socket carries both JSON-RPC calls and `eth_subscribe` notifications.
//! A writer task drains an outgoing queue into the socket and a reader task
//! routes every incoming frame: responses go to the caller waiting on their
//! request id, notifications go to the receiver of their subscription id.
//! Dropping the last clone of the client aborts both tasks.

use anyhow::Context;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::{
	collections::HashMap,
	fmt,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc, Mutex, MutexGuard,
	},
	time::Duration,
};
use tokio::{
	sync::{mpsc, oneshot},
	task::JoinHandle,
};
use tokio_tungstenite::{
	connect_async,
	tungstenite::{client::IntoClientRequest, http::HeaderValue, Message},
};

use crate::{
	models::{ProviderSettings, SecretString},
	services::blockchain::transports::{
		basic_auth_value, BlockchainTransport, TransportError, TransportSubscription,
	},
};

enum Pending {
	Call(oneshot::Sender<Value>),
	Subscribe {
		reply: oneshot::Sender<Value>,
		sink: mpsc::UnboundedSender<Value>,
	},
}

#[derive(Default)]
struct Router {
	pending: Mutex<HashMap<u64, Pending>>,
	subscriptions: Mutex<HashMap<String, mpsc::UnboundedSender<Value>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Router {
	fn dispatch(&self, text: &str) {
		let value: Value = match serde_json::from_str(text) {
			Ok(value) => value,
			Err(e) => {
				tracing::debug!("Ignoring non-JSON WebSocket frame: {}", e);
				return;
			}
		};

		if let Some(id) = value.get("id").and_then(Value::as_u64) {
			match lock(&self.pending).remove(&id) {
				Some(Pending::Call(reply)) => {
					let _ = reply.send(value);
				}
				Some(Pending::Subscribe { reply, sink }) => {
					// Registered here so no notification can overtake the subscription
					if let Some(subscription_id) = value.get("result").and_then(Value::as_str) {
						lock(&self.subscriptions).insert(subscription_id.to_string(), sink);
					}
					let _ = reply.send(value);
				}
				None => tracing::debug!(id, "Response for unknown request id"),
			}
			return;
		}

		if value.get("method").and_then(Value::as_str) == Some("eth_subscription") {
			let params = &value["params"];
			if let Some(subscription_id) = params.get("subscription").and_then(Value::as_str) {
				let mut subscriptions = lock(&self.subscriptions);
				let closed = match subscriptions.get(subscription_id) {
					Some(sink) => sink.send(params["result"].clone()).is_err(),
					None => false,
				};
				if closed {
					subscriptions.remove(subscription_id);
				}
			}
		}
	}

	/// Drops every waiter so callers and subscribers observe the closed socket
	fn close(&self) {
		lock(&self.pending).clear();
		lock(&self.subscriptions).clear();
	}
}

struct Inner {
	url: String,
	next_id: AtomicU64,
	outgoing: mpsc::UnboundedSender<Message>,
	router: Arc<Router>,
	request_timeout: Duration,
	tasks: Vec<JoinHandle<()>>,
}

impl Drop for Inner {
	fn drop(&mut self) {
		for task in &self.tasks {
			task.abort();
		}
	}
}

/// WebSocket JSON-RPC transport with push subscriptions
#[derive(Clone)]
pub struct WsTransportClient {
	inner: Arc<Inner>,
}

impl fmt::Debug for WsTransportClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WsTransportClient")
			.field("url", &self.inner.url)
			.finish()
	}
}

impl WsTransportClient {
	/// Opens the socket and starts the reader and writer tasks
	///
	/// # Arguments
	/// * `url` - `ws://` or `wss://` endpoint
	/// * `auth` - Optional project secret sent as HTTP basic auth on the handshake
	/// * `settings` - Readiness and request timeouts
	pub async fn connect(
		url: &str,
		auth: Option<&SecretString>,
		settings: &ProviderSettings,
	) -> Result<Self, anyhow::Error> {
		let mut request = url
			.into_client_request()
			.context("Invalid WebSocket URL")?;
		if let Some(secret) = auth {
			let mut value = HeaderValue::from_str(&basic_auth_value(secret))
				.context("Failed to build authorization header")?;
			value.set_sensitive(true);
			request.headers_mut().insert("Authorization", value);
		}

		let (stream, _response) =
			tokio::time::timeout(settings.readiness_timeout(), connect_async(request))
				.await
				.map_err(|_| anyhow::anyhow!("Timed out connecting to WebSocket endpoint"))?
				.context("Failed to connect to WebSocket endpoint")?;
		let (mut write, mut read) = stream.split();

		let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
		let writer = tokio::spawn(async move {
			while let Some(message) = outgoing_rx.recv().await {
				if let Err(e) = write.send(message).await {
					tracing::warn!("WebSocket write failed: {}", e);
					break;
				}
			}
			let _ = write.close().await;
		});

		let router = Arc::new(Router::default());
		let reader_router = router.clone();
		let reader = tokio::spawn(async move {
			while let Some(message) = read.next().await {
				match message {
					Ok(Message::Text(text)) => reader_router.dispatch(&text),
					Ok(Message::Close(_)) => break,
					Ok(_) => {}
					Err(e) => {
						tracing::warn!("WebSocket read failed: {}", e);
						break;
					}
				}
			}
			tracing::debug!("WebSocket reader finished");
			reader_router.close();
		});

		Ok(Self {
			inner: Arc::new(Inner {
				url: url.to_string(),
				next_id: AtomicU64::new(1),
				outgoing,
				router,
				request_timeout: settings.request_timeout(),
				tasks: vec![writer, reader],
			}),
		})
	}

	async fn call(
		&self,
		method: &str,
		params: Value,
		sink: Option<mpsc::UnboundedSender<Value>>,
	) -> Result<Value, TransportError> {
		let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
		let body = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
			"params": params
		});
		let text = serde_json::to_string(&body).map_err(|e| {
			TransportError::request_serialization(
				"Failed to serialize request JSON",
				Some(Box::new(e)),
				None,
			)
		})?;

		let (reply, response) = oneshot::channel();
		let pending = match sink {
			Some(sink) => Pending::Subscribe { reply, sink },
			None => Pending::Call(reply),
		};
		lock(&self.inner.router.pending).insert(id, pending);

		if self.inner.outgoing.send(Message::text(text)).is_err() {
			lock(&self.inner.router.pending).remove(&id);
			return Err(TransportError::network(
				"WebSocket connection closed",
				None,
				Some(HashMap::from([("url".to_string(), self.inner.url.clone())])),
			));
		}

		match tokio::time::timeout(self.inner.request_timeout, response).await {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(_)) => Err(TransportError::network(
				"WebSocket connection closed before response",
				None,
				Some(HashMap::from([("url".to_string(), self.inner.url.clone())])),
			)),
			Err(_) => {
				lock(&self.inner.router.pending).remove(&id);
				Err(TransportError::timeout(
					format!("no response to {}", method),
					None,
					Some(HashMap::from([("url".to_string(), self.inner.url.clone())])),
				))
			}
		}
	}
}

#[async_trait]
impl BlockchainTransport for WsTransportClient {
	async fn get_current_url(&self) -> String {
		self.inner.url.clone()
	}

	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, TransportError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		let params = params.map(|p| p.into()).unwrap_or_else(|| json!([]));
		self.call(method, params, None).await
	}

	fn supports_subscriptions(&self) -> bool {
		true
	}

	async fn subscribe(&self, params: Value) -> Result<TransportSubscription, TransportError> {
		let (sink, receiver) = mpsc::unbounded_channel();
		let response = self.call("eth_subscribe", params, Some(sink)).await?;

		match response.get("result").and_then(Value::as_str) {
			Some(id) => Ok(TransportSubscription {
				id: id.to_string(),
				receiver,
			}),
			None => Err(TransportError::subscription(
				format!(
					"eth_subscribe rejected: {}",
					response.get("error").cloned().unwrap_or(Value::Null)
				),
				None,
				Some(HashMap::from([("url".to_string(), self.inner.url.clone())])),
			)),
		}
	}

	async fn unsubscribe(&self, id: &str) -> Result<(), TransportError> {
		lock(&self.inner.router.subscriptions).remove(id);
		self.call("eth_unsubscribe", json!([id]), None).await?;
		Ok(())
	}
}
