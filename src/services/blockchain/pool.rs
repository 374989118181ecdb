//! Reference-counted connection pool.
//!
//! Triggers that watch the same network through the same provider can share a
//! connection. The pool:
//! - Caches connections by provider kind, network, transport and endpoint identity
//! - Creates connections lazily on first use, outside the pool lock
//! - Counts the triggers holding each connection
//! - Drops a connection when its last holder releases it
//!
//! Secrets never appear in pool keys; they are reduced to keccak fingerprints.

use alloy::primitives::{keccak256, B256};
use async_trait::async_trait;
use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
};
use tokio::sync::{OnceCell, RwLock};

use crate::{
	models::{ProviderKind, SecretValue},
	services::blockchain::{
		client::ConnectionHandle,
		error::BlockChainError,
		factory::{ConnectionFactory, ConnectionRequest, TransportPreference},
	},
};

/// Identity of a pooled connection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
	kind: ProviderKind,
	network: String,
	transport: TransportPreference,
	credential: Option<B256>,
	secret_key: Option<B256>,
	custom_http_url: Option<B256>,
	custom_ws_url: Option<B256>,
}

fn fingerprint(value: &SecretValue) -> B256 {
	let tag = match value {
		SecretValue::Plain(_) => "plain:",
		SecretValue::Environment(_) => "environment:",
	};
	keccak256(format!("{}{}", tag, value.as_str()).as_bytes())
}

impl PoolKey {
	pub fn for_request(request: &ConnectionRequest) -> Self {
		let credential = request.credential.as_ref();
		Self {
			kind: request.kind,
			network: request.network.clone(),
			transport: request.transport,
			credential: credential.map(|c| fingerprint(&c.api_key)),
			secret_key: credential
				.and_then(|c| c.secret_key.as_ref())
				.map(fingerprint),
			custom_http_url: request.custom_http_url.as_ref().map(fingerprint),
			custom_ws_url: request.custom_ws_url.as_ref().map(fingerprint),
		}
	}
}

/// A pooled connection, possibly still being built
#[derive(Default)]
struct PoolSlot {
	handle: OnceCell<ConnectionHandle>,
	holders: AtomicUsize,
}

/// Connection factory that shares connections between identical requests
pub struct ConnectionPool<F> {
	factory: F,
	slots: RwLock<HashMap<PoolKey, Arc<PoolSlot>>>,
}

impl<F: ConnectionFactory> ConnectionPool<F> {
	/// Creates an empty pool over the factory that builds new connections
	pub fn new(factory: F) -> Self {
		Self {
			factory,
			slots: RwLock::new(HashMap::new()),
		}
	}

	/// Number of distinct live connections
	pub async fn connection_count(&self) -> usize {
		self.slots
			.read()
			.await
			.values()
			.filter(|slot| slot.handle.initialized())
			.count()
	}

	/// Number of holders of the connection a request maps to
	pub async fn holders(&self, request: &ConnectionRequest) -> usize {
		self.slots
			.read()
			.await
			.get(&PoolKey::for_request(request))
			.map(|slot| slot.holders.load(Ordering::SeqCst))
			.unwrap_or(0)
	}

	/// Gives back one hold on a slot, removing the slot with its last holder
	async fn drop_hold(&self, key: &PoolKey) -> bool {
		let mut slots = self.slots.write().await;
		let remaining = match slots.get(key) {
			Some(slot) => slot.holders.fetch_sub(1, Ordering::SeqCst).saturating_sub(1),
			None => return false,
		};
		if remaining == 0 {
			slots.remove(key);
		}
		remaining == 0
	}
}

#[async_trait]
impl<F: ConnectionFactory> ConnectionFactory for ConnectionPool<F> {
	/// Returns the pooled connection for the request, building it on first use.
	///
	/// The map lock only guards slot lookup. Concurrent callers for the same key
	/// wait on that slot's cell while other keys connect and release freely.
	async fn connect(
		&self,
		request: &ConnectionRequest,
	) -> Result<ConnectionHandle, BlockChainError> {
		let key = PoolKey::for_request(request);

		let slot = {
			let mut slots = self.slots.write().await;
			let slot = slots.entry(key.clone()).or_default().clone();
			slot.holders.fetch_add(1, Ordering::SeqCst);
			slot
		};

		let factory = &self.factory;
		let built = slot
			.handle
			.get_or_try_init(|| async move {
				let handle = factory.connect(request).await?;
				tracing::debug!(
					network = %request.network,
					provider_kind = %request.kind,
					"Opened pooled connection"
				);
				Ok::<_, BlockChainError>(handle)
			})
			.await
			.cloned();

		if built.is_err() {
			self.drop_hold(&key).await;
		}
		built
	}

	async fn release(&self, request: &ConnectionRequest) {
		if self.drop_hold(&PoolKey::for_request(request)).await {
			tracing::debug!(
				network = %request.network,
				provider_kind = %request.kind,
				"Closed pooled connection"
			);
		}
	}
}
