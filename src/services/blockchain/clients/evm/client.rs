//! EVM-compatible chain connection.
//!
//! Wraps a JSON-RPC transport and provides balance reads, view calls and log
//! subscriptions. Transports that support `eth_subscribe` receive logs as push
//! notifications; all other transports are polled with `eth_blockNumber` and
//! `eth_getLogs` on a fixed interval.

use alloy::primitives::{Address, Bytes, U256};
use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Mutex,
	},
	time::Duration,
};
use tokio::{sync::mpsc, task::JoinHandle, time::MissedTickBehavior};
use tracing::instrument;

use crate::{
	models::EVMLog,
	services::{
		blockchain::{
			client::{ChainConnection, LogSubscription},
			transports::BlockchainTransport,
		},
		filter::{evm_helpers::h160_to_string, LogFilter},
	},
	utils::{parse_hex_quantity, to_hex_quantity},
};

/// Sends a request and extracts the `result` field, surfacing JSON-RPC errors
async fn request<T: BlockchainTransport>(
	transport: &T,
	method: &str,
	params: Value,
) -> Result<Value, anyhow::Error> {
	let response = transport
		.send_raw_request(method, Some(params))
		.await
		.with_context(|| format!("Failed to send {}", method))?;

	if let Some(error) = response.get("error") {
		return Err(anyhow::anyhow!("{} returned an error: {}", method, error));
	}

	response
		.get("result")
		.cloned()
		.with_context(|| "Missing 'result' field")
}

async fn block_number<T: BlockchainTransport>(transport: &T) -> Result<u64, anyhow::Error> {
	let result = request(transport, "eth_blockNumber", json!([])).await?;
	let hex_str = result
		.as_str()
		.ok_or_else(|| anyhow::anyhow!("Block number is not a string"))?;

	parse_hex_quantity(hex_str).map_err(|e| anyhow::anyhow!("Failed to parse block number: {}", e))
}

async fn logs_in_range<T: BlockchainTransport>(
	transport: &T,
	filter: &LogFilter,
	from_block: u64,
	to_block: u64,
) -> Result<Vec<EVMLog>, anyhow::Error> {
	let mut params = filter.to_rpc_object();
	params["fromBlock"] = json!(to_hex_quantity(from_block));
	params["toBlock"] = json!(to_hex_quantity(to_block));

	let result = request(transport, "eth_getLogs", json!([params])).await?;
	serde_json::from_value(result).with_context(|| "Failed to parse logs")
}

/// Polls block ranges until the receiver goes away.
///
/// The first head seen is the starting point, so logs emitted before the
/// subscription are never replayed.
async fn poll_logs<T: BlockchainTransport>(
	transport: T,
	filter: LogFilter,
	interval: Duration,
	sender: mpsc::UnboundedSender<EVMLog>,
) {
	let mut ticker = tokio::time::interval(interval);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
	let mut last_block: Option<u64> = None;

	loop {
		ticker.tick().await;
		if sender.is_closed() {
			break;
		}

		let head = match block_number(&transport).await {
			Ok(head) => head,
			Err(e) => {
				tracing::warn!("Failed to read block number while polling logs: {:#}", e);
				continue;
			}
		};

		let from_block = match last_block {
			None => {
				last_block = Some(head);
				continue;
			}
			Some(last) if head <= last => continue,
			Some(last) => last + 1,
		};

		match logs_in_range(&transport, &filter, from_block, head).await {
			Ok(logs) => {
				for log in logs.into_iter().filter(|log| filter.matches(log)) {
					if sender.send(log).is_err() {
						return;
					}
				}
				last_block = Some(head);
			}
			Err(e) => {
				tracing::warn!(from_block, to_block = head, "Failed to fetch logs: {:#}", e);
			}
		}
	}
}

/// Chain connection for Ethereum Virtual Machine (EVM) compatible networks
pub struct EvmClient<T> {
	/// The underlying transport for RPC communication
	transport: T,
	/// Interval between `eth_getLogs` polls for transports without push support
	log_poll_interval: Duration,
	/// Forwarding and polling tasks keyed by subscription id
	tasks: Mutex<HashMap<String, JoinHandle<()>>>,
	next_poll_id: AtomicU64,
}

impl<T> EvmClient<T> {
	/// Creates a new client over a connected transport
	pub fn new_with_transport(transport: T, log_poll_interval: Duration) -> Self {
		Self {
			transport,
			log_poll_interval,
			tasks: Mutex::new(HashMap::new()),
			next_poll_id: AtomicU64::new(1),
		}
	}

	/// Number of subscriptions with a running task
	pub fn subscription_count(&self) -> usize {
		self.tasks.lock().map(|tasks| tasks.len()).unwrap_or(0)
	}

	fn track(&self, id: String, task: JoinHandle<()>) {
		match self.tasks.lock() {
			Ok(mut tasks) => {
				if let Some(previous) = tasks.insert(id, task) {
					previous.abort();
				}
			}
			Err(_) => task.abort(),
		}
	}

	fn untrack(&self, id: &str) -> bool {
		match self.tasks.lock() {
			Ok(mut tasks) => match tasks.remove(id) {
				Some(task) => {
					task.abort();
					true
				}
				None => false,
			},
			Err(_) => false,
		}
	}
}

impl<T> Drop for EvmClient<T> {
	fn drop(&mut self) {
		if let Ok(tasks) = self.tasks.get_mut() {
			for (_, task) in tasks.drain() {
				task.abort();
			}
		}
	}
}

#[async_trait]
impl<T: BlockchainTransport + Clone + 'static> ChainConnection for EvmClient<T> {
	async fn current_url(&self) -> String {
		self.transport.get_current_url().await
	}

	#[instrument(skip(self))]
	async fn get_balance(&self, address: Address) -> Result<U256, anyhow::Error> {
		let result = request(
			&self.transport,
			"eth_getBalance",
			json!([h160_to_string(address), "latest"]),
		)
		.await?;

		serde_json::from_value(result).with_context(|| "Failed to parse balance")
	}

	#[instrument(skip(self, data))]
	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, anyhow::Error> {
		let result = request(
			&self.transport,
			"eth_call",
			json!([
				{
					"to": h160_to_string(to),
					"data": format!("0x{}", hex::encode(&data))
				},
				"latest"
			]),
		)
		.await?;

		serde_json::from_value(result).with_context(|| "Failed to parse call result")
	}

	#[instrument(skip(self, filter))]
	async fn subscribe_logs(&self, filter: &LogFilter) -> Result<LogSubscription, anyhow::Error> {
		let (sender, receiver) = mpsc::unbounded_channel();

		if self.transport.supports_subscriptions() {
			let subscription = self
				.transport
				.subscribe(json!(["logs", filter.to_rpc_object()]))
				.await
				.with_context(|| "Failed to open log subscription")?;

			let id = subscription.id;
			let mut notifications = subscription.receiver;
			let filter = filter.clone();
			let task = tokio::spawn(async move {
				while let Some(payload) = notifications.recv().await {
					let log: EVMLog = match serde_json::from_value(payload) {
						Ok(log) => log,
						Err(e) => {
							tracing::debug!("Ignoring undecodable log notification: {}", e);
							continue;
						}
					};
					if filter.matches(&log) && sender.send(log).is_err() {
						break;
					}
				}
			});

			tracing::debug!(subscription = %id, "Opened push log subscription");
			self.track(id.clone(), task);
			return Ok(LogSubscription { id, receiver });
		}

		let id = format!(
			"poll-{}",
			self.next_poll_id.fetch_add(1, Ordering::SeqCst)
		);
		let task = tokio::spawn(poll_logs(
			self.transport.clone(),
			filter.clone(),
			self.log_poll_interval,
			sender,
		));

		tracing::debug!(subscription = %id, "Started log polling");
		self.track(id.clone(), task);
		Ok(LogSubscription { id, receiver })
	}

	async fn unsubscribe(&self, id: &str) -> Result<(), anyhow::Error> {
		if !self.untrack(id) {
			return Ok(());
		}
		if self.transport.supports_subscriptions() {
			self.transport
				.unsubscribe(id)
				.await
				.with_context(|| format!("Failed to close subscription {}", id))?;
		}
		Ok(())
	}
}
