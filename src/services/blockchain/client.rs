//! Core chain connection interface.
//!
//! Every connection handed to a trigger implements [`ChainConnection`],
//! regardless of whether it talks to a single HTTP endpoint, a WebSocket or a
//! fallback set of public endpoints.

use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::{models::EVMLog, services::filter::LogFilter};

/// A live log subscription opened on a connection
#[derive(Debug)]
pub struct LogSubscription {
	/// Identifier used to close the subscription
	pub id: String,
	/// Receives every log matching the subscription filter
	pub receiver: mpsc::UnboundedReceiver<EVMLog>,
}

/// Defines the read and subscribe operations triggers perform on a chain
#[async_trait]
pub trait ChainConnection: Send + Sync {
	/// Endpoint requests are currently sent to
	async fn current_url(&self) -> String;

	/// Native balance of an account at the latest block
	///
	/// # Arguments
	/// * `address` - The account to read
	///
	/// # Returns
	/// * `Result<U256, anyhow::Error>` - Balance in wei or an error
	async fn get_balance(&self, address: Address) -> Result<U256, anyhow::Error>;

	/// Executes a read-only call at the latest block
	///
	/// # Arguments
	/// * `to` - Contract address
	/// * `data` - ABI encoded call data
	///
	/// # Returns
	/// * `Result<Bytes, anyhow::Error>` - Raw return data or an error
	async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, anyhow::Error>;

	/// Starts delivering logs that match the filter
	///
	/// Logs are delivered through push notifications when the connection
	/// supports them and through block range polling otherwise.
	async fn subscribe_logs(&self, filter: &LogFilter) -> Result<LogSubscription, anyhow::Error>;

	/// Stops a subscription opened by [`ChainConnection::subscribe_logs`].
	///
	/// Unknown ids are ignored.
	async fn unsubscribe(&self, id: &str) -> Result<(), anyhow::Error>;
}

/// Shared handle to an open connection
pub type ConnectionHandle = Arc<dyn ChainConnection>;
