//! Chain connections and the provider factory.
//!
//! Provides abstractions and concrete implementations for talking to EVM
//! networks. Includes:
//!
//! - Chain connection trait shared by every provider kind
//! - EVM client over HTTP and WebSocket transports
//! - Provider factory building connections from trigger parameters
//! - Reference-counted connection pool
//! - Error handling for connection operations

mod client;
mod clients;
mod error;
mod factory;
mod pool;
mod transports;

pub use client::{ChainConnection, ConnectionHandle, LogSubscription};
pub use clients::EvmClient;
pub use error::BlockChainError;
pub use factory::{
	select_endpoints, ConnectionFactory, ConnectionRequest, ProviderFactory, ResolvedEndpoints,
	ResolvedSecrets, TransportPreference,
};
pub use pool::{ConnectionPool, PoolKey};
pub use transports::{
	BlockchainTransport, EndpointManager, HttpTransportClient, TransientErrorRetryStrategy,
	TransportError, TransportSubscription, WsTransportClient,
};
