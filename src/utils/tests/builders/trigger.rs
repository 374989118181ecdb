//! Test helper utilities for trigger configurations and chain data
//!
//! - `TriggerConfigBuilder`: Builder for creating test TriggerConfig instances
//! - `LogBuilder`: Builder for creating test EVM logs

use alloy::primitives::{Address, Bytes, B256, U64};

use crate::models::{
	BalanceWatch, Direction, EVMLog, ProviderCredential, ProviderKind, ScheduleSpec,
	SecretValue, TriggerConfig, WatchSpec,
};

/// Builder for creating test TriggerConfig instances
///
/// Defaults to a valid balance watch on sepolia through the public endpoints.
pub struct TriggerConfigBuilder {
	trigger_key: String,
	network: String,
	provider_kind: ProviderKind,
	credential: Option<ProviderCredential>,
	custom_http_url: Option<SecretValue>,
	custom_ws_url: Option<SecretValue>,
	watch: WatchSpec,
}

impl Default for TriggerConfigBuilder {
	fn default() -> Self {
		Self {
			trigger_key: "test-trigger".to_string(),
			network: "sepolia".to_string(),
			provider_kind: ProviderKind::Public,
			credential: None,
			custom_http_url: None,
			custom_ws_url: None,
			watch: WatchSpec::Balance(BalanceWatch {
				address: Address::repeat_byte(0xde),
				direction: Direction::Increase,
				schedule: ScheduleSpec::default(),
			}),
		}
	}
}

impl TriggerConfigBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn key(mut self, key: &str) -> Self {
		self.trigger_key = key.to_string();
		self
	}

	pub fn network(mut self, network: &str) -> Self {
		self.network = network.to_string();
		self
	}

	pub fn provider(mut self, kind: ProviderKind) -> Self {
		self.provider_kind = kind;
		self
	}

	pub fn credential(mut self, api_key: &str, secret_key: Option<&str>) -> Self {
		self.credential = Some(ProviderCredential {
			api_key: SecretValue::plain(api_key),
			secret_key: secret_key.map(SecretValue::plain),
		});
		self
	}

	pub fn custom_http_url(mut self, url: &str) -> Self {
		self.custom_http_url = Some(SecretValue::plain(url));
		self
	}

	pub fn custom_http_secret(mut self, url: SecretValue) -> Self {
		self.custom_http_url = Some(url);
		self
	}

	pub fn custom_ws_url(mut self, url: &str) -> Self {
		self.custom_ws_url = Some(SecretValue::plain(url));
		self
	}

	pub fn watch(mut self, watch: WatchSpec) -> Self {
		self.watch = watch;
		self
	}

	pub fn build(self) -> TriggerConfig {
		TriggerConfig {
			trigger_key: self.trigger_key,
			network: self.network,
			provider_kind: self.provider_kind,
			credential: self.credential,
			custom_http_url: self.custom_http_url,
			custom_ws_url: self.custom_ws_url,
			watch: self.watch,
		}
	}
}

/// Builder for creating test EVM logs
pub struct LogBuilder {
	log: EVMLog,
}

impl Default for LogBuilder {
	fn default() -> Self {
		Self {
			log: EVMLog {
				address: Address::ZERO,
				topics: Vec::new(),
				data: Bytes::new(),
				block_hash: Some(B256::repeat_byte(0xbb)),
				block_number: Some(U64::from(1u64)),
				transaction_hash: Some(B256::repeat_byte(0xaa)),
				log_index: Some(U64::ZERO),
				removed: Some(false),
			},
		}
	}
}

impl LogBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn address(mut self, address: Address) -> Self {
		self.log.address = address;
		self
	}

	pub fn topic(mut self, topic: B256) -> Self {
		self.log.topics.push(topic);
		self
	}

	pub fn data(mut self, data: impl Into<Bytes>) -> Self {
		self.log.data = data.into();
		self
	}

	pub fn block_number(mut self, number: u64) -> Self {
		self.log.block_number = Some(U64::from(number));
		self
	}

	pub fn transaction_hash(mut self, hash: B256) -> Self {
		self.log.transaction_hash = Some(hash);
		self
	}

	pub fn removed(mut self, removed: bool) -> Self {
		self.log.removed = Some(removed);
		self
	}

	pub fn build(self) -> EVMLog {
		self.log
	}
}
