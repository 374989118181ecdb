//! Log watches delivered through the registry to the emission sink.

use alloy::primitives::{address, Address, U256};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;

use chain_triggers::{
	models::{EVMLog, ExecutionRecord, LogDirection, LogWatch, TriggerConfig, WatchSpec},
	services::{
		emitter::ListenerBus,
		filter::evm_helpers::{event_signature, pad_address},
		trigger::{StartOutcome, TriggerRegistry},
	},
	utils::tests::builders::trigger::{LogBuilder, TriggerConfigBuilder},
};

use crate::integration::mocks::{listen, FakeChainFactory, ManualScheduler};

const TOKEN: Address = address!("1f9840a85d5af5bf1d1762f925bdaddc4201f984");
const TREASURY: Address = address!("000000000000000000000000000000000000dead");
const SENDER: Address = address!("00000000000000000000000000000000000a11ce");

type Registry = TriggerRegistry<FakeChainFactory, ManualScheduler, ListenerBus>;

async fn registry() -> (Registry, Arc<ListenerBus>) {
	let bus = Arc::new(ListenerBus::new());
	let registry = TriggerRegistry::new(
		FakeChainFactory::default(),
		ManualScheduler::default(),
		bus.clone(),
	)
	.await
	.unwrap();
	(registry, bus)
}

fn incoming_transfers(key: &str) -> TriggerConfig {
	TriggerConfigBuilder::new()
		.key(key)
		.network("mainnet")
		.watch(WatchSpec::Log(LogWatch {
			contract_address: Some(TOKEN),
			topic0: event_signature("Transfer(address,address,uint256)"),
			direction: Some(LogDirection::To),
			counterparty: Some(TREASURY),
			expected_topic_count: 3,
		}))
		.build()
}

fn transfer(to: Address, amount: u64) -> EVMLog {
	LogBuilder::new()
		.address(TOKEN)
		.topic(event_signature("Transfer(address,address,uint256)"))
		.topic(pad_address(SENDER))
		.topic(pad_address(to))
		.data(U256::from(amount).to_be_bytes::<32>().to_vec())
		.build()
}

async fn next(receiver: &mut mpsc::UnboundedReceiver<ExecutionRecord>) -> ExecutionRecord {
	tokio::time::timeout(Duration::from_secs(2), receiver.recv())
		.await
		.expect("no record emitted")
		.expect("listener closed")
}

async fn assert_silent(receiver: &mut mpsc::UnboundedReceiver<ExecutionRecord>) {
	tokio::time::sleep(Duration::from_millis(50)).await;
	assert!(receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_matching_log_is_normalized_and_emitted() {
	let (registry, bus) = registry().await;
	let mut records = listen(&bus, "wf-1:transfers");

	let outcome = registry
		.start("wf-1:transfers", incoming_transfers("wf-1:transfers"))
		.await
		.unwrap();
	assert_eq!(outcome, StartOutcome::Started);

	let chain = registry.factory().chain.clone();
	assert_eq!(chain.broadcast(&transfer(TREASURY, 1_000)), 1);

	let record = next(&mut records).await;
	assert_eq!(
		record.get_str("contractAddress"),
		Some("0x1f9840a85d5af5bf1d1762f925bdaddc4201f984")
	);
	assert_eq!(
		record.get_str("to"),
		Some("0x000000000000000000000000000000000000dead")
	);
	assert_eq!(record.get_str("amount"), Some("1000"));
	assert_eq!(record.get_str("network"), Some("mainnet"));
	assert!(record
		.get_str("explorerLink")
		.unwrap()
		.starts_with("https://etherscan.io/tx/0x"));
}

#[tokio::test]
async fn test_non_matching_logs_are_not_emitted() {
	let (registry, bus) = registry().await;
	let mut records = listen(&bus, "wf");
	registry.start("wf", incoming_transfers("wf")).await.unwrap();

	let chain = registry.factory().chain.clone();
	// Outgoing transfer from the treasury does not match the recipient slot
	assert_eq!(chain.broadcast(&transfer(SENDER, 5)), 0);

	// Matches the filter but carries a token id topic as well
	let mut nft = transfer(TREASURY, 1);
	nft.topics.push(pad_address(SENDER));
	chain.broadcast(&nft);

	assert_silent(&mut records).await;
}

#[tokio::test]
async fn test_two_keys_watching_same_logs_both_emit() {
	let (registry, bus) = registry().await;
	let mut first = listen(&bus, "wf-1");
	let mut second = listen(&bus, "wf-2");

	registry.start("wf-1", incoming_transfers("wf-1")).await.unwrap();
	registry.start("wf-2", incoming_transfers("wf-2")).await.unwrap();

	let chain = registry.factory().chain.clone();
	assert_eq!(chain.subscription_count(), 2);
	assert_eq!(chain.broadcast(&transfer(TREASURY, 7)), 2);

	assert_eq!(next(&mut first).await.get_str("amount"), Some("7"));
	assert_eq!(next(&mut second).await.get_str("amount"), Some("7"));
}

#[tokio::test]
async fn test_stopped_key_emits_nothing() {
	let (registry, bus) = registry().await;
	let mut first = listen(&bus, "wf-1");
	let mut second = listen(&bus, "wf-2");
	registry.start("wf-1", incoming_transfers("wf-1")).await.unwrap();
	registry.start("wf-2", incoming_transfers("wf-2")).await.unwrap();

	registry.stop("wf-1").await;

	let chain = registry.factory().chain.clone();
	assert_eq!(chain.subscription_count(), 1);
	chain.broadcast(&transfer(TREASURY, 9));

	assert_eq!(next(&mut second).await.get_str("amount"), Some("9"));
	assert_silent(&mut first).await;
	assert!(!bus.has_listener("wf-1"));
	assert!(bus.has_listener("wf-2"));
}

#[tokio::test]
async fn test_identical_log_watch_is_not_started_twice() {
	let (registry, _bus) = registry().await;

	let first = registry.start("wf", incoming_transfers("wf")).await.unwrap();
	let second = registry.start("wf", incoming_transfers("wf")).await.unwrap();

	assert_eq!(first, StartOutcome::Started);
	assert_eq!(second, StartOutcome::AlreadyRunning);
	assert_eq!(registry.factory().chain.subscription_count(), 1);
	assert_eq!(registry.factory().connects(), 1);
}

#[tokio::test]
async fn test_shutdown_releases_every_connection() {
	let (registry, _bus) = registry().await;
	registry.start("wf-1", incoming_transfers("wf-1")).await.unwrap();
	registry.start("wf-2", incoming_transfers("wf-2")).await.unwrap();

	registry.shutdown().await.unwrap();

	assert!(registry.active_keys().await.is_empty());
	assert_eq!(registry.factory().chain.subscription_count(), 0);
	assert_eq!(registry.factory().releases(), 2);
}
