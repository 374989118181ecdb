//! Start, stop and restart against mocked sinks and connection factories.

use alloy::primitives::{address, Address, U256};
use std::sync::Arc;

use chain_triggers::{
	models::{
		LogDirection, LogWatch, ProviderKind, ScheduleSpec, ScheduleWatch, TriggerConfig,
		WatchSpec,
	},
	services::{
		blockchain::{BlockChainError, ConnectionHandle, ConnectionPool},
		emitter::ListenerBus,
		filter::evm_helpers::{event_signature, pad_address},
		trigger::{StartOutcome, TriggerError, TriggerRegistry},
	},
	utils::tests::builders::trigger::{LogBuilder, TriggerConfigBuilder},
};

use crate::integration::mocks::{
	FakeChain, ManualScheduler, MockConnectionFactory, MockEmissionSink,
};

const TOKEN: Address = address!("1f9840a85d5af5bf1d1762f925bdaddc4201f984");
const WALLET: Address = address!("000000000000000000000000000000000000beef");

fn hourly(key: &str) -> TriggerConfig {
	TriggerConfigBuilder::new()
		.key(key)
		.watch(WatchSpec::Schedule(ScheduleWatch {
			schedule: ScheduleSpec::Cron {
				expressions: vec!["0 0 * * * *".to_string()],
			},
		}))
		.build()
}

fn outgoing_transfers(key: &str) -> TriggerConfig {
	TriggerConfigBuilder::new()
		.key(key)
		.network("mainnet")
		.provider(ProviderKind::Alchemy)
		.credential("alchemy-key", None)
		.watch(WatchSpec::Log(LogWatch {
			contract_address: Some(TOKEN),
			topic0: event_signature("Transfer(address,address,uint256)"),
			direction: Some(LogDirection::From),
			counterparty: Some(WALLET),
			expected_topic_count: 3,
		}))
		.build()
}

fn shared_chain_factory(chain: Arc<FakeChain>) -> MockConnectionFactory {
	let mut factory = MockConnectionFactory::new();
	factory.expect_connect().times(1).returning(move |_| {
		let connection: ConnectionHandle = chain.clone();
		Ok(connection)
	});
	factory
}

#[tokio::test]
async fn test_schedule_records_reach_sink_until_stop() {
	let mut sink = MockEmissionSink::new();
	sink.expect_emit()
		.withf(|key, record| key.to_string() == "wf" && record.get("dayOfWeek").is_some())
		.times(2)
		.returning(|_, _| true);
	sink.expect_off()
		.withf(|key| key.to_string() == "wf")
		.times(1)
		.return_const(());

	let scheduler = ManualScheduler::default();
	let registry = TriggerRegistry::new(
		MockConnectionFactory::new(),
		scheduler.clone(),
		Arc::new(sink),
	)
	.await
	.unwrap();

	assert_eq!(
		registry.start("wf", hourly("wf")).await.unwrap(),
		StartOutcome::Started
	);
	scheduler.fire_all().await;
	scheduler.fire_all().await;

	registry.stop("wf").await;

	assert_eq!(scheduler.job_count(), 0);
	scheduler.fire_all().await;
	assert!(!registry.is_active("wf").await);
}

#[tokio::test]
async fn test_restart_does_not_remove_listener() {
	let mut sink = MockEmissionSink::new();
	sink.expect_off().times(0);
	sink.expect_emit().times(1).returning(|_, _| true);

	let scheduler = ManualScheduler::default();
	let registry = TriggerRegistry::new(
		MockConnectionFactory::new(),
		scheduler.clone(),
		Arc::new(sink),
	)
	.await
	.unwrap();

	registry.start("wf", hourly("wf")).await.unwrap();
	let mut every_minute = hourly("wf");
	every_minute.watch = WatchSpec::Schedule(ScheduleWatch {
		schedule: ScheduleSpec::default(),
	});

	let outcome = registry.restart("wf", every_minute).await.unwrap();

	assert_eq!(outcome, StartOutcome::Started);
	assert_eq!(scheduler.expressions(), vec!["0 */1 * * * *".to_string()]);
	scheduler.fire_all().await;
}

#[tokio::test]
async fn test_connect_failure_is_connectivity_error() {
	let mut factory = MockConnectionFactory::new();
	factory.expect_connect().times(1).returning(|_| {
		Err(BlockChainError::connection_error(
			"All RPC URLs failed to connect",
			None,
			None,
		))
	});
	factory.expect_release().times(0);

	let registry = TriggerRegistry::new(
		factory,
		ManualScheduler::default(),
		Arc::new(ListenerBus::new()),
	)
	.await
	.unwrap();

	let error = registry
		.start("wf", outgoing_transfers("wf"))
		.await
		.unwrap_err();

	assert!(matches!(error, TriggerError::ConnectivityError(_)));
	assert!(error.to_string().contains("All RPC URLs failed to connect"));
	assert!(registry.active_keys().await.is_empty());
}

#[tokio::test]
async fn test_rejected_credentials_are_configuration_error() {
	let mut factory = MockConnectionFactory::new();
	factory.expect_connect().times(1).returning(|_| {
		Err(BlockChainError::configuration_error(
			"Provider 'alchemy' has no endpoint for network 'mainnet'",
			None,
			None,
		))
	});

	let registry = TriggerRegistry::new(
		factory,
		ManualScheduler::default(),
		Arc::new(ListenerBus::new()),
	)
	.await
	.unwrap();

	let error = registry
		.start("wf", outgoing_transfers("wf"))
		.await
		.unwrap_err();

	assert!(error.is_configuration());
	assert!(!registry.is_active("wf").await);
}

#[tokio::test]
async fn test_invalid_config_never_connects() {
	let mut factory = MockConnectionFactory::new();
	factory.expect_connect().times(0);

	let registry = TriggerRegistry::new(
		factory,
		ManualScheduler::default(),
		Arc::new(ListenerBus::new()),
	)
	.await
	.unwrap();

	let mut config = outgoing_transfers("wf");
	if let WatchSpec::Log(watch) = &mut config.watch {
		watch.counterparty = None;
	}

	let error = registry.start("wf", config).await.unwrap_err();
	assert!(matches!(error, TriggerError::ConfigurationError(_)));

	// The key is free again after a rejected start
	registry.start("wf", hourly("wf")).await.unwrap();
	assert_eq!(registry.active_keys().await, vec!["wf".to_string()]);
}

#[tokio::test]
async fn test_pooled_connection_shared_between_keys() {
	let chain = Arc::new(FakeChain::default());
	let mut factory = shared_chain_factory(chain.clone());
	factory.expect_release().times(1).return_const(());

	let registry = TriggerRegistry::new(
		ConnectionPool::new(factory),
		ManualScheduler::default(),
		Arc::new(ListenerBus::new()),
	)
	.await
	.unwrap();

	registry.start("wf-1", outgoing_transfers("wf-1")).await.unwrap();
	registry.start("wf-2", outgoing_transfers("wf-2")).await.unwrap();

	assert_eq!(registry.factory().connection_count().await, 1);
	assert_eq!(chain.subscription_count(), 2);

	registry.stop("wf-1").await;
	assert_eq!(registry.factory().connection_count().await, 1);
	assert_eq!(chain.subscription_count(), 1);

	registry.stop("wf-2").await;
	assert_eq!(registry.factory().connection_count().await, 0);
	assert_eq!(chain.subscription_count(), 0);
}

#[tokio::test]
async fn test_restarted_log_watch_resubscribes() {
	let chain = Arc::new(FakeChain::default());
	let mut factory = MockConnectionFactory::new();
	let handle = chain.clone();
	factory.expect_connect().times(2).returning(move |_| {
		let connection: ConnectionHandle = handle.clone();
		Ok(connection)
	});
	factory.expect_release().times(2).return_const(());

	let registry = TriggerRegistry::new(
		factory,
		ManualScheduler::default(),
		Arc::new(ListenerBus::new()),
	)
	.await
	.unwrap();

	registry.start("wf", outgoing_transfers("wf")).await.unwrap();

	let mut incoming = outgoing_transfers("wf");
	if let WatchSpec::Log(watch) = &mut incoming.watch {
		watch.direction = Some(LogDirection::To);
	}
	registry.restart("wf", incoming).await.unwrap();

	assert_eq!(chain.subscription_count(), 1);

	let sent = LogBuilder::new()
		.address(TOKEN)
		.topic(event_signature("Transfer(address,address,uint256)"))
		.topic(pad_address(WALLET))
		.topic(pad_address(Address::ZERO))
		.data(U256::from(1u64).to_be_bytes::<32>().to_vec())
		.build();
	let received = LogBuilder::new()
		.address(TOKEN)
		.topic(event_signature("Transfer(address,address,uint256)"))
		.topic(pad_address(Address::ZERO))
		.topic(pad_address(WALLET))
		.data(U256::from(1u64).to_be_bytes::<32>().to_vec())
		.build();
	assert_eq!(chain.broadcast(&sent), 0);
	assert_eq!(chain.broadcast(&received), 1);

	registry.shutdown().await.unwrap();
}
