//! Balance and view function watches driven by a manual scheduler.

use alloy::primitives::{address, Address, Bytes, U256};
use serde_json::json;
use std::{
	collections::VecDeque,
	sync::{Arc, Mutex},
};
use tokio::sync::mpsc;

use chain_triggers::{
	models::{
		BalanceWatch, Direction, ExecutionRecord, IntervalUnit, ScheduleSpec, TriggerConfig,
		ViewFunctionWatch, WatchSpec,
	},
	services::{
		blockchain::ConnectionHandle,
		emitter::ListenerBus,
		trigger::TriggerRegistry,
	},
	utils::tests::builders::trigger::TriggerConfigBuilder,
};

use crate::integration::mocks::{
	listen, FakeChainFactory, HeldBalance, ManualScheduler, MockChainConnection,
	MockConnectionFactory,
};

const WALLET: Address = address!("000000000000000000000000000000000000beef");
const VAULT: Address = address!("5615deb798bb3e4dfa0139dfa1b3d433cc23b72f");

fn balance_config(direction: Direction) -> TriggerConfig {
	TriggerConfigBuilder::new()
		.key("wf")
		.watch(WatchSpec::Balance(BalanceWatch {
			address: WALLET,
			direction,
			schedule: ScheduleSpec::default(),
		}))
		.build()
}

fn drain(receiver: &mut mpsc::UnboundedReceiver<ExecutionRecord>) -> Vec<ExecutionRecord> {
	let mut records = Vec::new();
	while let Ok(record) = receiver.try_recv() {
		records.push(record);
	}
	records
}

async fn balance_registry(
	direction: Direction,
) -> (
	TriggerRegistry<FakeChainFactory, ManualScheduler, ListenerBus>,
	ManualScheduler,
	mpsc::UnboundedReceiver<ExecutionRecord>,
) {
	let bus = Arc::new(ListenerBus::new());
	let records = listen(&bus, "wf");
	let scheduler = ManualScheduler::default();
	let registry = TriggerRegistry::new(FakeChainFactory::default(), scheduler.clone(), bus)
		.await
		.unwrap();
	registry.start("wf", balance_config(direction)).await.unwrap();
	(registry, scheduler, records)
}

#[tokio::test]
async fn test_balance_watch_uses_default_interval() {
	let (registry, scheduler, _records) = balance_registry(Direction::Increase).await;

	assert_eq!(scheduler.expressions(), vec!["0 */1 * * * *".to_string()]);
	assert_eq!(registry.factory().connects(), 1);
}

#[tokio::test]
async fn test_balance_increase_fires_once() {
	let (registry, scheduler, mut records) = balance_registry(Direction::Increase).await;
	registry
		.factory()
		.chain
		.push_balances(&[100, 100, 150, 120, 130]);

	for _ in 0..5 {
		scheduler.fire_all().await;
	}

	let records = drain(&mut records);
	assert_eq!(records.len(), 2);

	let first = &records[0];
	assert_eq!(first.get_str("previousBalance"), Some("100"));
	assert_eq!(first.get_str("currentBalance"), Some("150"));
	assert_eq!(first.get_str("delta"), Some("50"));
	assert_eq!(
		first.get_str("address"),
		Some("0x000000000000000000000000000000000000beef")
	);
	assert_eq!(first.get_str("network"), Some("sepolia"));
	assert_eq!(first.get_str("currency"), Some("ETH"));
	assert!(first.get_str("timestamp").is_some());

	// The decrease to 120 replaced the baseline without firing
	assert_eq!(records[1].get_str("previousBalance"), Some("120"));
	assert_eq!(records[1].get_str("delta"), Some("10"));
}

#[tokio::test]
async fn test_balance_decrease_reports_negative_delta() {
	let (registry, scheduler, mut records) = balance_registry(Direction::Decrease).await;
	registry.factory().chain.push_balances(&[500, 650, 400]);

	for _ in 0..3 {
		scheduler.fire_all().await;
	}

	let records = drain(&mut records);
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].get_str("previousBalance"), Some("650"));
	assert_eq!(records[0].get_str("delta"), Some("-250"));
}

#[tokio::test]
async fn test_failed_balance_read_keeps_baseline() {
	let (registry, scheduler, mut records) = balance_registry(Direction::Any).await;
	let chain = registry.factory().chain.clone();
	chain.push_balances(&[100]);
	chain.push_balance_failure("connection reset");
	chain.push_balances(&[100, 200]);

	for _ in 0..4 {
		scheduler.fire_all().await;
	}

	let records = drain(&mut records);
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].get_str("previousBalance"), Some("100"));
	assert_eq!(records[0].get_str("currentBalance"), Some("200"));
	assert!(registry.is_active("wf").await);
}

#[tokio::test]
async fn test_tick_finishing_after_stop_emits_nothing() {
	let chain = Arc::new(HeldBalance::new(100, 500));
	let connection: ConnectionHandle = chain.clone();

	let mut factory = MockConnectionFactory::new();
	factory
		.expect_connect()
		.times(1)
		.returning(move |_| Ok(connection.clone()));
	factory.expect_release().times(1).return_const(());

	let bus = Arc::new(ListenerBus::new());
	let scheduler = ManualScheduler::default();
	let registry = TriggerRegistry::new(factory, scheduler.clone(), bus.clone())
		.await
		.unwrap();
	registry
		.start("wf", balance_config(Direction::Increase))
		.await
		.unwrap();

	// Baseline read
	scheduler.fire_all().await;

	let tick = tokio::spawn({
		let scheduler = scheduler.clone();
		async move { scheduler.fire_all().await }
	});
	chain.read_held().await;

	registry.stop("wf").await;
	assert!(!registry.is_active("wf").await);

	// A listener registered after the stop must not see the stale tick
	let mut records = listen(&bus, "wf");
	chain.release_read();
	tick.await.unwrap();

	assert!(drain(&mut records).is_empty());
	assert_eq!(scheduler.job_count(), 0);
}

#[tokio::test]
async fn test_view_function_watch_emits_decoded_values() {
	let responses = Arc::new(Mutex::new(VecDeque::from([
		U256::from(1_000u64),
		U256::from(1_000u64),
		U256::from(1_250u64),
	])));

	let mut connection = MockChainConnection::new();
	connection
		.expect_call()
		.withf(|to, data| *to == VAULT && data.len() == 4)
		.times(3)
		.returning(move |_, _| {
			let next = responses.lock().unwrap().pop_front().unwrap_or_default();
			Ok(Bytes::from(next.to_be_bytes::<32>().to_vec()))
		});
	connection.expect_unsubscribe().never();
	let connection: ConnectionHandle = Arc::new(connection);

	let mut factory = MockConnectionFactory::new();
	factory
		.expect_connect()
		.times(1)
		.returning(move |_| Ok(connection.clone()));
	factory.expect_release().times(1).return_const(());

	let bus = Arc::new(ListenerBus::new());
	let mut records = listen(&bus, "vault");
	let scheduler = ManualScheduler::default();
	let registry = TriggerRegistry::new(factory, scheduler.clone(), bus)
		.await
		.unwrap();

	let config = TriggerConfigBuilder::new()
		.key("vault")
		.watch(WatchSpec::ViewFunction(ViewFunctionWatch {
			contract_address: VAULT,
			abi_fragment: json!({
				"type": "function",
				"name": "totalAssets",
				"inputs": [],
				"outputs": [{ "name": "", "type": "uint256" }],
				"stateMutability": "view"
			}),
			function_name: "totalAssets".to_string(),
			args: vec![],
			direction: Direction::Any,
			schedule: ScheduleSpec::Interval {
				value: 30,
				unit: IntervalUnit::Seconds,
			},
		}))
		.build();
	registry.start("vault", config).await.unwrap();
	assert_eq!(scheduler.expressions(), vec!["*/30 * * * * *".to_string()]);

	for _ in 0..3 {
		scheduler.fire_all().await;
	}

	let records = drain(&mut records);
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].get_str("function"), Some("totalAssets"));
	assert_eq!(records[0].get("previousValue"), Some(&json!("1000")));
	assert_eq!(records[0].get("currentValue"), Some(&json!("1250")));
	assert_eq!(records[0].get_str("delta"), Some("250"));

	registry.stop("vault").await;
}
