//! Per watch kind strategies.
//!
//! Each strategy turns a watch into the work that runs for it: a forwarder task
//! for log subscriptions or a tick for polling and schedule jobs. Records are
//! handed to an [`Emitter`], which the registry binds to one trigger
//! generation.

use alloy::primitives::{utils::format_ether, Address, U256};
use chrono::{DateTime, Datelike, Timelike, Utc};
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::{
	sync::{mpsc, Mutex},
	task::JoinHandle,
};

use crate::{
	models::{
		BalanceWatch, Direction, EVMLog, ExecutionRecord, NetworkEndpointSpec, ViewFunctionWatch,
	},
	services::{
		blockchain::ConnectionHandle,
		comparator::{read_balance, Fired, Observation, Snapshot, SnapshotValue, ViewFunctionReader},
		filter::{evm_helpers::h160_to_string, normalize},
		schedule::{skip_overlapping, TickFn},
		trigger::error::TriggerError,
	},
	utils::metrics::{DROPPED_LOGS_TOTAL, TICK_FAILURES_TOTAL},
};

/// Delivers a record for one trigger generation. Resolves to false when the
/// record was discarded.
pub type Emitter = Arc<dyn Fn(ExecutionRecord) -> BoxFuture<'static, bool> + Send + Sync>;

/// Spawns the task normalizing and emitting the logs of a subscription
pub fn spawn_log_forwarder(
	key: String,
	mut receiver: mpsc::UnboundedReceiver<EVMLog>,
	network: NetworkEndpointSpec,
	expected_topic_count: usize,
	emit: Emitter,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		while let Some(log) = receiver.recv().await {
			match normalize(&log, &network, expected_topic_count) {
				Some(record) => {
					emit(record).await;
				}
				None => {
					DROPPED_LOGS_TOTAL.inc();
					tracing::debug!(
						trigger_key = %key,
						topics = log.topics.len(),
						expected = expected_topic_count,
						"Dropping log that does not fit the watch"
					);
				}
			}
		}
		tracing::debug!(trigger_key = %key, "Log subscription closed");
	})
}

/// Builds a tick reading a value, comparing it to the last read and emitting on a fire
fn polling_tick<V, R, B>(
	key: String,
	watch_kind: &'static str,
	direction: Direction,
	read: R,
	build: B,
	emit: Emitter,
) -> TickFn
where
	V: Observation,
	R: Fn() -> BoxFuture<'static, Result<V, TriggerError>> + Send + Sync + 'static,
	B: Fn(&Fired<V>) -> ExecutionRecord + Send + Sync + 'static,
{
	let snapshot = Arc::new(Mutex::new(Snapshot::<V>::new()));
	let read = Arc::new(read);
	let build = Arc::new(build);

	let tick: TickFn = Arc::new(move || {
		let snapshot = snapshot.clone();
		let read = read.clone();
		let build = build.clone();
		let emit = emit.clone();
		let key = key.clone();
		Box::pin(async move {
			let mut snapshot = snapshot.lock().await;
			match snapshot.evaluate(read().await, direction) {
				Ok(Some(fired)) => {
					tracing::debug!(trigger_key = %key, watch = watch_kind, "Value changed");
					emit(build(&fired)).await;
				}
				Ok(None) => {}
				Err(e @ TriggerError::DecodeError(_)) => {
					TICK_FAILURES_TOTAL
						.with_label_values(&[watch_kind, "decode"])
						.inc();
					tracing::debug!(trigger_key = %key, watch = watch_kind, "Tick skipped: {}", e);
				}
				Err(e) => {
					TICK_FAILURES_TOTAL
						.with_label_values(&[watch_kind, "connectivity"])
						.inc();
					tracing::warn!(trigger_key = %key, watch = watch_kind, "Tick skipped: {}", e);
				}
			}
		})
	});

	skip_overlapping(watch_kind, tick)
}

/// Tick for a native balance watch
pub fn balance_tick(
	key: String,
	connection: ConnectionHandle,
	watch: &BalanceWatch,
	network: NetworkEndpointSpec,
	emit: Emitter,
) -> TickFn {
	let address = watch.address;
	polling_tick(
		key,
		"balance",
		watch.direction,
		move || {
			let connection = connection.clone();
			Box::pin(async move { read_balance(connection.as_ref(), address).await })
		},
		move |fired| balance_record(address, &network, fired, Utc::now()),
		emit,
	)
}

/// Tick for a contract view function watch
pub fn view_tick(
	key: String,
	connection: ConnectionHandle,
	reader: ViewFunctionReader,
	watch: &ViewFunctionWatch,
	network: NetworkEndpointSpec,
	emit: Emitter,
) -> TickFn {
	let contract = watch.contract_address;
	let function = reader.function_name().to_string();
	let reader = Arc::new(reader);
	polling_tick(
		key,
		"view_function",
		watch.direction,
		move || {
			let connection = connection.clone();
			let reader = reader.clone();
			Box::pin(async move { reader.read(connection.as_ref()).await })
		},
		move |fired| view_record(contract, &function, &network, fired, Utc::now()),
		emit,
	)
}

/// Tick for a time schedule watch
pub fn schedule_tick(emit: Emitter) -> TickFn {
	let tick: TickFn = Arc::new(move || {
		let emit = emit.clone();
		Box::pin(async move {
			emit(schedule_record(Utc::now())).await;
		})
	});
	skip_overlapping("schedule", tick)
}

pub fn balance_record(
	address: Address,
	network: &NetworkEndpointSpec,
	fired: &Fired<U256>,
	at: DateTime<Utc>,
) -> ExecutionRecord {
	ExecutionRecord::builder()
		.field("address", h160_to_string(address))
		.field("network", network.network.clone())
		.field("chainId", network.chain_id)
		.field("currency", network.currency.clone())
		.field("previousBalance", fired.previous.to_string())
		.field("currentBalance", fired.current.to_string())
		.field("previousBalanceFormatted", format_ether(fired.previous))
		.field("currentBalanceFormatted", format_ether(fired.current))
		.optional_field("delta", fired.delta.clone())
		.field("timestamp", at.to_rfc3339())
		.build()
}

pub fn view_record(
	contract: Address,
	function: &str,
	network: &NetworkEndpointSpec,
	fired: &Fired<SnapshotValue>,
	at: DateTime<Utc>,
) -> ExecutionRecord {
	ExecutionRecord::builder()
		.field("contractAddress", h160_to_string(contract))
		.field("network", network.network.clone())
		.field("chainId", network.chain_id)
		.field("function", function)
		.field("previousValue", fired.previous.to_json())
		.field("currentValue", fired.current.to_json())
		.optional_field("delta", fired.delta.clone())
		.field("timestamp", at.to_rfc3339())
		.build()
}

/// Record emitted on every schedule tick. All fields are UTC.
pub fn schedule_record(at: DateTime<Utc>) -> ExecutionRecord {
	ExecutionRecord::builder()
		.field("timestamp", at.to_rfc3339())
		.field("date", at.format("%Y-%m-%d").to_string())
		.field("time", at.format("%H:%M:%S").to_string())
		.field("dayOfWeek", at.format("%A").to_string())
		.field("year", at.year())
		.field("month", at.month())
		.field("dayOfMonth", at.day())
		.field("hour", at.hour())
		.field("minute", at.minute())
		.field("second", at.second())
		.field("timezone", "UTC")
		.build()
}
