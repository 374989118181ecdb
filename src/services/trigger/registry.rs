//! Trigger lifecycle registry.
//!
//! Keeps at most one live trigger per key. Starting a trigger builds its
//! resources (connection, log subscription, scheduled jobs) outside the lock
//! and registers them only if the key was not stopped in the meantime.
//! Emissions are checked against the generation of the live entry while
//! holding the read lock, and `stop` evicts under the write lock, so once
//! `stop` returns nothing more is emitted for the key.

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};
use tokio::{sync::RwLock, task::JoinHandle};
use tracing::instrument;
use uuid::Uuid;

use crate::{
	models::{ExecutionRecord, ScheduleSpec, ScheduleWatch, TriggerConfig, WatchSpec},
	services::{
		blockchain::{
			BlockChainError, ConnectionFactory, ConnectionHandle, ConnectionRequest, LogSubscription,
		},
		catalog,
		comparator::ViewFunctionReader,
		emitter::EmissionSink,
		filter::build_filter,
		schedule::{self, JobSchedulerTrait, TickFn},
		trigger::{
			error::TriggerError,
			validation::validate_trigger_config,
			watchers::{
				balance_tick, schedule_tick, spawn_log_forwarder, view_tick, Emitter,
			},
		},
	},
	utils::metrics::{trigger_started, trigger_stopped, EMISSIONS_TOTAL},
};

/// Result of a successful [`TriggerRegistry::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
	/// A new trigger is live
	Started,
	/// An identical log watch was already live under the key
	AlreadyRunning,
	/// The jobs of a schedule watch were added to the live schedule trigger
	JobsAppended,
}

struct Lease {
	request: ConnectionRequest,
	handle: ConnectionHandle,
}

struct ActiveSubscription {
	id: String,
	forwarder: JoinHandle<()>,
}

/// Everything a live trigger owns. A trigger has a subscription or jobs, never both.
#[derive(Default)]
struct TriggerResources {
	connection: Option<Lease>,
	subscription: Option<ActiveSubscription>,
	jobs: Vec<Uuid>,
}

struct TriggerEntry {
	generation: u64,
	config: TriggerConfig,
	/// `None` while the trigger is starting
	resources: Option<TriggerResources>,
}

/// Live entries and the sink records are delivered to
struct EmissionGate<S> {
	entries: RwLock<HashMap<String, TriggerEntry>>,
	sink: Arc<S>,
}

impl<S: EmissionSink> EmissionGate<S> {
	async fn emit(
		&self,
		key: &str,
		generation: u64,
		watch_kind: &'static str,
		record: ExecutionRecord,
	) -> bool {
		let entries = self.entries.read().await;
		match entries.get(key) {
			Some(entry) if entry.generation == generation => {
				let delivered = self.sink.emit(key, record);
				if delivered {
					EMISSIONS_TOTAL.with_label_values(&[watch_kind]).inc();
				}
				delivered
			}
			_ => {
				tracing::debug!(trigger_key = %key, generation, "Discarding record of stopped trigger");
				false
			}
		}
	}
}

enum Admission {
	Fresh(u64),
	Identical,
	Append(u64, ScheduleWatch),
	Duplicate,
}

fn key_metadata(key: &str) -> Option<HashMap<String, String>> {
	Some(HashMap::from([("trigger_key".to_string(), key.to_string())]))
}

fn connect_error(error: BlockChainError, key: &str) -> TriggerError {
	let msg = format!("Failed to connect provider: {}", error);
	if error.is_configuration() {
		TriggerError::configuration_error(msg, Some(error.into()), key_metadata(key))
	} else {
		TriggerError::connectivity_error(msg, Some(error.into()), key_metadata(key))
	}
}

/// Keyed start/stop manager for triggers
pub struct TriggerRegistry<F, J, S> {
	factory: F,
	scheduler: J,
	gate: Arc<EmissionGate<S>>,
	next_generation: AtomicU64,
}

impl<F, J, S> TriggerRegistry<F, J, S>
where
	F: ConnectionFactory,
	J: JobSchedulerTrait,
	S: EmissionSink + 'static,
{
	/// Creates a registry and starts its scheduler
	///
	/// # Arguments
	/// * `factory` - Builds the connections of triggers that need one
	/// * `scheduler` - Runs polling and schedule jobs
	/// * `sink` - Receives every emitted record
	pub async fn new(factory: F, scheduler: J, sink: Arc<S>) -> Result<Self, TriggerError> {
		scheduler.start().await.map_err(|e| {
			TriggerError::scheduler_error("Failed to start scheduler", Some(e), None)
		})?;

		Ok(Self {
			factory,
			scheduler,
			gate: Arc::new(EmissionGate {
				entries: RwLock::new(HashMap::new()),
				sink,
			}),
			next_generation: AtomicU64::new(1),
		})
	}

	pub fn factory(&self) -> &F {
		&self.factory
	}

	pub fn scheduler(&self) -> &J {
		&self.scheduler
	}

	pub fn sink(&self) -> &Arc<S> {
		&self.gate.sink
	}

	/// Starts the trigger described by `config` under `key`.
	///
	/// An identical log watch already live under the key is left running. A
	/// schedule watch started on a live schedule key adds its jobs to it. Any
	/// other start on a live key is rejected; use [`TriggerRegistry::restart`]
	/// to replace a trigger.
	///
	/// # Errors
	/// - `ConfigurationError` when the configuration cannot be started
	/// - `ConnectivityError` when the provider could not be reached
	/// - `DuplicateTrigger` when another trigger is live under the key. This
	///   includes a schedule start racing a first schedule start of the same
	///   key that has not finished registering its jobs; retrying once that
	///   start returns appends instead.
	/// - `Cancelled` when the key was stopped before the start completed
	#[instrument(skip_all, fields(trigger_key = %key, watch = config.watch.kind()))]
	pub async fn start(
		&self,
		key: &str,
		mut config: TriggerConfig,
	) -> Result<StartOutcome, TriggerError> {
		config.trigger_key = key.to_string();
		if let Err(e) = validate_trigger_config(&config) {
			tracing::error!("Rejected trigger configuration: {}", e);
			return Err(e);
		}

		let admission = {
			let mut entries = self.gate.entries.write().await;
			match entries.get(key) {
				None => {
					let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
					entries.insert(
						key.to_string(),
						TriggerEntry {
							generation,
							config: config.clone(),
							resources: None,
						},
					);
					Admission::Fresh(generation)
				}
				Some(existing) => match (&existing.config.watch, &config.watch) {
					(WatchSpec::Log(_), WatchSpec::Log(_)) if existing.config == config => {
						Admission::Identical
					}
					(WatchSpec::Schedule(_), WatchSpec::Schedule(watch))
						if existing.resources.is_some() =>
					{
						Admission::Append(existing.generation, watch.clone())
					}
					_ => Admission::Duplicate,
				},
			}
		};

		match admission {
			Admission::Identical => {
				tracing::debug!("Identical log watch already live");
				Ok(StartOutcome::AlreadyRunning)
			}
			Admission::Duplicate => Err(TriggerError::duplicate_trigger(
				format!("Trigger '{}' is already live", key),
				None,
				key_metadata(key),
			)),
			Admission::Append(generation, watch) => {
				self.append_jobs(key, generation, &watch).await
			}
			Admission::Fresh(generation) => match self.build(key, generation, &config).await {
				Ok(resources) => {
					self.activate(key, generation, config.watch.kind(), resources)
						.await
				}
				Err(e) => {
					self.evict_starting(key, generation).await;
					Err(e)
				}
			},
		}
	}

	/// Replaces the trigger under `key`. The emission listener is kept.
	///
	/// Removal and start are separate steps. A concurrent start that claims the
	/// key in between wins, and this call then fails with `DuplicateTrigger`.
	///
	/// # Errors
	/// Same as [`TriggerRegistry::start`].
	pub async fn restart(
		&self,
		key: &str,
		config: TriggerConfig,
	) -> Result<StartOutcome, TriggerError> {
		self.remove(key, false).await;
		self.start(key, config).await
	}

	/// Stops the trigger under `key` and releases everything it holds.
	///
	/// Unknown keys are ignored. Once this returns no further record is
	/// emitted for the key.
	#[instrument(skip(self))]
	pub async fn stop(&self, key: &str) {
		self.remove(key, true).await;
	}

	/// Returns true when a started trigger is live under `key`
	pub async fn is_active(&self, key: &str) -> bool {
		self.gate
			.entries
			.read()
			.await
			.get(key)
			.map(|entry| entry.resources.is_some())
			.unwrap_or(false)
	}

	/// Keys of every live trigger, sorted
	pub async fn active_keys(&self) -> Vec<String> {
		let entries = self.gate.entries.read().await;
		let mut keys: Vec<String> = entries
			.iter()
			.filter(|(_, entry)| entry.resources.is_some())
			.map(|(key, _)| key.clone())
			.collect();
		keys.sort();
		keys
	}

	/// Stops every trigger, then the scheduler
	pub async fn shutdown(&self) -> Result<(), TriggerError> {
		let keys: Vec<String> = self.gate.entries.read().await.keys().cloned().collect();
		for key in keys {
			self.stop(&key).await;
		}

		self.scheduler.shutdown().await.map_err(|e| {
			TriggerError::scheduler_error("Failed to shut down scheduler", Some(e), None)
		})
	}

	fn emitter(&self, key: &str, generation: u64, watch_kind: &'static str) -> Emitter {
		let gate = self.gate.clone();
		let key = key.to_string();
		Arc::new(move |record| {
			let gate = gate.clone();
			let key = key.clone();
			Box::pin(async move { gate.emit(&key, generation, watch_kind, record).await })
		})
	}

	/// Builds the resources of a trigger. Partially built resources are torn
	/// down on failure.
	async fn build(
		&self,
		key: &str,
		generation: u64,
		config: &TriggerConfig,
	) -> Result<TriggerResources, TriggerError> {
		let mut resources = TriggerResources::default();

		if config.watch.needs_connection() {
			let request = ConnectionRequest::from_config(config);
			let handle = self
				.factory
				.connect(&request)
				.await
				.map_err(|e| connect_error(e, key))?;
			resources.connection = Some(Lease { request, handle });
		}

		match self.attach(key, generation, config, &mut resources).await {
			Ok(()) => Ok(resources),
			Err(e) => {
				self.teardown(resources).await;
				Err(e)
			}
		}
	}

	async fn attach(
		&self,
		key: &str,
		generation: u64,
		config: &TriggerConfig,
		resources: &mut TriggerResources,
	) -> Result<(), TriggerError> {
		let network = catalog::endpoint_spec(&config.network, config.provider_kind)
			.ok_or_else(|| {
				TriggerError::configuration_error(
					format!("Unknown network '{}'", config.network),
					None,
					key_metadata(key),
				)
			})?;
		let connection = resources
			.connection
			.as_ref()
			.map(|lease| lease.handle.clone());
		let emit = self.emitter(key, generation, config.watch.kind());

		let tick = match &config.watch {
			WatchSpec::Log(watch) => {
				let connection = require_connection(connection, key)?;
				let filter = build_filter(watch.direction, watch.counterparty, watch.contract_address)
					.map_err(|e| {
						TriggerError::configuration_error(
							"Invalid log filter",
							Some(e.into()),
							key_metadata(key),
						)
					})?
					.with_topic(0, watch.topic0);

				let LogSubscription { id, receiver } =
					connection.subscribe_logs(&filter).await.map_err(|e| {
						TriggerError::connectivity_error(
							"Failed to subscribe to logs",
							Some(e.into()),
							key_metadata(key),
						)
					})?;
				let forwarder = spawn_log_forwarder(
					key.to_string(),
					receiver,
					network,
					watch.expected_topic_count,
					emit,
				);
				resources.subscription = Some(ActiveSubscription { id, forwarder });
				return Ok(());
			}
			WatchSpec::Balance(watch) => balance_tick(
				key.to_string(),
				require_connection(connection, key)?,
				watch,
				network,
				emit,
			),
			WatchSpec::ViewFunction(watch) => {
				let reader = ViewFunctionReader::new(watch).map_err(|e| {
					TriggerError::configuration_error(
						"Invalid view call",
						Some(e.into()),
						key_metadata(key),
					)
				})?;
				view_tick(
					key.to_string(),
					require_connection(connection, key)?,
					reader,
					watch,
					network,
					emit,
				)
			}
			WatchSpec::Schedule(_) => schedule_tick(emit),
		};

		let spec = config.watch.schedule().cloned().unwrap_or_default();
		self.add_jobs(key, &spec, tick, &mut resources.jobs).await
	}

	/// Adds one job per expression of the schedule, recording each id as it is added
	async fn add_jobs(
		&self,
		key: &str,
		spec: &ScheduleSpec,
		tick: TickFn,
		jobs: &mut Vec<Uuid>,
	) -> Result<(), TriggerError> {
		let expressions = schedule::resolve(spec).map_err(|e| {
			TriggerError::configuration_error("Invalid schedule", Some(e.into()), key_metadata(key))
		})?;

		for expression in expressions {
			let id = self
				.scheduler
				.add(&expression, tick.clone())
				.await
				.map_err(|e| {
					TriggerError::scheduler_error(
						format!("Failed to schedule '{}'", expression),
						Some(e),
						key_metadata(key),
					)
				})?;
			tracing::debug!(trigger_key = %key, %expression, job_id = %id, "Job scheduled");
			jobs.push(id);
		}
		Ok(())
	}

	async fn append_jobs(
		&self,
		key: &str,
		generation: u64,
		watch: &ScheduleWatch,
	) -> Result<StartOutcome, TriggerError> {
		let tick = schedule_tick(self.emitter(key, generation, "schedule"));
		let mut jobs = Vec::new();
		if let Err(e) = self.add_jobs(key, &watch.schedule, tick, &mut jobs).await {
			self.remove_jobs(&jobs).await;
			return Err(e);
		}

		{
			let mut entries = self.gate.entries.write().await;
			if let Some(resources) = entries
				.get_mut(key)
				.filter(|entry| entry.generation == generation)
				.and_then(|entry| entry.resources.as_mut())
			{
				resources.jobs.extend(jobs);
				tracing::info!(trigger_key = %key, "Schedule jobs appended");
				return Ok(StartOutcome::JobsAppended);
			}
		}

		self.remove_jobs(&jobs).await;
		Err(TriggerError::cancelled(
			format!("Trigger '{}' was stopped while adding jobs", key),
			None,
			key_metadata(key),
		))
	}

	/// Registers built resources, or tears them down if the key was stopped meanwhile
	async fn activate(
		&self,
		key: &str,
		generation: u64,
		watch_kind: &'static str,
		resources: TriggerResources,
	) -> Result<StartOutcome, TriggerError> {
		{
			let mut entries = self.gate.entries.write().await;
			if let Some(entry) = entries
				.get_mut(key)
				.filter(|entry| entry.generation == generation)
			{
				entry.resources = Some(resources);
				trigger_started(watch_kind);
				tracing::info!(trigger_key = %key, watch = watch_kind, "Trigger started");
				return Ok(StartOutcome::Started);
			}
		}

		self.teardown(resources).await;
		Err(TriggerError::cancelled(
			format!("Trigger '{}' was stopped while starting", key),
			None,
			key_metadata(key),
		))
	}

	/// Drops the placeholder of a start that failed, unless a newer start replaced it
	async fn evict_starting(&self, key: &str, generation: u64) {
		let mut entries = self.gate.entries.write().await;
		if entries
			.get(key)
			.is_some_and(|entry| entry.generation == generation)
		{
			entries.remove(key);
		}
	}

	async fn remove(&self, key: &str, remove_listener: bool) -> bool {
		let entry = {
			let mut entries = self.gate.entries.write().await;
			let entry = entries.remove(key);
			if entry.is_some() && remove_listener {
				self.gate.sink.off(key);
			}
			entry
		};

		let Some(entry) = entry else {
			tracing::debug!(trigger_key = %key, "No trigger under key");
			return false;
		};

		if let Some(resources) = entry.resources {
			self.teardown(resources).await;
			trigger_stopped(entry.config.watch.kind());
		}
		tracing::info!(trigger_key = %key, "Trigger stopped");
		true
	}

	async fn remove_jobs(&self, jobs: &[Uuid]) {
		for job in jobs {
			if let Err(e) = self.scheduler.remove(job).await {
				tracing::warn!(job_id = %job, "Failed to remove job: {}", e);
			}
		}
	}

	async fn teardown(&self, resources: TriggerResources) {
		let TriggerResources {
			connection,
			subscription,
			jobs,
		} = resources;

		if let Some(subscription) = subscription {
			subscription.forwarder.abort();
			if let Some(lease) = &connection {
				if let Err(e) = lease.handle.unsubscribe(&subscription.id).await {
					tracing::warn!(subscription_id = %subscription.id, "Failed to unsubscribe: {:#}", e);
				}
			}
		}
		self.remove_jobs(&jobs).await;
		if let Some(lease) = connection {
			drop(lease.handle);
			self.factory.release(&lease.request).await;
		}
	}
}

fn require_connection(
	connection: Option<ConnectionHandle>,
	key: &str,
) -> Result<ConnectionHandle, TriggerError> {
	connection.ok_or_else(|| {
		TriggerError::Other(anyhow::anyhow!(
			"watch of trigger '{}' requires a connection",
			key
		))
	})
}
