//! Job scheduler abstraction.
//!
//! Polling and schedule watches register one job per cron expression. The
//! registry only depends on [`JobSchedulerTrait`], so tests can drive ticks by
//! hand instead of waiting for wall-clock time.

use futures::future::BoxFuture;
use std::sync::{
	atomic::{AtomicBool, Ordering},
	Arc,
};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::utils::metrics::SKIPPED_TICKS_TOTAL;

/// Work run on every tick of a job
pub type TickFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Trait for job scheduler
///
/// This trait is used to abstract the job scheduler implementation. Jobs are
/// identified by the id returned from [`JobSchedulerTrait::add`].
#[async_trait::async_trait]
pub trait JobSchedulerTrait: Send + Sync + Sized + 'static {
	async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>>;
	async fn add(
		&self,
		expression: &str,
		tick: TickFn,
	) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>>;
	async fn remove(&self, id: &Uuid) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
	async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
	async fn shutdown(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Implementation of the job scheduler trait for the JobScheduler struct
#[async_trait::async_trait]
impl JobSchedulerTrait for JobScheduler {
	async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
		Self::new().await.map_err(Into::into)
	}

	async fn add(
		&self,
		expression: &str,
		tick: TickFn,
	) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>> {
		let job = Job::new_async(expression, move |_uuid, _l| tick())?;
		JobScheduler::add(self, job).await.map_err(Into::into)
	}

	async fn remove(&self, id: &Uuid) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		JobScheduler::remove(self, id).await.map_err(Into::into)
	}

	async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		JobScheduler::start(self).await.map_err(Into::into)
	}

	async fn shutdown(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
		let mut scheduler = self.clone();
		scheduler.shutdown().await.map_err(Into::into)
	}
}

/// Clears the in-flight flag when a tick finishes, even if it panicked
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
	fn drop(&mut self) {
		self.0.store(false, Ordering::SeqCst);
	}
}

/// Wraps a tick so a new tick is skipped while the previous one is still running
///
/// # Arguments
/// * `watch_kind` - Metric label for skipped ticks
/// * `tick` - The work to guard
pub fn skip_overlapping(watch_kind: &'static str, tick: TickFn) -> TickFn {
	let in_flight = Arc::new(AtomicBool::new(false));

	Arc::new(move || {
		let tick = tick.clone();
		let in_flight = in_flight.clone();
		Box::pin(async move {
			if in_flight.swap(true, Ordering::SeqCst) {
				tracing::debug!(watch = watch_kind, "Previous tick still running, skipping");
				SKIPPED_TICKS_TOTAL.with_label_values(&[watch_kind]).inc();
				return;
			}
			let _guard = InFlight(in_flight);
			tick().await;
		})
	})
}
