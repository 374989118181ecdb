//! Metrics module for the application.
//!
//! - This module contains the global Prometheus registry.
//! - Defines the trigger lifecycle and polling metrics.

pub mod server;
use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

lazy_static! {
	/// Global Prometheus registry.
	///
	/// This registry holds all metrics defined in this module and is used
	/// to gather metrics for exposure via the metrics endpoint.
	pub static ref REGISTRY: Registry = Registry::new();

	/// Gauge for the number of live triggers.
	pub static ref TRIGGERS_ACTIVE: Gauge = {
		let gauge = Gauge::new("triggers_active", "Number of live triggers").unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Gauge Vector for live triggers per watch kind.
	pub static ref TRIGGERS_BY_WATCH: GaugeVec = {
		let gauge = GaugeVec::new(
			Opts::new("triggers_by_watch", "Number of live triggers per watch kind"),
			&["watch"]
		).unwrap();
		REGISTRY.register(Box::new(gauge.clone())).unwrap();
		gauge
	};

	/// Counter Vector for execution records handed to the workflow engine.
	pub static ref EMISSIONS_TOTAL: CounterVec = {
		let counter = CounterVec::new(
			Opts::new("emissions_total", "Execution records emitted"),
			&["watch"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter Vector for polling ticks whose read failed.
	///
	/// Labelled by watch kind and failure reason (`connectivity` or `decode`).
	pub static ref TICK_FAILURES_TOTAL: CounterVec = {
		let counter = CounterVec::new(
			Opts::new("tick_failures_total", "Polling ticks whose read failed"),
			&["watch", "reason"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter Vector for ticks skipped because the previous tick was still running.
	pub static ref SKIPPED_TICKS_TOTAL: CounterVec = {
		let counter = CounterVec::new(
			Opts::new("skipped_ticks_total", "Ticks skipped while the previous tick was in flight"),
			&["watch"]
		).unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};

	/// Counter for logs that matched a filter but could not be normalized.
	pub static ref DROPPED_LOGS_TOTAL: Counter = {
		let counter = Counter::new("dropped_logs_total", "Matched logs dropped during normalization").unwrap();
		REGISTRY.register(Box::new(counter.clone())).unwrap();
		counter
	};
}

/// Gather all metrics and encode into the provided format.
pub fn gather_metrics() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
	let encoder = TextEncoder::new();
	let metric_families = REGISTRY.gather();
	let mut buffer = Vec::new();
	encoder.encode(&metric_families, &mut buffer)?;
	Ok(buffer)
}

/// Records a trigger becoming live
pub fn trigger_started(watch_kind: &str) {
	TRIGGERS_ACTIVE.inc();
	TRIGGERS_BY_WATCH.with_label_values(&[watch_kind]).inc();
}

/// Records a live trigger being stopped
pub fn trigger_stopped(watch_kind: &str) {
	TRIGGERS_ACTIVE.dec();
	TRIGGERS_BY_WATCH.with_label_values(&[watch_kind]).dec();
}
