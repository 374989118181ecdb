//! Blockchain workflow trigger service entry point.
//!
//! This binary loads trigger configurations, starts each of them in a
//! trigger registry and logs every emitted execution record as JSON.
//!
//! # Flow
//! 1. Loads trigger configurations from the triggers directory
//! 2. Validates them and, with `--check`, exits after reporting
//! 3. Starts every trigger, logging the ones that fail to start
//! 4. Optionally serves Prometheus metrics
//! 5. Stops every trigger on Ctrl+C

pub mod bootstrap;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

use crate::{
	bootstrap::{
		check_triggers, create_registry, describe_schedule, initialize_services,
		register_log_listeners, start_triggers, Result,
	},
	repositories::TriggerRepository,
	services::emitter::ListenerBus,
	utils::{
		logging::setup_logging, metrics::server::create_metrics_server,
		parse_string_to_bytes_size, port_from_address,
	},
};

use clap::Parser;
use dotenvy::dotenv_override;
use std::env::{set_var, var};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_cron_scheduler::JobScheduler;
use tracing::{error, info};

#[derive(Parser)]
#[command(
	name = "chain-triggers",
	about = "Starts blockchain workflow triggers (logs, balances, view functions and schedules) and emits an execution record every time one fires.",
	version
)]
struct Cli {
	/// Write logs to file instead of stdout
	#[arg(long)]
	log_file: bool,

	/// Set log level (trace, debug, info, warn, error)
	#[arg(long, value_name = "LEVEL")]
	log_level: Option<String>,

	/// Path to store log files (default: logs/)
	#[arg(long, value_name = "PATH")]
	log_path: Option<String>,

	/// Maximum log file size before rolling (e.g., "1GB", "500MB", "1024KB")
	#[arg(long, value_name = "SIZE", value_parser = parse_string_to_bytes_size)]
	log_max_size: Option<u64>,

	/// Address to start the metrics server on (default: 127.0.0.1:8081)
	#[arg(long, value_name = "HOST:PORT")]
	metrics_address: Option<String>,

	/// Enable metrics server
	#[arg(long)]
	metrics: bool,

	/// Directory holding the trigger configuration files (default: config/triggers)
	#[arg(long, value_name = "PATH")]
	triggers_path: Option<PathBuf>,

	/// Provider settings file (default: config/settings.json)
	#[arg(long, value_name = "PATH")]
	settings_path: Option<PathBuf>,

	/// Validate trigger configurations without starting them
	#[arg(long)]
	check: bool,
}

impl Cli {
	/// Apply CLI options to environment variables, overriding any existing values
	fn apply_to_env(&self) {
		// Values from .env override the inherited environment
		dotenv_override().ok();

		if self.log_file {
			set_var("LOG_MODE", "file");
		}

		if let Ok(level) = var("RUST_LOG") {
			set_var("LOG_LEVEL", level);
		}

		if let Some(level) = &self.log_level {
			set_var("LOG_LEVEL", level);
			set_var("RUST_LOG", level);
		}

		if let Some(path) = &self.log_path {
			set_var("LOG_DATA_DIR", path);
		}

		if let Some(max_size) = &self.log_max_size {
			set_var("LOG_MAX_SIZE", max_size.to_string());
		}

		if self.metrics {
			set_var("METRICS_ENABLED", "true");
		}

		if let Some(address) = &self.metrics_address {
			if let Some(port) = port_from_address(address) {
				set_var("METRICS_PORT", port.to_string());
			}
		}
	}
}

/// Main entry point for the trigger service.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or the registry cannot be built.
#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	cli.apply_to_env();

	setup_logging().unwrap_or_else(|e| {
		eprintln!("Failed to setup logging: {}", e);
	});

	let (trigger_service, settings) = initialize_services::<TriggerRepository>(
		None,
		cli.triggers_path.as_deref(),
		cli.settings_path.as_deref(),
	)
	.await
	.map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
	let triggers = trigger_service.get_all();

	if cli.check {
		validate_configuration(&trigger_service.keys(), &triggers);
		return Ok(());
	}

	if triggers.is_empty() {
		info!("No triggers configured. Exiting...");
		return Ok(());
	}

	let metrics_enabled =
		cli.metrics || var("METRICS_ENABLED").map(|v| v == "true").unwrap_or(false);
	let metrics_address = cli
		.metrics_address
		.clone()
		.unwrap_or_else(|| "127.0.0.1:8081".to_string());

	let metrics_server = if metrics_enabled {
		info!("Metrics server enabled, starting on {}", metrics_address);
		match create_metrics_server(metrics_address) {
			Ok(server) => Some(server),
			Err(e) => {
				error!("Failed to create metrics server: {}", e);
				None
			}
		}
	} else {
		info!("Metrics server disabled. Use --metrics flag or METRICS_ENABLED=true to enable");
		None
	};

	let bus = Arc::new(ListenerBus::new());
	register_log_listeners(&bus, triggers.keys());

	let registry = create_registry::<JobScheduler>(settings, bus).await?;
	let summary = start_triggers(&registry, &triggers).await;
	info!(
		started = summary.started,
		failed = summary.failed,
		"Service started. Press Ctrl+C to shutdown"
	);

	let ctrl_c = tokio::signal::ctrl_c();

	if let Some(metrics_future) = metrics_server {
		tokio::select! {
			result = ctrl_c => {
				if let Err(e) = result {
					error!("Error waiting for Ctrl+C: {}", e);
				}
				info!("Shutdown signal received, stopping triggers...");
			}
			result = metrics_future => {
				if let Err(e) = result {
					error!("Metrics server error: {}", e);
				}
				info!("Metrics server stopped, stopping triggers...");
			}
		}
	} else {
		let _ = ctrl_c.await;
		info!("Shutdown signal received, stopping triggers...");
	}

	if let Err(e) = registry.shutdown().await {
		error!("Error during shutdown: {}", e);
	}

	info!("Shutdown complete");
	Ok(())
}

/// Reports the validation result of every loaded trigger
fn validate_configuration(
	keys: &[String],
	triggers: &std::collections::HashMap<String, models::TriggerConfig>,
) {
	info!("Validating trigger configurations...");

	if keys.is_empty() {
		error!("No triggers found in the triggers directory");
		return;
	}

	let failures = check_triggers(triggers);
	for key in keys {
		match failures.iter().find(|(failed, _)| failed == key) {
			Some((_, e)) => error!("✗ {}: {}", key, e),
			None => match describe_schedule(&triggers[key]) {
				Some(schedule) => info!("✓ {} [{}] {}", key, triggers[key].watch.kind(), schedule),
				None => info!("✓ {} [{}]", key, triggers[key].watch.kind()),
			},
		}
	}

	if failures.is_empty() {
		info!("Configuration validation completed successfully!");
	} else {
		error!("{} of {} trigger(s) are invalid", failures.len(), keys.len());
	}
}
