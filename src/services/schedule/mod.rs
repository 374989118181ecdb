//! Cron schedule building and job scheduling.
//!
//! Converts polling intervals, calendar rules and raw cron expressions into
//! six-field UTC cron expressions, and abstracts the scheduler that runs them.

mod builder;
mod error;
mod scheduler;

pub use builder::{from_calendar, from_poll_interval, resolve};
pub use error::ScheduleError;
pub use scheduler::{skip_overlapping, JobSchedulerTrait, TickFn};
