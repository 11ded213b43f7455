//! Scheduling records core
//!
//! Customers, appointments, addresses, cities, countries and users, each held
//! by observable models, validated as a graph of related records, saved on
//! tokio workers and announced through a synchronous event bus.

pub mod config;
pub mod context;
pub mod domain;
pub mod infra;

pub use config::AppConfig;
pub use context::CoreContext;

use anyhow::Result;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs console and daily-rolling file logging. `RUST_LOG` overrides the
/// configured level. Keep the returned guard alive to flush the file log.
pub fn init_logging(config: &AppConfig) -> Result<WorkerGuard> {
	config.ensure_directories()?;

	let (non_blocking, guard) =
		tracing_appender::non_blocking(rolling::daily(config.logs_dir(), "scheduler.log"));

	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&config.log_level))?;

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_target(false))
		.with(fmt::layer().with_writer(non_blocking).with_ansi(false))
		.try_init()?;

	Ok(guard)
}
