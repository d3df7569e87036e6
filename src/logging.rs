//! Tracing subscriber setup.
//!
//! A full aggregation run is usually unattended (cron or CI), so log output
//! can be redirected to daily rolling files under the configured directory.
//! The default sink is stdout, filtered through `RUST_LOG` with `info` as
//! the floor.

use crate::config::Config;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber.
///
/// With `log_to_file` set, events go through a non-blocking daily appender
/// named `openpoc.log.<date>`; the returned guard must stay alive until the
/// process exits or the tail of the run is never flushed. On stdout there is
/// nothing to flush and the guard is `None`.
pub fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if config.log_to_file {
        let appender = rolling::daily(&config.log_dir, "openpoc.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .init();

        Some(guard)
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();

        None
    }
}
