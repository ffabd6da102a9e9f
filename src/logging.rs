use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

/// Initializes the global `tracing` subscriber: an `EnvFilter` seeded from
/// `config.log_level`, stdout always, plus a non-blocking rolling file
/// writer under `config.log_directory` when `log_file_enabled`. The
/// returned guard must be held for the process lifetime, dropping it
/// stops the background flush thread.
pub fn init(config: &AppConfig) -> WorkerGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let file_appender = if config.log_file_enabled {
        std::fs::create_dir_all(&config.log_directory).ok();
        tracing_appender::rolling::daily(&config.log_directory, &config.log_filename)
    } else {
        tracing_appender::rolling::never(&config.log_directory, &config.log_filename)
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = fmt::layer().with_target(true);
    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);

    let registry = tracing_subscriber::registry().with(filter).with(stdout_layer);

    if config.log_file_enabled {
        registry.with(file_layer).init();
    } else {
        registry.init();
    }

    guard
}
