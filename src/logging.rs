use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "hyper-ide.log";

/// Keeps the background log writer alive; logs are flushed when dropped.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Filter directive for `level`. A bare level is scoped to this crate.
fn default_directive(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') {
        level.to_string()
    } else {
        format!("hyper_ide={}", level.to_ascii_lowercase())
    }
}

/// Install a daily-rolling file subscriber under `log_dir`.
///
/// The terminal is owned by the UI, so nothing is written to stdout.
/// `RUST_LOG` takes precedence over `level`. Returns `None` when the log
/// directory cannot be created or a subscriber is already installed.
pub fn init(level: &str, log_dir: PathBuf) -> Option<LoggingGuard> {
    let log_dir = std::fs::create_dir_all(&log_dir)
        .map(|_| log_dir)
        .or_else(|_| -> std::io::Result<PathBuf> {
            let dir = std::env::temp_dir().join("hyper-ide").join("logs");
            std::fs::create_dir_all(&dir)?;
            Ok(dir)
        })
        .ok()?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(level)))
        .unwrap_or_else(|_| EnvFilter::new("hyper_ide=info"));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true),
    );

    if subscriber.try_init().is_err() {
        return None;
    }

    tracing::info!(log_dir = %log_dir.display(), "logging initialized");

    Some(LoggingGuard { _guard: guard })
}
