//! Tracing setup shared by the cxref binaries.

use crate::config::{LOG_FILTER_ENV, default_root};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// cxref crates log at `info`, everything else only warns.
pub const DEFAULT_DIRECTIVES: &str = "warn,cxref_core=info,cxref_cli=info";

/// Filter from `CXREF_LOG`, falling back to [`DEFAULT_DIRECTIVES`].
pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Log to `~/.cxref/logs/<component>.log.<date>`, and to stderr as well when
/// `to_stderr` is set. Keep the guard alive until exit so the file writer
/// flushes.
pub fn init_logging(component: &str, to_stderr: bool) -> WorkerGuard {
    let log_dir = default_root().join("logs");
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::daily(&log_dir, format!("{}.log", component));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let registry = tracing_subscriber::registry()
        .with(log_filter())
        .with(file_layer);

    // Second init in one process (tests, embedding) keeps the first subscriber.
    let installed = if to_stderr {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);
        registry.with(stderr_layer).try_init()
    } else {
        registry.try_init()
    };
    if installed.is_err() {
        tracing::debug!("Logging already initialised; {} keeps the existing subscriber", component);
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        let filter = EnvFilter::try_new(DEFAULT_DIRECTIVES).unwrap();
        let text = filter.to_string();
        assert!(text.contains("cxref_core=info"));
        assert!(text.contains("warn"));
    }
}
