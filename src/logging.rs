//! Tracing setup: rolling log file plus stdout, filtered per crate.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;

/// Dependencies that log at `info` on every request or statement.
const QUIET_TARGETS: &[&str] = &["sqlx", "hyper", "tower", "tract_core", "tract_onnx"];

/// Default directive: this crate at the configured level, its dependencies at
/// the same level except the chatty ones, which are held at `warn`.
pub fn default_directives(level: &str) -> String {
    let mut directives = format!("{level},{}={level}", env!("CARGO_CRATE_NAME"));
    for target in QUIET_TARGETS {
        directives.push_str(&format!(",{}=warn", target));
    }
    directives
}

fn rolling_appender(config: &AppConfig) -> RollingFileAppender {
    let dir = &config.log_dir;
    let file = &config.log_file;
    match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(dir, file),
        "daily" => tracing_appender::rolling::daily(dir, file),
        _ => tracing_appender::rolling::never(dir, file),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Keep the returned guard alive until shutdown or buffered file output is
/// lost.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let (file_writer, guard) = tracing_appender::non_blocking(rolling_appender(config));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(file_writer).with_ansi(false))
            .with(fmt::layer().with_target(false).with_ansi(true))
            .init();
    }

    tracing::debug!(
        "Logging to {}/{} (rotation: {})",
        config.log_dir,
        config.log_file,
        config.rotation
    );
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,spiral_screen=debug"));
        assert!(directives.contains("sqlx=warn"));
        assert!(directives.contains("tract_onnx=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
