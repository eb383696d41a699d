//! Logging setup
//!
//! tracing with an EnvFilter assembled from the configured level plus a
//! quiet-list for noisy targets (sqlx statement logging by default), written
//! to a rolling file and, in text mode, mirrored to stdout with ANSI colors.

use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Assemble the filter directive string: the base level, then each quiet
/// target demoted to warn so transfer-path logs stay readable under load.
fn filter_directives(level: &str, quiet_targets: &[String]) -> String {
    let mut directives = level.to_string();
    for target in quiet_targets {
        directives.push_str(&format!(",{}=warn", target));
    }
    directives
}

fn file_appender(config: &AppConfig) -> RollingFileAppender {
    match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    }
}

/// Install the global subscriber. The returned guard must stay alive for the
/// lifetime of the process or buffered file output is lost.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(config));

    // RUST_LOG wins over the configured directives when set
    let directives = filter_directives(&config.log_level, &config.log_quiet_targets);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(file_writer)
                    .with_ansi(false),
            )
            .with(fmt::layer().with_target(false).with_ansi(true))
            .init();
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_plain_level() {
        assert_eq!(filter_directives("info", &[]), "info");
        assert_eq!(filter_directives("debug", &[]), "debug");
    }

    #[test]
    fn test_filter_directives_demote_quiet_targets() {
        let quiet = vec!["sqlx::query".to_string(), "tower_http".to_string()];
        assert_eq!(
            filter_directives("info", &quiet),
            "info,sqlx::query=warn,tower_http=warn"
        );
    }
}
