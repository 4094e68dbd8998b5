use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AuthConfig;

/// Install the global subscriber: a rolling file writer plus, for text
/// output, a colored stdout layer.
///
/// Keep the returned guard alive for the lifetime of the process or buffered
/// file output is lost.
pub fn init_logging(config: &AuthConfig) -> WorkerGuard {
    let appender = RollingFileAppender::new(
        rotation(&config.rotation),
        &config.log_dir,
        &config.log_file,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // RUST_LOG wins
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
        return guard;
    }

    let file_layer = fmt::layer()
        .with_target(false)
        .with_writer(writer)
        .with_ansi(false);
    let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
    registry.with(file_layer).with(stdout_layer).init();

    guard
}

/// Unknown values mean a single, never-rotated file.
fn rotation(name: &str) -> Rotation {
    match name.trim().to_ascii_lowercase().as_str() {
        "minutely" => Rotation::MINUTELY,
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    }
}

/// The configured level applies to this crate; dependencies stay at `warn`
/// unless the level is stricter.
fn filter_directive(config: &AuthConfig) -> String {
    let level = config.log_level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" => format!("warn,dual_auth={level}"),
        _ => level,
    }
}
