//! Logging initialization.
//!
//! Logs go to stderr through `tracing-subscriber`, either human-readable or
//! as JSON lines. `RUST_LOG` overrides the level when set.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global subscriber.
///
/// `verbose` selects DEBUG instead of INFO; `json_format` selects JSON lines.
pub fn init(verbose: bool, json_format: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize from the `Logging` config section, with CLI flags taking
/// precedence.
pub fn init_from_config(config: &pixstat_core::Config, verbose: bool, json_logs: bool) {
    let (verbose, json_format) = effective_settings(config, verbose, json_logs);
    init(verbose, json_format);
}

fn effective_settings(
    config: &pixstat_core::Config,
    verbose: bool,
    json_logs: bool,
) -> (bool, bool) {
    let level = config.logging.level.to_ascii_lowercase();
    let verbose = verbose || level == "debug" || level == "trace";
    let json_format = json_logs || config.logging.format.eq_ignore_ascii_case("json");
    (verbose, json_format)
}
