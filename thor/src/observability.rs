//! Diagnostic logging setup.

use std::env;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Installs the global diagnostics subscriber.
///
/// Diagnostics go to stderr, so they never mix with the report on stdout.
pub fn init_tracing() {
    let (level, env_filter) = parse_rust_log();
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(format.with_filter(LevelFilter::from(level)))
        .with(env_filter)
        .init();
}

/// Derives the log level and filter directives from `RUST_LOG`.
///
/// A plain level such as `debug` enables that level for all of thor's own targets, while any other
/// value is used verbatim as filter directives. Without `RUST_LOG`, only warnings are logged.
pub fn parse_rust_log() -> (Level, EnvFilter) {
    parse_filter(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

fn parse_filter(rust_log: Option<&str>) -> (Level, EnvFilter) {
    // A bare level only raises or lowers thor's own diagnostics. Anything else is a full
    // directive list and wins over the built-in targets below.
    let level = match rust_log {
        Some(value) => match value.parse::<Level>() {
            Ok(level) => level,
            Err(_) => return (Level::TRACE, EnvFilter::new(value)),
        },
        None => Level::WARN,
    };

    // Per-target ceilings: thor may log everything, the HTTP stack only its warnings. The
    // stderr layer then cuts this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        hyper_util=WARN,\
        reqwest=WARN,\
        thor=TRACE,\
        ",
    );

    (level, env_filter)
}
