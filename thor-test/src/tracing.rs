use tracing_subscriber::EnvFilter;

const CRATE_NAMES: &[&str] = &["thor", "thor_test"];

/// Initialize the logger for testing.
///
/// This logs to the stdout registered by the Rust test runner. By default, only logs from thor's
/// own crates are captured. Setting `RUST_LOG` replaces these defaults, for example to inspect the
/// HTTP client with `RUST_LOG=reqwest=trace`.
///
/// Calling this more than once is harmless.
///
/// # Example
///
/// ```
/// thor_test::tracing::init();
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());

    tracing_subscriber::fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}

fn default_filter() -> EnvFilter {
    CRATE_NAMES
        .iter()
        .fold(EnvFilter::new("ERROR"), |filter, name| {
            match format!("{name}=TRACE").parse() {
                Ok(directive) => filter.add_directive(directive),
                Err(_) => filter,
            }
        })
}
