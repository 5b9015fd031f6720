//! Command line entry point of the `thor` load generator.

use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    thor::cli::execute()
}
