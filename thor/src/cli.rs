//! Command line parsing and process bootstrap.

use std::env;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};

use crate::config::{Config, ConfigError};
use crate::error::Error;
use crate::report::StdoutReporter;
use crate::{dispatcher, observability};

/// Issue concurrent HTTP GET requests against a URL and report their latency.
#[derive(Debug, FromArgs)]
#[argh(help_triggers("-h", "--help"))]
pub struct Args {
    /// number of parallel processes issuing requests (default 1)
    #[argh(option, short = 'p', default = "1")]
    pub processes: usize,

    /// number of requests per process (default 1)
    #[argh(option, short = 'r', default = "1")]
    pub requests: usize,

    /// print the response body of every request
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// print latency percentiles after the total average
    #[argh(switch, short = 's')]
    pub summary: bool,

    /// the URL to send requests to
    #[argh(positional)]
    pub url: String,
}

impl Args {
    /// Validates the arguments and converts them into a [`Config`].
    pub fn into_config(self) -> Result<Config, ConfigError> {
        Config::builder(self.url)
            .workers(self.processes)
            .requests(self.requests)
            .verbose(self.verbose)
            .summary(self.summary)
            .build()
    }
}

/// What to do after parsing the command line.
#[derive(Debug)]
pub enum Invocation {
    /// Run a load test with the given configuration.
    Run(Config),
    /// Help was requested. Print the usage and exit successfully.
    Help(String),
    /// The command line was invalid. Print the error and usage and exit with a failure.
    Usage {
        /// Description of what is wrong with the command line.
        error: String,
        /// The usage text.
        usage: String,
    },
}

/// Parses `args`, excluding the command name, into an [`Invocation`].
pub fn parse(command: &str, args: &[&str]) -> Invocation {
    let args = match Args::from_args(&[command], args) {
        Ok(args) => args,
        Err(EarlyExit {
            output,
            status: Ok(()),
        }) => return Invocation::Help(output),
        Err(EarlyExit {
            output,
            status: Err(()),
        }) => {
            return Invocation::Usage {
                error: output.trim_end().to_owned(),
                usage: usage(command),
            };
        }
    };

    match args.into_config() {
        Ok(config) => Invocation::Run(config),
        Err(err) => Invocation::Usage {
            error: Error::from(err).to_string(),
            usage: usage(command),
        },
    }
}

fn usage(command: &str) -> String {
    match Args::from_args(&[command], &["--help"]) {
        Err(EarlyExit { output, .. }) => output,
        Ok(_) => String::new(),
    }
}

/// Parse the command line, bootstrap the runtime and run the load test.
pub fn execute() -> Result<ExitCode> {
    let argv: Vec<String> = env::args().collect();
    let command = argv
        .first()
        .and_then(|path| Path::new(path).file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("thor");
    let args: Vec<&str> = argv.iter().skip(1).map(String::as_str).collect();

    let config = match parse(command, &args) {
        Invocation::Run(config) => config,
        Invocation::Help(usage) => {
            println!("{usage}");
            return Ok(ExitCode::SUCCESS);
        }
        Invocation::Usage { error, usage } => {
            eprintln!("{error}");
            println!("{usage}");
            return Ok(ExitCode::FAILURE);
        }
    };

    observability::init_tracing();
    tracing::debug!(?config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("thor-rt")
        .enable_all()
        .build()?;

    runtime
        .block_on(dispatcher::run(config, Arc::new(StdoutReporter)))
        .context("load test failed")?;

    Ok(ExitCode::SUCCESS)
}
