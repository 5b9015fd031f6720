//! Immutable run configuration.
//!
//! A [`Config`] is built exactly once from the parsed command line and shared read-only by the
//! dispatcher and every worker. Construction goes through [`ConfigBuilder::build`], which rejects
//! values that would make a run meaningless, such as zero workers or zero requests per worker.

use reqwest::Url;

/// Reasons a [`Config`] could not be built.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No target URL was given.
    #[error("the target URL must not be empty")]
    EmptyUrl,
    /// The target URL could not be parsed.
    #[error("invalid target URL `{url}`: {reason}")]
    InvalidUrl {
        /// The URL as given on the command line.
        url: String,
        /// Why the URL was rejected.
        reason: String,
    },
    /// The worker count was zero.
    #[error("the number of processes must be at least 1")]
    NoWorkers,
    /// The request count per worker was zero.
    #[error("the number of requests must be at least 1")]
    NoRequests,
}

/// A builder for creating a [`Config`].
#[derive(Debug)]
pub struct ConfigBuilder {
    url: String,
    workers: usize,
    requests: usize,
    verbose: bool,
    summary: bool,
}

impl ConfigBuilder {
    /// The number of workers issuing requests in parallel.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// The number of sequential requests each worker issues.
    pub fn requests(mut self, requests: usize) -> Self {
        self.requests = requests;
        self
    }

    /// Report the body of every response.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Report latency percentiles after the total average.
    pub fn summary(mut self, summary: bool) -> Self {
        self.summary = summary;
        self
    }

    /// Validates all values and creates the config.
    pub fn build(self) -> Result<Config, ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl);
        }

        let url = Url::parse(&self.url).map_err(|err| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason: err.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                reason: format!("unsupported scheme `{}`", url.scheme()),
                url: self.url,
            });
        }

        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.requests == 0 {
            return Err(ConfigError::NoRequests);
        }

        Ok(Config {
            url,
            workers: self.workers,
            requests: self.requests,
            verbose: self.verbose,
            summary: self.summary,
        })
    }
}

/// Validated settings of a single load test run.
#[derive(Clone, Debug)]
pub struct Config {
    url: Url,
    workers: usize,
    requests: usize,
    verbose: bool,
    summary: bool,
}

impl Config {
    /// Constructs a new config builder targeting the given URL.
    ///
    /// All other settings default to a single worker issuing a single request.
    pub fn builder(url: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder {
            url: url.into(),
            workers: 1,
            requests: 1,
            verbose: false,
            summary: false,
        }
    }

    /// The URL every request is sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The number of parallel workers. Always at least 1.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The number of requests per worker. Always at least 1.
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Whether response bodies are reported.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Whether a latency summary is reported at the end of the run.
    pub fn summary(&self) -> bool {
        self.summary
    }
}
