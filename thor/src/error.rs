//! Error types of a load test run.

use crate::config::ConfigError;

/// Errors that can abort a load test run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The run was configured with invalid values.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// A request failed to connect, timed out, or returned a non-2xx status.
    ///
    /// The worker that issued the request stops and the whole run is aborted.
    #[error("worker {worker} failed on request {sequence}: {source}")]
    Request {
        /// Identity of the worker that issued the request.
        worker: usize,
        /// Sequence number of the request within the worker.
        sequence: usize,
        /// The underlying [`reqwest`] error.
        #[source]
        source: reqwest::Error,
    },
    /// A worker task panicked or was cancelled before producing a result.
    #[error("worker task did not complete: {source}")]
    Worker {
        /// Identity of the worker, if the task could be matched to one.
        worker: Option<usize>,
        /// The error returned when joining the task.
        #[source]
        source: tokio::task::JoinError,
    },
    /// Writing the report failed.
    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error was caused by invalid configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// A convenience alias that defaults our [`Error`] type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
