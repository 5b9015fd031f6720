//! Human-readable progress and result reporting.
//!
//! Workers and the dispatcher never print directly. Instead, they hand [`Event`]s to a shared
//! [`Reporter`], which renders one line per event. [`StdoutReporter`] is used by the binary and
//! [`MemoryReporter`] collects lines for inspection in tests.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::stats::{Latencies, Summary};

/// Something worth reporting while a run is in progress.
#[derive(Debug)]
pub enum Event<'a> {
    /// The raw body of a response, reported in verbose mode before its request line.
    Body(&'a str),
    /// A single request completed.
    Request {
        /// Identity of the worker that issued the request.
        worker: usize,
        /// Sequence number of the request within the worker.
        sequence: usize,
        /// Wall-clock time from sending the request until the body was read.
        elapsed: Duration,
    },
    /// A worker completed all of its requests.
    WorkerAverage {
        /// Identity of the worker.
        worker: usize,
        /// Mean request duration of the worker, in seconds.
        mean: f64,
    },
    /// All workers completed.
    Total {
        /// Mean of all worker means, in seconds.
        mean: f64,
    },
    /// Percentile summary over all requests of the run.
    Summary(&'a Latencies),
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Body(body) => f.write_str(body),
            Event::Request {
                worker,
                sequence,
                elapsed,
            } => write!(
                f,
                "Process: {worker}, Request: {sequence}, Elapsed Time: {:.2}",
                elapsed.as_secs_f64()
            ),
            Event::WorkerAverage { worker, mean } => {
                write!(f, "Process: {worker}, AVERAGE   , Elapsed Time: {mean:.2}")
            }
            Event::Total { mean } => write!(f, "TOTAL AVERAGE ELAPSED TIME: {mean:.2}"),
            Event::Summary(latencies) => fmt::Display::fmt(&Summary(latencies), f),
        }
    }
}

/// A sink for [`Event`]s, shared by all workers of a run.
///
/// Implementations must emit each event atomically, so that lines of concurrent workers never
/// interleave mid-line.
pub trait Reporter: fmt::Debug + Send + Sync {
    /// Emits a single event.
    fn report(&self, event: &Event<'_>) -> io::Result<()>;
}

/// Writes every event as a line to standard output.
#[derive(Debug, Default)]
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn report(&self, event: &Event<'_>) -> io::Result<()> {
        let line = event.to_string();
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{line}")?;
        stdout.flush()
    }
}

/// Collects rendered lines in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<String>>,
}

impl MemoryReporter {
    /// Creates an empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all lines reported so far, in the order they were reported.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, event: &Event<'_>) -> io::Result<()> {
        let line = event.to_string();
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
        Ok(())
    }
}
