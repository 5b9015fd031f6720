//! A single worker issuing a fixed burst of sequential requests.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::report::{Event, Reporter};
use crate::stats::Latencies;

/// The outcome of a worker that completed all of its requests.
#[derive(Debug)]
pub struct WorkerResult {
    /// Identity of the worker, in `0..workers`.
    pub worker: usize,
    /// Arithmetic mean of all request durations of this worker, in seconds.
    ///
    /// This is the exact, unrounded mean. Rounding only happens when reporting.
    pub mean: f64,
    /// Distribution of this worker's request durations.
    pub latencies: Latencies,
}

/// Runs worker `id`, issuing `config.requests()` GET requests one after another.
///
/// Every completed request is reported as an [`Event::Request`], preceded by an [`Event::Body`]
/// in verbose mode. Once all requests are done, the worker reports its average and returns it.
///
/// The first request that fails to connect, times out, or responds with a non-2xx status stops
/// the worker and is returned as [`Error::Request`]. Remaining requests are not sent.
pub async fn run_worker(
    id: usize,
    client: Client,
    config: Arc<Config>,
    reporter: Arc<dyn Reporter>,
) -> Result<WorkerResult> {
    let mut total = 0.0;
    let mut latencies = Latencies::default();

    for sequence in 0..config.requests() {
        let start = Instant::now();
        let body = fetch(&client, &config)
            .await
            .map_err(|source| Error::Request {
                worker: id,
                sequence,
                source,
            })?;
        let elapsed = start.elapsed();

        tracing::debug!(worker = id, sequence, ?elapsed, bytes = body.len(), "request done");

        if config.verbose() {
            reporter.report(&Event::Body(&body))?;
        }
        reporter.report(&Event::Request {
            worker: id,
            sequence,
            elapsed,
        })?;

        total += elapsed.as_secs_f64();
        latencies.add(elapsed);
    }

    // The loop only completes after `config.requests()` samples, which is at least 1.
    let mean = total / config.requests() as f64;
    reporter.report(&Event::WorkerAverage { worker: id, mean })?;
    tracing::debug!(worker = id, mean, "worker done");

    Ok(WorkerResult {
        worker: id,
        mean,
        latencies,
    })
}

/// Sends a single GET request and reads the full body.
async fn fetch(client: &Client, config: &Config) -> reqwest::Result<String> {
    let response = client.get(config.url().clone()).send().await?;
    response.error_for_status()?.text().await
}

/// Arithmetic mean of `values`.
///
/// Callers guarantee at least one value, since a config never has zero workers.
pub(crate) fn mean(values: &[f64]) -> f64 {
    debug_assert!(!values.is_empty());
    values.iter().sum::<f64>() / values.len() as f64
}
