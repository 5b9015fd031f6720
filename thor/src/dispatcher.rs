//! Run a pool of workers concurrently against the target and aggregate their results.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tokio::task::{self, JoinError, JoinSet};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::report::{Event, Reporter};
use crate::stats::Latencies;
use crate::worker::{WorkerResult, mean, run_worker};

/// The outcome of a run in which every worker completed.
#[derive(Debug)]
pub struct AggregateResult {
    /// Mean of all worker means, in seconds.
    ///
    /// This is a two-level mean: every worker contributes equally, regardless of how its
    /// individual requests were distributed.
    pub mean: f64,
    /// The results of all workers, ordered by worker id.
    pub workers: Vec<WorkerResult>,
    /// Distribution of all request durations across all workers.
    pub latencies: Latencies,
}

/// Runs `config.workers()` workers in parallel and reports their total average.
///
/// This uses a default HTTP client, see [`run_with_client`].
pub async fn run(config: Config, reporter: Arc<dyn Reporter>) -> Result<AggregateResult> {
    let client = Client::builder().build().map_err(Error::Client)?;
    run_with_client(config, client, reporter).await
}

/// Runs `config.workers()` workers in parallel using `client` and reports their total average.
///
/// Workers get the ids `0..config.workers()` and share the client, and thereby its connection
/// pool. This waits for all workers before computing the aggregate.
///
/// If any worker fails, all other workers are aborted and the error is returned without reporting
/// a total.
pub async fn run_with_client(
    config: Config,
    client: Client,
    reporter: Arc<dyn Reporter>,
) -> Result<AggregateResult> {
    let config = Arc::new(config);

    tracing::info!(
        url = %config.url(),
        workers = config.workers(),
        requests = config.requests(),
        "starting load test"
    );

    // Worker counts come straight from the command line, so nothing is sized up front.
    let mut tasks = JoinSet::new();
    let mut task_ids = HashMap::new();
    let mut workers = Vec::new();

    for id in 0..config.workers() {
        let handle = tasks.spawn(run_worker(
            id,
            client.clone(),
            Arc::clone(&config),
            Arc::clone(&reporter),
        ));
        task_ids.insert(handle.id(), id);
        task::yield_now().await;

        // stop spawning once a worker has already failed
        while let Some(joined) = tasks.try_join_next() {
            if let Err(err) = collect(joined, &task_ids, &mut workers) {
                return Err(abort(&mut tasks, err));
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = collect(joined, &task_ids, &mut workers) {
            return Err(abort(&mut tasks, err));
        }
    }

    workers.sort_unstable_by_key(|w| w.worker);
    let aggregate = aggregate(workers);

    reporter.report(&Event::Total {
        mean: aggregate.mean,
    })?;
    if config.summary() {
        reporter.report(&Event::Summary(&aggregate.latencies))?;
    }

    tracing::info!(mean = aggregate.mean, "load test finished");
    Ok(aggregate)
}

type Joined = std::result::Result<Result<WorkerResult>, JoinError>;

fn collect(
    joined: Joined,
    task_ids: &HashMap<task::Id, usize>,
    workers: &mut Vec<WorkerResult>,
) -> Result<()> {
    let worker = joined.map_err(|source| Error::Worker {
        worker: task_ids.get(&source.id()).copied(),
        source,
    })??;
    workers.push(worker);
    Ok(())
}

fn abort(tasks: &mut JoinSet<Result<WorkerResult>>, err: Error) -> Error {
    tracing::debug!(error = &err as &dyn std::error::Error, "aborting run");
    tasks.abort_all();
    err
}

fn aggregate(workers: Vec<WorkerResult>) -> AggregateResult {
    let means: Vec<_> = workers.iter().map(|w| w.mean).collect();

    let mut latencies = Latencies::default();
    for worker in &workers {
        latencies.merge(&worker.latencies);
    }

    AggregateResult {
        mean: mean(&means),
        workers,
        latencies,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use thor_test::server::TestServer;

    use crate::report::MemoryReporter;

    use super::*;

    fn client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    fn worker_result(worker: usize, samples: &[u64]) -> WorkerResult {
        let mut latencies = Latencies::default();
        let mut secs = Vec::new();
        for ms in samples {
            let elapsed = Duration::from_millis(*ms);
            latencies.add(elapsed);
            secs.push(elapsed.as_secs_f64());
        }
        WorkerResult {
            worker,
            mean: mean(&secs),
            latencies,
        }
    }

    #[test]
    fn aggregate_is_mean_of_means() {
        // One worker with a single slow request, one with three fast ones.
        let workers = vec![
            worker_result(0, &[400]),
            worker_result(1, &[100, 100, 100]),
        ];

        let aggregate = aggregate(workers);

        // The mean over raw samples would be 0.175.
        assert!((aggregate.mean - 0.25).abs() < 1e-9, "{}", aggregate.mean);
        assert_eq!(aggregate.latencies.count(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn spawns_contiguous_worker_ids() {
        thor_test::tracing::init();
        let server = TestServer::new().await;
        let config = Config::builder(server.url("/"))
            .workers(8)
            .requests(2)
            .build()
            .unwrap();
        let reporter = Arc::new(MemoryReporter::new());

        let aggregate = run_with_client(config, client(), reporter.clone()).await.unwrap();

        let ids: Vec<_> = aggregate.workers.iter().map(|w| w.worker).collect();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());
        assert_eq!(server.hits(), 16);

        let lines = reporter.lines();
        assert_eq!(lines.len(), 8 * 3 + 1);
        for id in 0..8 {
            let prefix = format!("Process: {id}, AVERAGE   ,");
            let averages = lines.iter().filter(|l| l.starts_with(&prefix)).count();
            assert_eq!(averages, 1, "worker {id}");
        }

        let means: Vec<_> = aggregate.workers.iter().map(|w| w.mean).collect();
        assert_eq!(aggregate.mean, mean(&means));
        assert_eq!(
            lines.last().unwrap(),
            &format!("TOTAL AVERAGE ELAPSED TIME: {:.2}", aggregate.mean)
        );
    }

    #[tokio::test]
    async fn single_request_produces_three_lines() {
        let server = TestServer::new().await;
        let config = Config::builder(server.url("/")).build().unwrap();
        let reporter = Arc::new(MemoryReporter::new());

        run_with_client(config, client(), reporter.clone()).await.unwrap();

        let lines = reporter.lines();
        assert_eq!(lines.len(), 3, "{lines:#?}");
        assert!(lines[0].starts_with("Process: 0, Request: 0, Elapsed Time: "));
        assert!(lines[1].starts_with("Process: 0, AVERAGE   , Elapsed Time: "));
        assert!(lines[2].starts_with("TOTAL AVERAGE ELAPSED TIME: "));
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn fixed_latency_rounds_consistently() {
        let server = TestServer::with_latency(Duration::from_millis(100)).await;
        let config = Config::builder(server.url("/"))
            .workers(2)
            .requests(3)
            .build()
            .unwrap();
        let reporter = Arc::new(MemoryReporter::new());

        run_with_client(config, client(), reporter.clone()).await.unwrap();

        let lines = reporter.lines();
        assert_eq!(lines.len(), 9);
        assert_eq!(
            lines.iter().filter(|l| l.contains(", Request: ")).count(),
            6
        );
        for line in &lines {
            assert!(line.ends_with(": 0.10"), "{line}");
        }
        assert_eq!(lines[8], "TOTAL AVERAGE ELAPSED TIME: 0.10");
    }

    #[tokio::test]
    async fn summary_follows_total() {
        let server = TestServer::new().await;
        let config = Config::builder(server.url("/"))
            .requests(4)
            .summary(true)
            .build()
            .unwrap();
        let reporter = Arc::new(MemoryReporter::new());

        let aggregate = run_with_client(config, client(), reporter.clone()).await.unwrap();
        assert_eq!(aggregate.latencies.count(), 4);

        let lines = reporter.lines();
        assert_eq!(lines.len(), 7);
        assert!(lines[5].starts_with("TOTAL AVERAGE ELAPSED TIME: "));
        assert!(lines[6].contains("4 requests"), "{}", lines[6]);
        assert!(lines[6].contains("p50:"), "{}", lines[6]);
    }

    #[tokio::test]
    async fn unreachable_target_fails_without_total() {
        let config = Config::builder(thor_test::server::unreachable_url())
            .workers(3)
            .requests(2)
            .build()
            .unwrap();
        let reporter = Arc::new(MemoryReporter::new());

        let err = run_with_client(config, client(), reporter.clone()).await.unwrap_err();

        assert!(matches!(err, Error::Request { sequence: 0, .. }), "{err:?}");
        assert!(!err.is_config());
        assert!(
            !reporter
                .lines()
                .iter()
                .any(|l| l.starts_with("TOTAL AVERAGE"))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failing_worker_aborts_run() {
        let server = TestServer::new().await;
        let config = Config::builder(server.url("/status/500"))
            .workers(2)
            .requests(3)
            .build()
            .unwrap();
        let reporter = Arc::new(MemoryReporter::new());

        let err = run_with_client(config, client(), reporter.clone()).await.unwrap_err();

        let Error::Request { source, .. } = err else {
            panic!("expected a request error");
        };
        assert_eq!(
            source.status(),
            Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
        );
        // Each worker stops at its first failure.
        assert!(server.hits() <= 2);
        assert!(reporter.lines().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn huge_worker_count_fails_cleanly() {
        let config = Config::builder(thor_test::server::unreachable_url())
            .workers(usize::MAX)
            .build()
            .unwrap();
        let reporter = Arc::new(MemoryReporter::new());

        let err = run_with_client(config, client(), reporter.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Request { sequence: 0, .. }), "{err:?}");
        assert!(reporter.lines().is_empty());
    }

    #[tokio::test]
    async fn crashed_worker_keeps_its_id() {
        let mut tasks: JoinSet<Result<WorkerResult>> = JoinSet::new();
        let handle = tasks.spawn(async { panic!("worker crashed") });
        let task_ids = HashMap::from([(handle.id(), 3)]);

        let joined = tasks.join_next().await.unwrap();
        let err = collect(joined, &task_ids, &mut Vec::new()).unwrap_err();

        let Error::Worker { worker, source } = err else {
            panic!("expected a worker error");
        };
        assert_eq!(worker, Some(3));
        assert!(source.is_panic());
    }

    #[tokio::test]
    async fn unknown_task_has_no_worker_id() {
        let mut tasks: JoinSet<Result<WorkerResult>> = JoinSet::new();
        tasks.spawn(async { panic!("worker crashed") });

        let joined = tasks.join_next().await.unwrap();
        let err = collect(joined, &HashMap::new(), &mut Vec::new()).unwrap_err();

        assert!(matches!(err, Error::Worker { worker: None, .. }), "{err:?}");
        assert!(err.to_string().starts_with("worker task did not complete"));
    }
}
