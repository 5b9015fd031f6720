//! Latency distribution tracking for the optional summary report.

use std::fmt;
use std::time::Duration;

use sketches_ddsketch::DDSketch;
use yansi::Paint;

/// A mergeable sketch of request latencies, in seconds.
#[derive(Default)]
pub struct Latencies {
    sketch: DDSketch,
}

impl Latencies {
    /// Records a single request duration.
    pub fn add(&mut self, elapsed: Duration) {
        self.sketch.add(elapsed.as_secs_f64());
    }

    /// Merges all samples of `other` into this sketch.
    pub fn merge(&mut self, other: &Latencies) {
        // Both sketches use the default config, merging can only fail on mismatching configs.
        if let Err(err) = self.sketch.merge(&other.sketch) {
            tracing::warn!(error = ?err, "failed to merge latency sketches");
        }
    }

    /// The number of recorded samples.
    pub fn count(&self) -> usize {
        self.sketch.count()
    }

    /// The approximate latency at quantile `q` in `[0, 1]`.
    ///
    /// Returns `None` if no samples have been recorded.
    pub fn quantile(&self, q: f64) -> Option<Duration> {
        self.sketch
            .quantile(q)
            .ok()
            .flatten()
            .map(|secs| Duration::from_secs_f64(secs.max(0.0)))
    }

    /// The smallest recorded latency.
    pub fn min(&self) -> Option<Duration> {
        self.sketch.min().map(|secs| Duration::from_secs_f64(secs.max(0.0)))
    }

    /// The largest recorded latency.
    pub fn max(&self) -> Option<Duration> {
        self.sketch.max().map(|secs| Duration::from_secs_f64(secs.max(0.0)))
    }
}

impl fmt::Debug for Latencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Latencies")
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}

/// Renders the percentile block printed with `--summary`.
pub(crate) struct Summary<'a>(pub &'a Latencies);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let latencies = self.0;
        writeln!(
            f,
            "{} ({} requests)",
            "## LATENCY".bold(),
            latencies.count()
        )?;

        let (Some(min), Some(max)) = (latencies.min(), latencies.max()) else {
            return write!(f, "  no samples");
        };
        let p50 = latencies.quantile(0.5).unwrap_or_default();
        let p90 = latencies.quantile(0.9).unwrap_or_default();
        let p99 = latencies.quantile(0.99).unwrap_or_default();

        write!(
            f,
            "  min: {min:.2?}; p50: {:.2?}; p90: {p90:.2?}; p99: {p99:.2?}; max: {max:.2?}",
            p50.bold()
        )
    }
}
