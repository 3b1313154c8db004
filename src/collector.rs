use crate::outcome::Outcome;
use crate::stats::{per_second, DistributionBucket, LatencySummary, Report};
use hdrhistogram::Histogram;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound of the distribution histogram, in microseconds.
const HISTOGRAM_MAX_MICROS: u64 = 60_000_000;

// =============================================================================
// Result Collector
// =============================================================================

/// Streaming aggregator for request outcomes.
///
/// Running sums are kept as outcomes arrive; durations are retained so exact
/// percentiles can be computed once the stream closes.
pub struct Collector {
    total: u64,
    successful: u64,
    failed: u64,
    errors: u64,
    total_bytes: u64,
    total_duration: Duration,
    min: Option<Duration>,
    max: Option<Duration>,
    durations: Vec<Duration>,
    status_counts: BTreeMap<u16, u64>,
    histogram: Option<Histogram<u64>>,
}

impl Collector {
    pub fn new(expected: usize) -> Self {
        let histogram = match Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_MICROS, 3) {
            Ok(h) => Some(h),
            Err(e) => {
                debug!("Latency histogram disabled: {:?}", e);
                None
            }
        };

        Self {
            total: 0,
            successful: 0,
            failed: 0,
            errors: 0,
            total_bytes: 0,
            total_duration: Duration::ZERO,
            min: None,
            max: None,
            durations: Vec::with_capacity(expected),
            status_counts: BTreeMap::new(),
            histogram,
        }
    }

    pub fn record(&mut self, outcome: &Outcome) {
        self.total += 1;
        self.total_bytes += outcome.bytes;
        self.total_duration += outcome.duration;
        self.min = Some(self.min.map_or(outcome.duration, |m| m.min(outcome.duration)));
        self.max = Some(self.max.map_or(outcome.duration, |m| m.max(outcome.duration)));
        self.durations.push(outcome.duration);

        if outcome.is_failure() {
            self.failed += 1;
        } else {
            self.successful += 1;
        }

        match &outcome.error {
            Some(_) => self.errors += 1,
            None => *self.status_counts.entry(outcome.status_code).or_insert(0) += 1,
        }

        if let Some(hist) = self.histogram.as_mut() {
            let micros = u64::try_from(outcome.duration.as_micros()).unwrap_or(u64::MAX);
            hist.saturating_record(micros.max(1));
        }
    }

    pub fn len(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// `queued` is the number of tokens not yet taken by any worker.
    pub fn log_progress(&self, expected: usize, queued: usize) {
        info!(
            "Progress: completed={}/{}, queued={}, failed={}, min={:?}, max={:?}",
            self.total,
            expected,
            queued,
            self.failed,
            self.min.unwrap_or_default(),
            self.max.unwrap_or_default()
        );
    }

    /// Sorts the retained durations and produces the final report.
    pub fn finish(mut self, wall_time: Duration, cancelled: bool) -> Report {
        self.durations.sort_unstable();

        let latency = LatencySummary::from_sorted(&self.durations, self.total_duration);
        let has_samples = latency.is_some();

        let throughput_bytes_per_sec = has_samples.then(|| per_second(self.total_bytes, wall_time));
        let success_rate =
            has_samples.then(|| self.successful as f64 / self.total as f64 * 100.0);

        let distribution = match (&self.histogram, has_samples) {
            (Some(hist), true) => hist
                .iter_quantiles(1)
                .filter(|v| v.count_since_last_iteration() > 0)
                .map(|v| DistributionBucket {
                    quantile: v.quantile_iterated_to(),
                    latency: Duration::from_micros(v.value_iterated_to()),
                    count: v.count_since_last_iteration(),
                })
                .collect(),
            _ => Vec::new(),
        };

        Report {
            wall_time,
            total: self.total,
            successful: self.successful,
            failed: self.failed,
            errors: self.errors,
            total_bytes: self.total_bytes,
            requests_per_sec: per_second(self.total, wall_time),
            status_counts: self.status_counts,
            latency,
            throughput_bytes_per_sec,
            success_rate,
            distribution,
            cancelled,
        }
    }
}
