use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

/// Quantiles reported for every run.
pub const QUANTILES: [f64; 4] = [0.50, 0.90, 0.95, 0.99];

/// Nearest-rank percentile over an ascending sample: the value at
/// `floor(q * len)`, clamped to the last element. No interpolation.
pub fn nearest_rank(sorted: &[Duration], q: f64) -> Option<Duration> {
    let last = sorted.len().checked_sub(1)?;
    let idx = (sorted.len() as f64 * q) as usize;
    Some(sorted[idx.min(last)])
}

fn as_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_nanos() as f64 / 1_000_000.0)
}

/// Latency distribution of the requests that were attempted. Only exists when
/// at least one outcome was collected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySummary {
    #[serde(serialize_with = "as_millis")]
    pub avg: Duration,
    #[serde(serialize_with = "as_millis")]
    pub min: Duration,
    #[serde(serialize_with = "as_millis")]
    pub max: Duration,
    #[serde(serialize_with = "as_millis")]
    pub p50: Duration,
    #[serde(serialize_with = "as_millis")]
    pub p90: Duration,
    #[serde(serialize_with = "as_millis")]
    pub p95: Duration,
    #[serde(serialize_with = "as_millis")]
    pub p99: Duration,
}

impl LatencySummary {
    /// `sorted` must be ascending. `total` is the sum of every duration.
    pub fn from_sorted(sorted: &[Duration], total: Duration) -> Option<Self> {
        let (min, max) = (*sorted.first()?, *sorted.last()?);
        let [p50, p90, p95, p99] = QUANTILES.map(|q| nearest_rank(sorted, q));
        Some(Self {
            avg: total / u32::try_from(sorted.len()).unwrap_or(u32::MAX),
            min,
            max,
            p50: p50?,
            p90: p90?,
            p95: p95?,
            p99: p99?,
        })
    }
}

/// One step of the latency histogram walk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionBucket {
    pub quantile: f64,
    #[serde(serialize_with = "as_millis")]
    pub latency: Duration,
    pub count: u64,
}

/// Aggregate statistics for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// From the first token being made available to the last outcome collected.
    #[serde(serialize_with = "as_millis")]
    pub wall_time: Duration,
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    /// Failures that never produced an HTTP response. Included in `failed`.
    pub errors: u64,
    pub total_bytes: u64,
    pub requests_per_sec: f64,
    pub status_counts: BTreeMap<u16, u64>,
    pub latency: Option<LatencySummary>,
    pub throughput_bytes_per_sec: Option<f64>,
    pub success_rate: Option<f64>,
    pub distribution: Vec<DistributionBucket>,
    /// Set when the run was cut short by the cancellation signal.
    pub cancelled: bool,
}

/// `amount / elapsed`, or zero when no time elapsed.
pub fn per_second(amount: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        amount as f64 / secs
    } else {
        0.0
    }
}
