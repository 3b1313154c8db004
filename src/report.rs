use crate::stats::Report;
use std::time::Duration;
use tracing::info;

fn round_to_micros(d: Duration) -> Duration {
    Duration::from_nanos((d.as_nanos() + 500) as u64 / 1_000 * 1_000)
}

fn round_to_millis(d: Duration) -> Duration {
    Duration::from_nanos((d.as_nanos() + 500_000) as u64 / 1_000_000 * 1_000_000)
}

/// Human-readable summary, one line per entry.
pub fn summary_lines(report: &Report, show_distribution: bool) -> Vec<String> {
    let mut lines = vec![
        format!("Time taken:           {:?}", round_to_millis(report.wall_time)),
        format!("Total requests:       {}", report.total),
        format!("Successful requests:  {}", report.successful),
        format!("Failed requests:      {}", report.failed),
        format!("Transport errors:     {}", report.errors),
        format!("Requests per second:  {:.2}", report.requests_per_sec),
    ];

    if report.cancelled {
        lines.push("Run was interrupted; results are partial".to_string());
    }

    if let Some(latency) = &report.latency {
        lines.push(format!("Average duration:     {:?}", round_to_micros(latency.avg)));
        lines.push(format!("Min duration:         {:?}", round_to_micros(latency.min)));
        lines.push(format!("Max duration:         {:?}", round_to_micros(latency.max)));
        lines.push(format!("50th percentile:      {:?}", round_to_micros(latency.p50)));
        lines.push(format!("90th percentile:      {:?}", round_to_micros(latency.p90)));
        lines.push(format!("95th percentile:      {:?}", round_to_micros(latency.p95)));
        lines.push(format!("99th percentile:      {:?}", round_to_micros(latency.p99)));
    }

    if let Some(throughput) = report.throughput_bytes_per_sec {
        lines.push(format!("Throughput:           {:.2} KB/s", throughput / 1024.0));
    }

    if let Some(rate) = report.success_rate {
        lines.push(format!("Success rate:         {:.1}%", rate));
    }

    if !report.status_counts.is_empty() {
        lines.push(String::new());
        lines.push("Status codes:".to_string());
        for (status, count) in &report.status_counts {
            lines.push(format!("  {}: {}", status, count));
        }
    }

    if show_distribution && !report.distribution.is_empty() {
        lines.push(String::new());
        lines.push("Latency distribution:".to_string());
        for bucket in &report.distribution {
            lines.push(format!(
                "  {:>10.6}  {:>12?}  {:>8}",
                bucket.quantile,
                round_to_micros(bucket.latency),
                bucket.count
            ));
        }
    }

    lines
}

pub fn print_summary(report: &Report, show_distribution: bool) {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║                    BENCHMARK RESULTS                       ║");
    info!("╚════════════════════════════════════════════════════════════╝");

    for line in summary_lines(report, show_distribution) {
        info!("{}", line);
    }

    info!("═══════════════════════════════════════════════════════════");
}

pub fn to_json(report: &Report) -> Result<String, sonic_rs::Error> {
    sonic_rs::to_string_pretty(report)
}
