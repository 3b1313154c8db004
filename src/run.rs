use crate::cancel::CancelSignal;
use crate::collector::Collector;
use crate::config::RunConfig;
use crate::stats::Report;
use crate::work::WorkSource;
use crate::worker::{build_clients, spawn_pool};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{debug, info, warn};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Run-level lifecycle. Phases only move forward; cancellation shortens
/// `Running` but every run still ends in `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    NotStarted,
    /// Workers active, collector draining.
    Running,
    /// Workers done, collector finishing the backlog.
    Draining,
    Completed,
}

impl RunPhase {
    pub fn next(self) -> Option<Self> {
        match self {
            RunPhase::NotStarted => Some(RunPhase::Running),
            RunPhase::Running => Some(RunPhase::Draining),
            RunPhase::Draining => Some(RunPhase::Completed),
            RunPhase::Completed => None,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.next() {
            debug!("Run phase {:?} -> {:?}", self, next);
            *self = next;
        }
    }
}

/// Issues `config.requests` GETs across `config.concurrency` workers and
/// aggregates every outcome into a [`Report`].
///
/// Never fails: per-request errors are recorded in the report, and triggering
/// `cancel` only stops new requests from starting.
pub async fn run(config: RunConfig, cancel: CancelSignal) -> Report {
    let config = Arc::new(config);
    let mut phase = RunPhase::NotStarted;

    // Clients are ready before the clock starts
    let clients = build_clients(&config).await;

    let started = Instant::now();
    let source = WorkSource::new(config.requests);
    let (mut outcomes, mut watcher) =
        spawn_pool(&config, clients, source.clone(), cancel.clone());
    phase.advance();

    let mut collector = Collector::new(source.total());
    let mut consumed: Option<usize> = None;
    let mut progress = interval(PROGRESS_INTERVAL);
    // The first tick completes immediately
    progress.tick().await;

    loop {
        tokio::select! {
            outcome = outcomes.recv() => match outcome {
                Some(outcome) => collector.record(&outcome),
                None => break,
            },

            result = &mut watcher, if consumed.is_none() => {
                consumed = Some(result.unwrap_or_else(|e| {
                    warn!("Completion watcher failed: {}", e);
                    0
                }));
                phase.advance();
            }

            _ = progress.tick() => collector.log_progress(source.total(), source.remaining()),
        }
    }

    // The stream can close before the watcher's result is observed
    if consumed.is_none() {
        consumed = Some(watcher.await.unwrap_or_default());
        phase.advance();
    }

    let wall_time = started.elapsed();
    phase.advance();

    let cancelled = cancel.is_triggered();
    if cancelled && collector.is_empty() {
        warn!("Run cancelled before any request completed");
    }
    info!(
        "Run {:?}: {} tokens consumed, {} outcomes collected{}",
        phase,
        consumed.unwrap_or_default(),
        collector.len(),
        if cancelled { " (cancelled)" } else { "" }
    );

    collector.finish(wall_time, cancelled)
}
