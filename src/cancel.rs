use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// =============================================================================
// Cancellation Signal
// =============================================================================

/// One-shot, process-wide stop flag. Once triggered it stays triggered.
///
/// Workers check it once per iteration; it never interrupts a request that is
/// already in flight.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    triggered: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the call that actually flipped the flag.
    pub fn trigger(&self) -> bool {
        !self.triggered.swap(true, Ordering::AcqRel)
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Triggers the signal on the first Ctrl-C. Abort the returned handle once
    /// the run is over.
    pub fn listen_for_interrupt(&self) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Interrupt received, stopping...");
                    signal.trigger();
                }
                Err(e) => debug!("Failed to listen for interrupt: {}", e),
            }
        })
    }
}
