// =============================================================================
// Work Source
// =============================================================================

/// One unit of work: "perform one request".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token;

/// A fixed supply of `total` tokens shared by every worker.
///
/// Backed by a bounded MPMC queue that is filled once and closed immediately,
/// so each token is delivered to exactly one worker and the queue reports
/// exhaustion once it is drained.
#[derive(Clone)]
pub struct WorkSource {
    tokens: flume::Receiver<Token>,
    total: usize,
}

impl WorkSource {
    pub fn new(total: usize) -> Self {
        // flume treats capacity 0 as a rendezvous channel
        let (tx, rx) = flume::bounded(total.max(1));
        for _ in 0..total {
            if tx.try_send(Token).is_err() {
                break;
            }
        }
        // Dropping the only sender closes the queue
        drop(tx);

        Self { tokens: rx, total }
    }

    /// Next token, or `None` once the source is exhausted.
    pub async fn take(&self) -> Option<Token> {
        self.tokens.recv_async().await.ok()
    }

    /// Discards every token still queued and returns how many were dropped.
    /// Workers racing on [`take`](Self::take) observe exhaustion afterwards.
    pub fn close(&self) -> usize {
        self.tokens.drain().count()
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
