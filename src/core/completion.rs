//! # Completion signal of one emission.
//!
//! ```text
//! emit() ──► Completion ──► caller: wait() / cancel() / settled()
//!               ▲
//!               └── fan-out driver: finish(summary) after every delivery task resolved
//! ```
//!
//! Closing is idempotent: the caller may cancel while the driver finishes, in any
//! order and any number of times.
//!
//! - `closed`: closed by whichever side gets there first (cancel or finish);
//!   delivery tasks still waiting abandon as soon as they observe it.
//! - `settled`: closed by the driver only, after the summary is stored.

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// Outcome counts of one emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliverySummary {
    /// Listeners resolved for this emission.
    pub matched: usize,
    /// Handoffs completed (the consumer took the event).
    pub delivered: usize,
    /// Deliveries given up because the completion was closed first, or the
    /// listener was removed while the handoff was pending.
    pub abandoned: usize,
    /// Listeners whose consumer had dropped its stream.
    pub disconnected: usize,
}

/// Handle returned by [`Emitter::emit`](crate::Emitter::emit).
#[derive(Clone, Debug)]
pub struct Completion {
    closed: CancellationToken,
    settled: CancellationToken,
    summary: Arc<OnceLock<DeliverySummary>>,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self {
            closed: CancellationToken::new(),
            settled: CancellationToken::new(),
            summary: Arc::new(OnceLock::new()),
        }
    }

    /// Waits until the signal is closed: every delivery resolved, or the caller cancelled.
    pub async fn wait(&self) {
        self.closed.cancelled().await;
    }

    /// Closes the signal early; pending deliveries abandon. Safe to call repeatedly.
    pub fn cancel(&self) {
        self.closed.cancel();
    }

    /// `true` once the signal is closed.
    pub fn is_done(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Waits until every delivery task resolved and returns their outcome counts.
    ///
    /// Unlike [`wait`](Self::wait), this is not shortened by [`cancel`](Self::cancel).
    pub async fn settled(&self) -> DeliverySummary {
        self.settled.cancelled().await;
        self.summary.get().copied().unwrap_or_default()
    }

    /// Outcome counts, once settled.
    pub fn summary(&self) -> Option<DeliverySummary> {
        self.summary.get().copied()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.closed
    }

    /// Stores the summary, then closes both signals.
    pub(crate) fn finish(&self, summary: DeliverySummary) {
        let _ = self.summary.set(summary);
        self.closed.cancel();
        self.settled.cancel();
    }
}
