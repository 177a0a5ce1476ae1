//! # LogHandler: simple event printer
//!
//! A minimal handler that writes incoming [`Event`]s through `tracing` at `INFO`.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! INFO eventvisor: event received seq=3 name="user.created" args=["alice", 42]
//! ```

use async_trait::async_trait;

use crate::events::Event;
use crate::subscribers::Handler;

/// Event writer handler.
#[derive(Default)]
pub struct LogHandler;

impl LogHandler {
    /// Construct a new [`LogHandler`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for LogHandler {
    async fn on_event(&self, e: &Event) {
        tracing::info!(seq = e.seq, name = e.name(), args = ?e.args(), "event received");
    }

    fn name(&self) -> &'static str {
        "LogHandler"
    }
}
