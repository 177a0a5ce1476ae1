use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{
    config::EmitterConfig,
    coordinator::Coordinator,
    emitter::Emitter,
    registry::{Listener, Registry},
};
use crate::{
    matching::Pattern,
    subscribers::{Handler, Subscription, spawn_worker},
};

/// Builder for constructing an [`Emitter`] with pre-attached handlers.
pub struct EmitterBuilder {
    cfg: EmitterConfig,
    handlers: Vec<(Pattern, Arc<dyn Handler>)>,
}

impl EmitterBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: EmitterConfig) -> Self {
        Self {
            cfg,
            handlers: Vec::new(),
        }
    }

    /// Attaches a handler under `pattern` before the emitter starts.
    ///
    /// Handlers registered here are live before the first command is processed,
    /// so they never miss an early emission.
    pub fn with_handler(mut self, pattern: impl Into<Pattern>, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push((pattern.into(), handler));
        self
    }

    /// Builds the emitter and spawns its coordinator task.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn build(self) -> Emitter {
        let (tx, rx) = mpsc::channel(self.cfg.command_capacity_clamped());
        let shutdown = CancellationToken::new();

        let mut registry = Registry::new();
        for (pattern, handler) in self.handlers {
            let (sub, listener_tx) = Subscription::channel(pattern.clone(), false);
            registry.insert(pattern, Listener::new(&sub, listener_tx));
            spawn_worker(sub, handler);
        }

        Coordinator::new(registry, rx, tx.downgrade(), shutdown.clone()).spawn();
        Emitter::from_parts(tx, shutdown, self.cfg.default_timeout())
    }
}
