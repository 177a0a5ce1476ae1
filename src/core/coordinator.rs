//! # Coordinator: single owner of the listener registry.
//!
//! Every public emitter operation becomes a [`Command`] processed sequentially
//! by one task, so registry mutation is serialized without a lock. Emissions
//! only *resolve* here; the blocking handoffs run in a separately spawned
//! fan-out driver, and the coordinator moves on to the next command at once.
//!
//! ## Architecture
//! ```text
//! Emitter handles ──► [command queue] ──► Coordinator::run()
//!                                            ├─► Subscribe  → registry.insert
//!                                            ├─► List       → registry.list      → reply
//!                                            ├─► Remove     → registry.remove    → reply
//!                                            ├─► CloseAll   → registry.close_all → reply
//!                                            ├─► Emit       → registry.claim → spawn fan_out
//!                                            └─► Restore    → registry.restore   (from fan_out)
//! ```
//!
//! ## Shutdown
//! The loop exits when the shutdown token fires or every emitter handle is
//! dropped. On exit every listener is closed (all streams end, deliveries in
//! flight give up) and emissions still queued are finished with an empty
//! summary so nobody waits forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::completion::{Completion, DeliverySummary};
use super::delivery::fan_out;
use super::registry::{Listener, Registry, Target};
use crate::events::Event;
use crate::matching::Pattern;
use crate::subscribers::SubscriptionId;

/// Requests processed by the coordinator.
pub(crate) enum Command {
    Subscribe {
        pattern: Pattern,
        listener: Listener,
    },
    List {
        query: Pattern,
        reply: oneshot::Sender<Vec<SubscriptionId>>,
    },
    Remove {
        pattern: Pattern,
        id: SubscriptionId,
        reply: oneshot::Sender<bool>,
    },
    CloseAll {
        query: Pattern,
        reply: oneshot::Sender<()>,
    },
    Emit {
        event: Arc<Event>,
        completion: Completion,
        timeout: Option<Duration>,
    },
    Restore {
        target: Target,
        generation: u64,
    },
}

pub(crate) struct Coordinator {
    registry: Registry,
    rx: mpsc::Receiver<Command>,
    /// Handed to fan-out drivers for restores; weak so the loop still ends
    /// when the last emitter handle goes away.
    feedback: mpsc::WeakSender<Command>,
    shutdown: CancellationToken,
}

impl Coordinator {
    pub(crate) fn new(
        registry: Registry,
        rx: mpsc::Receiver<Command>,
        feedback: mpsc::WeakSender<Command>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            rx,
            feedback,
            shutdown,
        }
    }

    /// Spawns the command loop on the current runtime.
    pub(crate) fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                }
            }
        }

        let (registered, in_flight) = self.registry.close_every();
        self.drain();
        tracing::debug!(listeners = registered, in_flight, "coordinator stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Subscribe { pattern, listener } => {
                let id = listener.id;
                let once = listener.once;
                self.registry.insert(pattern.clone(), listener);
                tracing::debug!(
                    %pattern,
                    kind = pattern.kind(),
                    subscription = %id,
                    once,
                    under_key = self.registry.count(&pattern),
                    "listener added"
                );
            }
            Command::List { query, reply } => {
                let _ = reply.send(self.registry.list(&query));
            }
            Command::Remove { pattern, id, reply } => {
                let removed = self.registry.remove(&pattern, id);
                tracing::debug!(%pattern, subscription = %id, removed, "remove listener");
                let _ = reply.send(removed);
            }
            Command::CloseAll { query, reply } => {
                let report = self.registry.close_all(&query);
                tracing::debug!(
                    %query,
                    closed = report.closed,
                    swept = report.swept,
                    in_flight = report.in_flight,
                    "close all"
                );
                let _ = reply.send(());
            }
            Command::Emit {
                event,
                completion,
                timeout,
            } => self.emit(event, completion, timeout),
            Command::Restore { target, generation } => {
                let id = target.listener.id;
                let restored = self.registry.restore(target, generation);
                tracing::trace!(subscription = %id, restored, "one-shot listener restore");
            }
        }
    }

    fn emit(&mut self, event: Arc<Event>, completion: Completion, timeout: Option<Duration>) {
        let claim = self.registry.claim(event.name());
        tracing::debug!(
            event = event.name(),
            seq = event.seq,
            targets = claim.targets.len(),
            pruned = claim.pruned,
            "emit resolved"
        );

        if claim.targets.is_empty() {
            completion.finish(DeliverySummary {
                matched: claim.pruned,
                disconnected: claim.pruned,
                ..DeliverySummary::default()
            });
            return;
        }

        tokio::spawn(fan_out(
            event,
            claim.targets,
            completion,
            timeout,
            self.registry.generation(),
            self.feedback.upgrade(),
            claim.pruned,
        ));
    }

    /// Finishes queued emissions after the loop stopped; other commands are dropped.
    fn drain(&mut self) {
        self.rx.close();
        while let Ok(cmd) = self.rx.try_recv() {
            if let Command::Emit { completion, .. } = cmd {
                completion.finish(DeliverySummary::default());
            }
        }
    }
}
