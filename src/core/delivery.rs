//! # Fan-out of one emission.
//!
//! ```text
//! fan_out(event, targets)
//!   ├─► JoinSet: one deliver() per target (spawned in registration order)
//!   │      select {
//!   │        handoff: send(Delivery) → ack   ─► Delivered
//!   │        consumer dropped                 ─► Disconnected
//!   │        listener closed (remove/close)   ─► Removed    (never restored)
//!   │        completion closed                ─► Abandoned
//!   │      }
//!   ├─► optional timer: closes the completion after `timeout`
//!   ├─► join all
//!   ├─► abandoned one-shot targets ─► Command::Restore (before finishing)
//!   └─► completion.finish(summary)
//! ```
//!
//! The driver never touches the registry; everything it needs to hand back goes
//! through the coordinator's command queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::completion::{Completion, DeliverySummary};
use super::coordinator::Command;
use super::registry::Target;
use crate::events::Event;
use crate::subscribers::{Delivery, ListenerTx};

/// Resolution of a single delivery task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Delivered,
    Abandoned,
    /// The listener was closed while the handoff was pending.
    Removed,
    Disconnected,
}

/// Hands `event` to one listener, or gives up when the listener is closed or
/// the emission's `closed` fires first.
pub(crate) async fn deliver(
    event: Arc<Event>,
    tx: &ListenerTx,
    removed: &CancellationToken,
    closed: &CancellationToken,
) -> Outcome {
    let handoff = async {
        let (ack, ack_rx) = oneshot::channel();
        if tx.send(Delivery { event, ack }).await.is_err() {
            return Outcome::Disconnected;
        }
        match ack_rx.await {
            Ok(()) => Outcome::Delivered,
            // Receiver dropped the delivery unacknowledged: the stream went away.
            Err(_) => Outcome::Disconnected,
        }
    };

    tokio::select! {
        biased;
        outcome = handoff => outcome,
        _ = removed.cancelled() => Outcome::Removed,
        _ = closed.cancelled() => Outcome::Abandoned,
    }
}

/// Drives every delivery of one emission to resolution, then finishes `completion`.
pub(crate) async fn fan_out(
    event: Arc<Event>,
    targets: Vec<Target>,
    completion: Completion,
    timeout: Option<Duration>,
    generation: u64,
    feedback: Option<mpsc::Sender<Command>>,
    pruned: usize,
) {
    let mut summary = DeliverySummary {
        matched: targets.len() + pruned,
        disconnected: pruned,
        ..DeliverySummary::default()
    };

    let mut set = JoinSet::new();
    for target in targets {
        let event = Arc::clone(&event);
        let closed = completion.token().clone();
        set.spawn(async move {
            let listener = &target.listener;
            let outcome = deliver(event, &listener.tx, &listener.closed, &closed).await;
            (target, outcome)
        });
    }

    if let Some(after) = timeout {
        let closed = completion.token().clone();
        let name = Arc::clone(&event);
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(after) => {
                    if !closed.is_cancelled() {
                        tracing::debug!(event = name.name(), ?after, "delivery timeout, abandoning");
                    }
                    closed.cancel();
                }
                _ = closed.cancelled() => {}
            }
        });
    }

    let mut restores = Vec::new();
    while let Some(joined) = set.join_next().await {
        let (target, outcome) = match joined {
            Ok(res) => res,
            Err(err) => {
                tracing::warn!(event = event.name(), error = %err, "delivery task failed");
                summary.abandoned += 1;
                continue;
            }
        };

        tracing::trace!(
            event = event.name(),
            seq = event.seq,
            subscription = %target.listener.id,
            ?outcome,
            "delivery resolved"
        );

        match outcome {
            Outcome::Delivered => summary.delivered += 1,
            Outcome::Disconnected => summary.disconnected += 1,
            Outcome::Removed => summary.abandoned += 1,
            Outcome::Abandoned => {
                summary.abandoned += 1;
                if target.listener.once {
                    restores.push(target);
                }
            }
        }
        // Delivered one-shot targets are dropped here, closing their stream.
    }

    if let Some(feedback) = feedback {
        for target in restores {
            if feedback
                .send(Command::Restore { target, generation })
                .await
                .is_err()
            {
                break;
            }
        }
    }

    tracing::debug!(
        event = event.name(),
        seq = event.seq,
        matched = summary.matched,
        delivered = summary.delivered,
        abandoned = summary.abandoned,
        disconnected = summary.disconnected,
        "emission settled"
    );
    completion.finish(summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Pattern;
    use crate::subscribers::Subscription;

    #[tokio::test]
    async fn test_deliver_waits_for_consumer() {
        let (mut sub, tx) = Subscription::channel(Pattern::from("t"), false);
        let closed = CancellationToken::new();

        let task = tokio::spawn({
            let closed = closed.clone();
            let removed = sub.closer();
            async move {
                deliver(Arc::new(Event::new("t").with_arg("x")), &tx, &removed, &closed).await
            }
        });

        let ev = sub.recv().await.unwrap();
        assert_eq!(ev.arg::<&str>(0), Some(&"x"));
        assert_eq!(task.await.unwrap(), Outcome::Delivered);
    }

    #[tokio::test]
    async fn test_deliver_abandons_on_close() {
        let (mut sub, tx) = Subscription::channel(Pattern::from("t"), false);
        let closed = CancellationToken::new();
        closed.cancel();

        let outcome = deliver(Arc::new(Event::new("t")), &tx, &sub.closer(), &closed).await;
        assert_eq!(outcome, Outcome::Abandoned);

        // the abandoned event must not surface later
        drop(tx);
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_deliver_reports_disconnected() {
        let (sub, tx) = Subscription::channel(Pattern::from("t"), false);
        let removed = sub.closer();
        drop(sub);
        let outcome = deliver(Arc::new(Event::new("t")), &tx, &removed, &CancellationToken::new()).await;
        assert_eq!(outcome, Outcome::Disconnected);
    }

    #[tokio::test]
    async fn test_deliver_gives_up_when_listener_closed() {
        let (mut sub, tx) = Subscription::channel(Pattern::from("t"), false);
        let removed = sub.closer();

        let task = tokio::spawn({
            let removed = removed.clone();
            async move {
                deliver(Arc::new(Event::new("t")), &tx, &removed, &CancellationToken::new()).await
            }
        });

        // let the delivery park in the slot, then close the listener
        tokio::time::sleep(Duration::from_millis(10)).await;
        removed.cancel();
        assert_eq!(task.await.unwrap(), Outcome::Removed);
        assert!(sub.recv().await.is_none());
    }
}
