//! # Callback-style consumers.
//!
//! [`Handler`] is the extension point for plugging async callbacks into the
//! emitter instead of polling a [`Subscription`] by hand. Each attached handler
//! is driven by a dedicated worker task that owns a persistent subscription.
//!
//! ## Contract
//! - The worker takes an event (completing the rendezvous) and then awaits
//!   `on_event`; a slow handler therefore delays *its own* next handoff, which
//!   in turn keeps later emissions' completions pending.
//! - Panics inside `on_event` are caught, logged, and the worker keeps going.
//!
//! ## Example
//! ```rust
//! use eventvisor::{Event, Handler};
//! use async_trait::async_trait;
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Handler for Audit {
//!     async fn on_event(&self, ev: &Event) {
//!         let _ = ev.name();
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinHandle;

use super::subscription::Subscription;
use crate::events::Event;

/// Contract for event handlers.
///
/// Called from a handler-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Spawns the worker loop feeding `sub` into `handler` until the stream ends.
pub(crate) fn spawn_worker(mut sub: Subscription, handler: Arc<dyn Handler>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let id = sub.id();
        while let Some(ev) = sub.recv().await {
            let fut = handler.on_event(ev.as_ref());

            if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                let info = panic_message(&*panic_err);
                tracing::warn!(
                    handler = handler.name(),
                    subscription = %id,
                    event = ev.name(),
                    panic = %info,
                    "handler panicked"
                );
            }
        }
        tracing::debug!(handler = handler.name(), subscription = %id, "handler stream closed");
    })
}

fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Pattern;
    use crate::subscribers::subscription::Delivery;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    struct Flaky {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl Handler for Flaky {
        async fn on_event(&self, event: &Event) {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if event.name() == "boom" {
                panic!("boom");
            }
        }
    }

    #[tokio::test]
    async fn test_worker_survives_handler_panic() {
        let (sub, tx) = Subscription::channel(Pattern::from("any"), false);
        let handler = Arc::new(Flaky {
            seen: AtomicUsize::new(0),
        });
        let worker = spawn_worker(sub, handler.clone());

        for name in ["boom", "ok"] {
            let (ack, ack_rx) = oneshot::channel();
            tx.send(Delivery {
                event: Arc::new(Event::new(name)),
                ack,
            })
            .await
            .unwrap();
            ack_rx.await.unwrap();
        }

        drop(tx);
        worker.await.unwrap();
        assert_eq!(handler.seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic");
    }
}
