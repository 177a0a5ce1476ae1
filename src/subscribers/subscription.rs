//! # Consumer-side stream of matching events.
//!
//! A [`Subscription`] is the receive endpoint returned by
//! [`Emitter::on`](crate::Emitter::on) / [`Emitter::once`](crate::Emitter::once).
//!
//! ## Rendezvous handshake
//! ```text
//! delivery task                       Subscription::recv()
//!   send(Delivery{event, ack}) ──►       rx.recv()
//!   (slot of 1, waits if taken)            │
//!   ack_rx.await  ◄──────── ack.send(()) ──┘  Ok  → return event
//!                                             Err → delivery was abandoned, skip it
//! ```
//! A handoff only counts once the consumer took the event *and* the delivery
//! task was still waiting for it. An abandoned delivery that is still sitting in
//! the slot is discarded by the consumer, so cancelled emissions never leak
//! events.
//!
//! ## Closing
//! Every listener carries a close token shared with the registry. Removal,
//! `close_all` and shutdown cancel it; from then on the stream yields `None`,
//! even if a delivery for it is still parked in the slot. The stream also ends
//! when every sender is gone.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll, ready};

use futures::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::events::Event;
use crate::matching::Pattern;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one listener, issued at subscribe time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value (for logs).
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// One pending handoff.
pub(crate) struct Delivery {
    pub(crate) event: Arc<Event>,
    pub(crate) ack: oneshot::Sender<()>,
}

pub(crate) type ListenerTx = mpsc::Sender<Delivery>;

/// Receive-only stream of events routed to one listener.
///
/// Implements [`futures::Stream`]; [`recv`](Self::recv) is the inherent async shorthand.
pub struct Subscription {
    id: SubscriptionId,
    pattern: Pattern,
    once: bool,
    rx: mpsc::Receiver<Delivery>,
    closed: CancellationToken,
}

impl Subscription {
    /// Creates the stream and the sender half kept by the registry.
    pub(crate) fn channel(pattern: Pattern, once: bool) -> (Self, ListenerTx) {
        let (tx, rx) = mpsc::channel(1);
        let sub = Self {
            id: SubscriptionId::next(),
            pattern,
            once,
            rx,
            closed: CancellationToken::new(),
        };
        (sub, tx)
    }

    /// Close token for the registry side of this listener.
    pub(crate) fn closer(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Identity used by [`Emitter::remove_listener`](crate::Emitter::remove_listener).
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Pattern this listener was registered under.
    #[inline]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// `true` for one-shot listeners.
    #[inline]
    pub fn is_once(&self) -> bool {
        self.once
    }

    /// Waits for the next event; `None` once the listener is closed.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        std::future::poll_fn(|cx| self.poll_recv(cx)).await
    }

    /// Polls for the next event, completing the rendezvous on success.
    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Arc<Event>>> {
        loop {
            if self.closed.is_cancelled() {
                return Poll::Ready(None);
            }
            match ready!(self.rx.poll_recv(cx)) {
                Some(delivery) => {
                    // Closed while the delivery was parked: drop it unacknowledged.
                    if self.closed.is_cancelled() {
                        return Poll::Ready(None);
                    }
                    if delivery.ack.send(()).is_ok() {
                        return Poll::Ready(Some(delivery.event));
                    }
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

impl Stream for Subscription {
    type Item = Arc<Event>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_recv(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("once", &self.once)
            .finish()
    }
}
