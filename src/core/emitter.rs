//! # Emitter: the public entry point.
//!
//! [`Emitter`] is a cheap, cloneable handle to one coordinator task. Every
//! operation is turned into a command for that task, so operations from any
//! number of handles are serialized against each other, while slow consumers
//! only hold up the emissions that target them.
//!
//! ## Example
//! ```rust
//! use eventvisor::{Emitter, Event};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), eventvisor::EmitterError> {
//!     let emitter = Emitter::new();
//!     let mut orders = emitter.on("order").await?;
//!
//!     let producer = emitter.clone();
//!     tokio::spawn(async move {
//!         let done = producer.emit(Event::new("order.created").with_arg(42u32)).await?;
//!         done.wait().await;
//!         producer.close_all("order").await
//!     });
//!
//!     while let Some(ev) = orders.recv().await {
//!         assert_eq!(ev.arg::<u32>(0), Some(&42));
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::builder::EmitterBuilder;
use super::completion::Completion;
use super::config::EmitterConfig;
use super::coordinator::Command;
use super::registry::Listener;
use crate::error::EmitterError;
use crate::events::Event;
use crate::matching::Pattern;
use crate::subscribers::{Handler, Subscription, SubscriptionId, spawn_worker};

/// Handle to a pattern-routed event emitter.
///
/// Must be created inside a tokio runtime. The coordinator stops when
/// [`shutdown`](Self::shutdown) is called or the last handle is dropped.
#[derive(Clone, Debug)]
pub struct Emitter {
    tx: mpsc::Sender<Command>,
    shutdown: CancellationToken,
    default_timeout: Option<Duration>,
}

impl Emitter {
    /// Creates an emitter with [`EmitterConfig::default`].
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn new() -> Self {
        EmitterBuilder::new(EmitterConfig::default()).build()
    }

    /// Starts a builder with the given configuration.
    pub fn builder(cfg: EmitterConfig) -> EmitterBuilder {
        EmitterBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        tx: mpsc::Sender<Command>,
        shutdown: CancellationToken,
        default_timeout: Option<Duration>,
    ) -> Self {
        Self {
            tx,
            shutdown,
            default_timeout,
        }
    }

    /// Registers a persistent listener under `pattern`.
    pub async fn on(&self, pattern: impl Into<Pattern>) -> Result<Subscription, EmitterError> {
        self.subscribe(pattern.into(), false).await
    }

    /// Registers a one-shot listener: closed and removed after its first event.
    pub async fn once(&self, pattern: impl Into<Pattern>) -> Result<Subscription, EmitterError> {
        self.subscribe(pattern.into(), true).await
    }

    async fn subscribe(&self, pattern: Pattern, once: bool) -> Result<Subscription, EmitterError> {
        let (sub, tx) = Subscription::channel(pattern.clone(), once);
        let listener = Listener::new(&sub, tx);
        self.send(Command::Subscribe { pattern, listener }).await?;
        Ok(sub)
    }

    /// Broadcasts `event` to every listener whose pattern matches its name.
    ///
    /// Returns as soon as the emission is queued; the [`Completion`] closes once
    /// every matched listener took the event (or the emission was cancelled).
    pub async fn emit(&self, event: impl Into<Event>) -> Result<Completion, EmitterError> {
        self.emit_with(event.into(), self.default_timeout).await
    }

    /// Like [`emit`](Self::emit), abandoning deliveries still pending after `timeout`.
    pub async fn emit_timeout(
        &self,
        event: impl Into<Event>,
        timeout: Duration,
    ) -> Result<Completion, EmitterError> {
        self.emit_with(event.into(), Some(timeout)).await
    }

    /// Non-blocking [`emit`](Self::emit); fails with [`EmitterError::Full`] when the
    /// command queue is saturated.
    pub fn try_emit(&self, event: impl Into<Event>) -> Result<Completion, EmitterError> {
        let completion = Completion::new();
        let cmd = Command::Emit {
            event: Arc::new(event.into()),
            completion: completion.clone(),
            timeout: self.default_timeout,
        };
        self.tx.try_send(cmd).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EmitterError::Full,
            mpsc::error::TrySendError::Closed(_) => EmitterError::Closed,
        })?;
        Ok(completion)
    }

    async fn emit_with(
        &self,
        event: Event,
        timeout: Option<Duration>,
    ) -> Result<Completion, EmitterError> {
        let completion = Completion::new();
        self.send(Command::Emit {
            event: Arc::new(event),
            completion: completion.clone(),
            timeout,
        })
        .await?;
        Ok(completion)
    }

    /// Snapshot of listener ids whose pattern is selected by `pattern`.
    pub async fn listeners(
        &self,
        pattern: impl Into<Pattern>,
    ) -> Result<Vec<SubscriptionId>, EmitterError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::List {
            query: pattern.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| EmitterError::Closed)
    }

    /// Closes and removes listener `id` registered under exactly `pattern`.
    ///
    /// The stream ends immediately, even if an emission is still trying to
    /// deliver to it. Returns `false` (and changes nothing) if no such listener
    /// exists.
    pub async fn remove_listener(
        &self,
        pattern: impl Into<Pattern>,
        id: SubscriptionId,
    ) -> Result<bool, EmitterError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Remove {
            pattern: pattern.into(),
            id,
            reply,
        })
        .await?;
        rx.await.map_err(|_| EmitterError::Closed)
    }

    /// Closes every listener under patterns selected by `pattern`, then clears
    /// the whole registry.
    pub async fn close_all(&self, pattern: impl Into<Pattern>) -> Result<(), EmitterError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CloseAll {
            query: pattern.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| EmitterError::Closed)
    }

    /// Subscribes `handler` persistently under `pattern` and drives it on a worker task.
    pub async fn attach(
        &self,
        pattern: impl Into<Pattern>,
        handler: Arc<dyn Handler>,
    ) -> Result<SubscriptionId, EmitterError> {
        let sub = self.on(pattern).await?;
        let id = sub.id();
        spawn_worker(sub, handler);
        Ok(id)
    }

    /// Stops the coordinator. Listener streams end and later calls fail with
    /// [`EmitterError::Closed`].
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// `true` once the coordinator is no longer accepting commands.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled() || self.tx.is_closed()
    }

    async fn send(&self, cmd: Command) -> Result<(), EmitterError> {
        if self.shutdown.is_cancelled() {
            return Err(EmitterError::Closed);
        }
        self.tx.send(cmd).await.map_err(|_| EmitterError::Closed)
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}
