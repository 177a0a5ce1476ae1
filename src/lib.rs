//! # eventvisor
//!
//! **eventvisor** is an in-process, pattern-routed event emitter for tokio.
//!
//! Producers emit named events carrying arbitrary arguments; consumers
//! subscribe with a name *pattern* and receive a stream of matching events.
//! Delivery is a rendezvous: an emission completes once every matched
//! consumer has taken the event, or when the producer gives up on it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Emitter    │   │   Emitter    │   │   Emitter    │
//!     │   (clone)    │   │   (clone)    │   │   (clone)    │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │  on / once / emit / listeners / remove_listener / close_all
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    command queue (bounded mpsc)                   │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                     ┌───────────────────────────┐
//!                     │       Coordinator         │
//!                     │  owns Registry:           │
//!                     │  Pattern → [Listener..]   │
//!                     └─────────────┬─────────────┘
//!                                   │ Emit: resolve matches, spawn
//!                                   ▼
//!                     ┌───────────────────────────┐
//!                     │     fan_out (per emit)    │
//!                     └───┬───────────┬───────┬───┘
//!                         ▼           ▼       ▼
//!                    deliver #1  deliver #2  deliver #N   ── race: handoff vs Completion closed
//!                         ▼           ▼       ▼
//!                   Subscription Subscription Handler worker
//! ```
//!
//! ### Emission lifecycle
//! ```text
//! emit(event) ──► Completion returned to the caller
//!
//! Coordinator:
//!   ├─► keys = registry.get_matched(event.name)
//!   ├─► persistent listeners: sender cloned, stay registered
//!   ├─► one-shot listeners:   claimed (taken out of the registry)
//!   └─► spawn fan_out(targets)
//!
//! fan_out:
//!   ├─► one delivery task per target, in registration order
//!   │     ├─ consumer took the event     ─► Delivered   (one-shot: stream closed)
//!   │     ├─ completion closed first     ─► Abandoned   (one-shot: restored)
//!   │     ├─ listener removed / closed   ─► Abandoned   (stream ends at once)
//!   │     └─ consumer dropped its stream ─► Disconnected
//!   └─► all resolved ─► Completion::finish(DeliverySummary)
//! ```
//!
//! ## Patterns
//! Plain strings are [`Pattern::Bidirectional`]: a listener pattern and an
//! emitted name match if either one, read as a regular expression, is found
//! anywhere inside the other. Typed variants ([`Pattern::exact`],
//! [`Pattern::glob`], [`Pattern::regex`]) match the whole name, one way only.
//!
//! ## Features
//! | Area              | Description                                              | Key types                              |
//! |-------------------|----------------------------------------------------------|----------------------------------------|
//! | **Emitter**       | Subscribe, emit, list, remove, bulk close.               | [`Emitter`], [`EmitterBuilder`]        |
//! | **Delivery**      | Completion signal with cooperative cancellation.         | [`Completion`], [`DeliverySummary`]    |
//! | **Consumers**     | Raw streams or async callbacks.                          | [`Subscription`], [`Handler`]          |
//! | **Routing**       | Tagged name patterns.                                    | [`Pattern`]                            |
//! | **Errors**        | Typed errors for closed / saturated emitters.            | [`EmitterError`]                       |
//! | **Configuration** | Command queue size and default delivery timeout.         | [`EmitterConfig`]                      |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogHandler`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use eventvisor::{Emitter, Event};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), eventvisor::EmitterError> {
//!     let emitter = Emitter::new();
//!     let mut greetings = emitter.once("hello").await?;
//!
//!     let done = emitter.emit(Event::new("hello").with_arg("world")).await?;
//!     let ev = greetings.recv().await.expect("one event");
//!     assert_eq!(ev.arg::<&str>(0), Some(&"world"));
//!
//!     let summary = done.settled().await;
//!     assert_eq!(summary.delivered, 1);
//!     assert!(greetings.recv().await.is_none());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod matching;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{Completion, DeliverySummary, Emitter, EmitterBuilder, EmitterConfig};
pub use error::EmitterError;
pub use events::{Arg, Event};
pub use matching::{AnchoredRegex, Bidirectional, GlobPattern, Pattern};
pub use subscribers::{Handler, Subscription, SubscriptionId};

// Optional: expose a simple built-in logging handler (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogHandler;
