//! # Consumers of emitted events.
//!
//! ## Architecture
//! ```text
//! Emitter ── delivery task ──► [slot of 1] ──► Subscription::recv()   (manual polling)
//!                                  │
//!                                  └─────────► handler worker ──► Handler::on_event(&Event)
//! ```
//!
//! - [`Subscription`] is the raw receive stream returned by `on` / `once`.
//! - [`Handler`] is an async callback driven by a worker that owns a subscription
//!   (see [`Emitter::attach`](crate::Emitter::attach)).

mod handler;
#[cfg(feature = "logging")]
mod log;
mod subscription;

pub(crate) use handler::spawn_worker;
pub use handler::Handler;
#[cfg(feature = "logging")]
pub use log::LogHandler;
pub(crate) use subscription::{Delivery, ListenerTx};
pub use subscription::{Subscription, SubscriptionId};
