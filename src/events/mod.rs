//! Event data model.
//!
//! ## Contents
//! - [`Event`] immutable `(name, args)` value with sequence number and timestamp
//! - [`Arg`] opaque, cheaply-cloneable argument
//!
//! Events are created by producers and handed to [`Emitter::emit`](crate::Emitter::emit);
//! consumers receive them as `Arc<Event>` from a [`Subscription`](crate::Subscription).

mod arg;
mod event;

pub use arg::Arg;
pub use event::Event;
