//! Emitter core: registry ownership, delivery, and the public handle.
//!
//! The only public API from this module is [`Emitter`] plus the types its
//! operations exchange ([`Completion`], [`DeliverySummary`], [`EmitterConfig`],
//! [`EmitterBuilder`]).
//!
//! Internal modules:
//! - [`registry`]: pattern key → ordered listeners;
//! - [`coordinator`]: single task owning the registry, processing commands in order;
//! - [`delivery`]: per-emission fan-out with rendezvous handoffs;
//! - [`completion`]: close-once completion signal;
//! - [`emitter`]: the cloneable handle turning calls into commands.

mod builder;
mod completion;
mod config;
mod coordinator;
mod delivery;
mod emitter;
mod registry;

pub use builder::EmitterBuilder;
pub use completion::{Completion, DeliverySummary};
pub use config::EmitterConfig;
pub use emitter::Emitter;
