//! # Events emitted through the [`Emitter`](crate::Emitter).
//!
//! An [`Event`] is an immutable `(name, args)` pair. It is built once per
//! emission and shared read-only (`Arc<Event>`) by every delivery task of that
//! emission.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events from independent emitters interleave.
//!
//! ## Example
//! ```rust
//! use eventvisor::Event;
//!
//! let ev = Event::new("user.created")
//!     .with_arg("alice")
//!     .with_arg(42u32);
//!
//! assert_eq!(ev.name(), "user.created");
//! assert_eq!(ev.arg_count(), 2);
//! assert_eq!(ev.arg::<&str>(0), Some(&"alice"));
//! assert_eq!(ev.arg::<u32>(1), Some(&42));
//! assert_eq!(ev.arg::<u32>(0), None);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use super::arg::Arg;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Named occurrence with an ordered list of opaque arguments.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    name: Arc<str>,
    args: Vec<Arg>,
}

impl Event {
    /// Creates an event without arguments, stamped with the current time and next sequence number.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Creates an event with a pre-built argument list.
    pub fn with_args(name: impl Into<Arc<str>>, args: impl IntoIterator<Item = Arg>) -> Self {
        let mut ev = Self::new(name);
        ev.args.extend(args);
        ev
    }

    /// Appends one argument.
    #[inline]
    pub fn with_arg<T>(mut self, value: T) -> Self
    where
        T: std::any::Any + Send + Sync,
    {
        self.args.push(Arg::new(value));
        self
    }

    /// Event name as supplied by the producer.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All arguments in emission order.
    #[inline]
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Typed access to the argument at `index`.
    ///
    /// Returns `None` if the index is out of range or the value has another type.
    #[inline]
    pub fn arg<T: std::any::Any>(&self, index: usize) -> Option<&T> {
        self.args.get(index).and_then(Arg::downcast_ref)
    }

    /// Number of arguments.
    #[inline]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// `true` if the event carries at least one argument.
    #[inline]
    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        Event::new(name)
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        Event::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new("a");
        let b = Event::new("b");
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_heterogeneous_args_keep_order() {
        let mut map = std::collections::HashMap::new();
        map.insert("dsds".to_string(), 33);

        let ev = Event::with_args("testc", [Arg::new("test me 1"), Arg::new(map)]);
        assert_eq!(ev.arg_count(), 2);
        assert_eq!(ev.arg::<&str>(0), Some(&"test me 1"));
        let got = ev
            .arg::<std::collections::HashMap<String, i32>>(1)
            .map(|m| m["dsds"]);
        assert_eq!(got, Some(33));
    }

    #[test]
    fn test_out_of_range_arg_is_none() {
        let ev = Event::from("empty");
        assert!(!ev.has_args());
        assert_eq!(ev.arg::<i32>(0), None);
    }
}
