//! # Emitter configuration.
//!
//! Provides [`EmitterConfig`], consumed by [`EmitterBuilder`](crate::EmitterBuilder).
//!
//! ## Sentinel values
//! - `delivery_timeout = 0s` → no timeout (emissions wait for every consumer)

use std::time::Duration;

/// Configuration for one emitter instance.
///
/// ## Field semantics
/// - `command_capacity`: Coordinator command queue size (min 1; clamped)
/// - `delivery_timeout`: Default per-emission timeout (`0s` = none)
#[derive(Clone, Debug)]
pub struct EmitterConfig {
    /// Capacity of the coordinator's command queue.
    ///
    /// When full, async operations wait and [`Emitter::try_emit`](crate::Emitter::try_emit)
    /// returns [`EmitterError::Full`](crate::EmitterError::Full).
    pub command_capacity: usize,

    /// Default timeout applied to every emission.
    ///
    /// - `Duration::ZERO` = no timeout
    /// - `> 0` = deliveries still pending after this long are abandoned
    ///
    /// Can be overridden per call with [`Emitter::emit_timeout`](crate::Emitter::emit_timeout).
    pub delivery_timeout: Duration,
}

impl EmitterConfig {
    /// Returns the command queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn command_capacity_clamped(&self) -> usize {
        self.command_capacity.max(1)
    }

    /// Returns the default delivery timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.delivery_timeout == Duration::ZERO {
            None
        } else {
            Some(self.delivery_timeout)
        }
    }
}

impl Default for EmitterConfig {
    /// - `command_capacity = 1024`
    /// - `delivery_timeout = 0s` (no timeout)
    fn default() -> Self {
        Self {
            command_capacity: 1024,
            delivery_timeout: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        let mut cfg = EmitterConfig::default();
        assert_eq!(cfg.default_timeout(), None);
        cfg.command_capacity = 0;
        assert_eq!(cfg.command_capacity_clamped(), 1);
        cfg.delivery_timeout = Duration::from_millis(5);
        assert_eq!(cfg.default_timeout(), Some(Duration::from_millis(5)));
    }
}
