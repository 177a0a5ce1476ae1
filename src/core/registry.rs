//! # Listener registry: pattern key → ordered listeners.
//!
//! Owned exclusively by the coordinator task, so every method takes `&mut self`
//! without further locking.
//!
//! ## Rules
//! - Keys are [`Pattern`]s (kind + source); each key keeps listeners in registration order.
//! - A key is **not** pruned when its last listener is removed.
//! - A subscription id lives under at most one key.
//! - Closing a listener cancels its close token and drops its sender; the
//!   consumer's stream ends at once, and deliveries still in flight for it give up.
//! - One-shot listeners are *claimed* (taken out) when an emission dispatches to
//!   them and may be restored if that delivery is abandoned. While claimed they
//!   are tracked as in flight, so removal and `close_all` still reach them.
//! - `close_all` looks up selected keys, but clears the **whole** registry.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::matching::{Candidate, Pattern, Selector};
use crate::subscribers::{Delivery, ListenerTx, Subscription, SubscriptionId};

/// Registered subscription record.
pub(crate) struct Listener {
    pub(crate) id: SubscriptionId,
    pub(crate) once: bool,
    pub(crate) tx: ListenerTx,
    /// Shared with the consumer's stream and every delivery task for it.
    pub(crate) closed: CancellationToken,
}

impl Listener {
    /// Registry record for `sub`, fed through `tx`.
    pub(crate) fn new(sub: &Subscription, tx: ListenerTx) -> Self {
        Self {
            id: sub.id(),
            once: sub.is_once(),
            tx,
            closed: sub.closer(),
        }
    }

    fn close(self) {
        self.closed.cancel();
    }
}

/// Claimed one-shot listener whose delivery has not resolved yet.
struct InFlight {
    key: Pattern,
    closed: CancellationToken,
    /// Weak so a delivered one-shot still closes its stream.
    tx: mpsc::WeakSender<Delivery>,
}

impl InFlight {
    fn is_live(&self) -> bool {
        !self.closed.is_cancelled() && self.tx.upgrade().is_some()
    }
}

/// Listener resolved for one emission, together with the key it came from.
pub(crate) struct Target {
    pub(crate) key: Pattern,
    pub(crate) listener: Listener,
}

/// Result of resolving an emission against the registry.
pub(crate) struct Claim {
    pub(crate) targets: Vec<Target>,
    /// Listeners dropped because their consumer was gone.
    pub(crate) pruned: usize,
}

/// Counts reported by [`Registry::close_all`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CloseReport {
    /// Listeners under selected keys.
    pub(crate) closed: usize,
    /// Listeners under other keys, dropped by the global clear.
    pub(crate) swept: usize,
    /// Claimed one-shot listeners whose delivery was still pending.
    pub(crate) in_flight: usize,
}

pub(crate) struct Registry {
    listeners: HashMap<Pattern, Vec<Listener>>,
    in_flight: HashMap<SubscriptionId, InFlight>,
    /// Bumped by every `close_all`; stale restores are discarded.
    generation: u64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            in_flight: HashMap::new(),
            generation: 0,
        }
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Appends a listener under `pattern`, creating the key if absent.
    pub(crate) fn insert(&mut self, pattern: Pattern, listener: Listener) {
        self.listeners.entry(pattern).or_default().push(listener);
    }

    /// Keys whose pattern matches the emitted `name` (map order).
    pub(crate) fn get_matched(&self, name: &str) -> Vec<Pattern> {
        let candidate = Candidate::new(name);
        self.listeners
            .keys()
            .filter(|key| key.matches_candidate(&candidate))
            .cloned()
            .collect()
    }

    /// Keys selected by a query pattern (listing and bulk close).
    fn selected(&self, query: &Pattern) -> Vec<Pattern> {
        let selector = Selector::new(query);
        self.listeners
            .keys()
            .filter(|key| selector.selects(key))
            .cloned()
            .collect()
    }

    /// Snapshot of subscription ids under every selected key.
    pub(crate) fn list(&self, query: &Pattern) -> Vec<SubscriptionId> {
        self.selected(query)
            .iter()
            .filter_map(|key| self.listeners.get(key))
            .flat_map(|ls| ls.iter().map(|l| l.id))
            .collect()
    }

    /// Closes and removes `id` from the exact `pattern` key. Unknown ids are a no-op.
    ///
    /// A one-shot claimed by a pending emission is closed too; its delivery gives up.
    pub(crate) fn remove(&mut self, pattern: &Pattern, id: SubscriptionId) -> bool {
        if let Some(list) = self.listeners.get_mut(pattern) {
            if let Some(idx) = list.iter().position(|l| l.id == id) {
                list.remove(idx).close();
                return true;
            }
        }

        let claimed = self
            .in_flight
            .get(&id)
            .is_some_and(|f| f.key == *pattern && f.is_live());
        if claimed {
            if let Some(f) = self.in_flight.remove(&id) {
                f.closed.cancel();
            }
        }
        claimed
    }

    /// Closes every listener under keys selected by `query`, then resets the registry.
    ///
    /// Listeners under other keys and in-flight one-shots are closed by the reset.
    pub(crate) fn close_all(&mut self, query: &Pattern) -> CloseReport {
        let mut report = CloseReport::default();
        for key in self.selected(query) {
            if let Some(list) = self.listeners.remove(&key) {
                report.closed += list.len();
                list.into_iter().for_each(Listener::close);
            }
        }
        let (swept, in_flight) = self.close_every();
        report.swept = swept;
        report.in_flight = in_flight;
        self.generation += 1;
        report
    }

    /// Closes and forgets every listener, registered or in flight.
    ///
    /// Returns `(registered, in_flight)` counts.
    pub(crate) fn close_every(&mut self) -> (usize, usize) {
        let mut registered = 0;
        for (_, list) in self.listeners.drain() {
            registered += list.len();
            list.into_iter().for_each(Listener::close);
        }
        let mut in_flight = 0;
        for (_, f) in self.in_flight.drain() {
            if f.is_live() {
                in_flight += 1;
            }
            f.closed.cancel();
        }
        (registered, in_flight)
    }

    /// Resolves the targets of an emission.
    ///
    /// Persistent listeners stay registered (the target holds a sender clone);
    /// one-shot listeners are moved out and tracked as in flight. Listeners whose
    /// consumer is gone are dropped.
    pub(crate) fn claim(&mut self, name: &str) -> Claim {
        let mut claim = Claim {
            targets: Vec::new(),
            pruned: 0,
        };
        self.in_flight.retain(|_, f| f.is_live());

        for key in self.get_matched(name) {
            let Some(list) = self.listeners.get_mut(&key) else {
                continue;
            };
            let mut kept = Vec::with_capacity(list.len());
            for l in list.drain(..) {
                if l.tx.is_closed() {
                    claim.pruned += 1;
                    continue;
                }
                if l.once {
                    self.in_flight.insert(
                        l.id,
                        InFlight {
                            key: key.clone(),
                            closed: l.closed.clone(),
                            tx: l.tx.downgrade(),
                        },
                    );
                    claim.targets.push(Target {
                        key: key.clone(),
                        listener: l,
                    });
                } else {
                    claim.targets.push(Target {
                        key: key.clone(),
                        listener: Listener {
                            id: l.id,
                            once: false,
                            tx: l.tx.clone(),
                            closed: l.closed.clone(),
                        },
                    });
                    kept.push(l);
                }
            }
            *list = kept;
        }
        claim
    }

    /// Puts back a claimed one-shot listener whose delivery was abandoned.
    ///
    /// Discarded (and thereby closed) if a `close_all` ran since the claim or
    /// the listener was removed meanwhile. The listener goes to the end of its
    /// key's sequence.
    pub(crate) fn restore(&mut self, target: Target, generation: u64) -> bool {
        self.in_flight.remove(&target.listener.id);
        if generation != self.generation
            || target.listener.closed.is_cancelled()
            || target.listener.tx.is_closed()
        {
            target.listener.close();
            return false;
        }
        self.insert(target.key, target.listener);
        true
    }

    /// Number of listeners under the exact key.
    pub(crate) fn count(&self, pattern: &Pattern) -> usize {
        self.listeners.get(pattern).map_or(0, Vec::len)
    }

    /// Total number of registered listeners.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscribe(reg: &mut Registry, pattern: &str, once: bool) -> Subscription {
        let pattern = Pattern::from(pattern);
        let (sub, tx) = Subscription::channel(pattern.clone(), once);
        reg.insert(pattern, Listener::new(&sub, tx));
        sub
    }

    #[test]
    fn test_list_with_wildcard_query() {
        let mut reg = Registry::new();
        let _a = subscribe(&mut reg, "ls", false);
        let b = subscribe(&mut reg, "ls2", false);
        let _c = subscribe(&mut reg, "ls3", false);
        let _other = subscribe(&mut reg, "zz", false);

        assert_eq!(reg.list(&Pattern::from("ls*")).len(), 3);
        assert!(reg.remove(&Pattern::from("ls2"), b.id()));
        assert_eq!(reg.list(&Pattern::from("ls*")).len(), 2);
    }

    #[test]
    fn test_remove_is_exact_key_and_noop_when_absent() {
        let mut reg = Registry::new();
        let a = subscribe(&mut reg, "ls2", false);

        // "ls" would match "ls2" as a pattern, but removal uses the literal key
        assert!(!reg.remove(&Pattern::from("ls"), a.id()));
        assert!(!reg.remove(&Pattern::from("missing"), a.id()));
        assert_eq!(reg.len(), 1);

        assert!(reg.remove(&Pattern::from("ls2"), a.id()));
        assert!(!reg.remove(&Pattern::from("ls2"), a.id()));
        // key survives, empty
        assert_eq!(reg.count(&Pattern::from("ls2")), 0);
        assert_eq!(reg.listeners.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_closes_stream() {
        let mut reg = Registry::new();
        let mut a = subscribe(&mut reg, "x", false);
        reg.remove(&Pattern::from("x"), a.id());
        assert!(a.recv().await.is_none());
    }

    #[test]
    fn test_claim_takes_once_keeps_persistent() {
        let mut reg = Registry::new();
        let p = subscribe(&mut reg, "t", false);
        let o = subscribe(&mut reg, "t", true);

        let claim = reg.claim("t");
        let ids: Vec<_> = claim.targets.iter().map(|t| t.listener.id).collect();
        assert_eq!(ids, vec![p.id(), o.id()]);
        assert_eq!(reg.list(&Pattern::from("t")), vec![p.id()]);
    }

    #[test]
    fn test_claim_prunes_dropped_consumers() {
        let mut reg = Registry::new();
        let gone = subscribe(&mut reg, "t", false);
        let _kept = subscribe(&mut reg, "t", false);
        drop(gone);

        let claim = reg.claim("t");
        assert_eq!(claim.pruned, 1);
        assert_eq!(claim.targets.len(), 1);
        assert_eq!(reg.count(&Pattern::from("t")), 1);
    }

    #[test]
    fn test_restore_respects_generation() {
        let mut reg = Registry::new();
        let _o = subscribe(&mut reg, "t", true);
        let _q = subscribe(&mut reg, "t", true);

        let generation = reg.generation();
        let mut claim = reg.claim("t");
        let second = claim.targets.pop().unwrap();
        let first = claim.targets.pop().unwrap();

        assert!(reg.restore(first, generation));
        assert_eq!(reg.count(&Pattern::from("t")), 1);

        reg.close_all(&Pattern::from("nothing-matches-this"));
        assert!(!reg.restore(second, generation));
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn test_close_all_is_scoped_lookup_global_clear() {
        let mut reg = Registry::new();
        let _a = subscribe(&mut reg, "testw*", false);
        let _b = subscribe(&mut reg, "other", false);

        let report = reg.close_all(&Pattern::from("testw*"));
        assert_eq!(
            report,
            CloseReport {
                closed: 1,
                swept: 1,
                in_flight: 0
            }
        );
        assert_eq!(reg.len(), 0);
        assert!(reg.listeners.is_empty());
    }

    #[tokio::test]
    async fn test_remove_reaches_claimed_once_listener() {
        let mut reg = Registry::new();
        let mut o = subscribe(&mut reg, "t", true);

        let generation = reg.generation();
        let mut claim = reg.claim("t");
        let target = claim.targets.pop().unwrap();
        assert!(reg.list(&Pattern::from("t")).is_empty());

        // wrong key: still a no-op
        assert!(!reg.remove(&Pattern::from("other"), o.id()));
        assert!(reg.remove(&Pattern::from("t"), o.id()));
        assert!(target.listener.closed.is_cancelled());

        // the abandoned delivery must not bring it back
        assert!(!reg.restore(target, generation));
        assert_eq!(reg.len(), 0);
        assert!(o.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_close_all_cancels_in_flight_targets() {
        let mut reg = Registry::new();
        let mut p = subscribe(&mut reg, "t", false);
        let mut o = subscribe(&mut reg, "t", true);

        let claim = reg.claim("t");
        let report = reg.close_all(&Pattern::from("t"));
        assert_eq!(report.closed, 1);
        assert_eq!(report.in_flight, 1);
        assert!(claim.targets.iter().all(|t| t.listener.closed.is_cancelled()));

        // targets still hold senders, yet both streams are closed
        assert!(p.recv().await.is_none());
        assert!(o.recv().await.is_none());
        drop(claim);
    }

    #[test]
    fn test_delivered_once_is_forgotten() {
        let mut reg = Registry::new();
        let o = subscribe(&mut reg, "t", true);

        let claim = reg.claim("t");
        // delivered: the fan-out drops the target
        drop(claim);
        assert!(!reg.remove(&Pattern::from("t"), o.id()));
    }

    #[test]
    fn test_get_matched_is_bidirectional() {
        let mut reg = Registry::new();
        let _a = subscribe(&mut reg, "testw*", false);
        let _b = subscribe(&mut reg, "unrelated", false);

        assert_eq!(reg.get_matched("testw1"), vec![Pattern::from("testw*")]);
        assert!(reg.get_matched("nomatch").is_empty());
    }
}
