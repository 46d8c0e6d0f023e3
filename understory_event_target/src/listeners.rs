// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node listener storage and dispatch.
//!
//! Listeners are registered per node, per event type, for either the capture
//! or the bubble side of propagation. Target-phase entries run both kinds, in
//! registration order.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::dispatcher;
use crate::event::Event;
use crate::path::propagation_path;
use crate::types::{Outcome, ParentLookup, Phase};

/// Handle to a registered listener, used to remove it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<K> = Box<dyn FnMut(&mut Event<K>)>;

struct Listener<K> {
    id: ListenerId,
    event_type: Cow<'static, str>,
    capture: bool,
    callback: Callback<K>,
}

impl<K> Listener<K> {
    fn fires_in(&self, phase: Phase) -> bool {
        match phase {
            Phase::Capture => self.capture,
            Phase::Target => true,
            Phase::Bubble => !self.capture,
        }
    }
}

/// Listener store keyed by node.
pub struct EventListeners<K> {
    by_node: HashMap<K, SmallVec<[Listener<K>; 2]>>,
    next_id: u64,
}

impl<K: core::fmt::Debug> core::fmt::Debug for EventListeners<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total: usize = self.by_node.values().map(|l| l.len()).sum();
        f.debug_struct("EventListeners")
            .field("nodes", &self.by_node.len())
            .field("listeners", &total)
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Eq + Hash> Default for EventListeners<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq + Hash> EventListeners<K> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            by_node: HashMap::new(),
            next_id: 0,
        }
    }

    /// Register `callback` for `event_type` on `node`.
    ///
    /// Capture listeners run while the event travels root → target; the others
    /// run while it bubbles back. Both run at the target.
    pub fn add(
        &mut self,
        node: K,
        event_type: impl Into<Cow<'static, str>>,
        capture: bool,
        callback: impl FnMut(&mut Event<K>) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.by_node.entry(node).or_default().push(Listener {
            id,
            event_type: event_type.into(),
            capture,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a listener from `node`. Returns `false` if it was not registered there.
    pub fn remove(&mut self, node: K, id: ListenerId) -> bool {
        let Some(list) = self.by_node.get_mut(&node) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.by_node.remove(&node);
        }
        removed
    }

    /// Drop every listener registered on `node`.
    pub fn clear_node(&mut self, node: K) {
        self.by_node.remove(&node);
    }

    /// Number of listeners registered on `node`.
    pub fn count(&self, node: K) -> usize {
        self.by_node.get(&node).map_or(0, |l| l.len())
    }

    /// Dispatch `event` to `target`, walking its ancestry through `parents`.
    ///
    /// Returns `false` if a listener canceled the event, mirroring the DOM's
    /// `dispatchEvent` return value.
    pub fn dispatch(
        &mut self,
        parents: &impl ParentLookup<K>,
        target: K,
        event: &mut Event<K>,
    ) -> bool {
        let seq = propagation_path(target, parents, event.bubbles());
        event.begin(target);
        let by_node = &mut self.by_node;
        dispatcher::run(&seq, event, |d, ev| {
            ev.enter(d.node, d.phase);
            if let Some(list) = by_node.get_mut(&d.node) {
                for l in list.iter_mut() {
                    if l.event_type != ev.event_type() || !l.fires_in(d.phase) {
                        continue;
                    }
                    (l.callback)(ev);
                    if ev.immediate_propagation_stopped() {
                        break;
                    }
                }
            }
            if ev.propagation_stopped() {
                Outcome::Stop
            } else {
                Outcome::Continue
            }
        });
        event.finish();
        !event.default_prevented()
    }
}
