// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event payload carried through a dispatch.

use alloc::borrow::Cow;

use crate::types::Phase;

/// A named event dispatched to a node and its ancestors.
///
/// Events are created by the host, dispatched once, and then inspected:
/// [`Event::default_prevented`] tells the host whether to run its default action.
#[derive(Clone, Debug)]
pub struct Event<K> {
    event_type: Cow<'static, str>,
    bubbles: bool,
    cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
    target: Option<K>,
    current_target: Option<K>,
    phase: Option<Phase>,
}

impl<K: Copy> Event<K> {
    /// Create a non-bubbling, non-cancelable event of the given type.
    pub fn new(event_type: impl Into<Cow<'static, str>>) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles: false,
            cancelable: false,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
            target: None,
            current_target: None,
            phase: None,
        }
    }

    /// Set whether the event runs a bubble phase.
    #[must_use]
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Set whether [`Event::prevent_default`] has any effect.
    #[must_use]
    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    /// The event type, for example `"click"`.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Whether the event runs a bubble phase.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether the event can be canceled.
    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// Cancel the default action. Ignored for non-cancelable events.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Whether a listener canceled the default action.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop propagation after the current node's listeners have run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop propagation and skip the remaining listeners on the current node.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    /// Whether propagation was stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub(crate) fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }

    /// Node the event was dispatched to; `None` before dispatch.
    pub fn target(&self) -> Option<K> {
        self.target
    }

    /// Node whose listeners are running; `None` outside of a dispatch.
    pub fn current_target(&self) -> Option<K> {
        self.current_target
    }

    /// Phase currently running; `None` outside of a dispatch.
    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    pub(crate) fn begin(&mut self, target: K) {
        self.target = Some(target);
        self.propagation_stopped = false;
        self.immediate_propagation_stopped = false;
    }

    pub(crate) fn enter(&mut self, node: K, phase: Phase) {
        self.current_target = Some(node);
        self.phase = Some(phase);
    }

    pub(crate) fn finish(&mut self) {
        self.current_target = None;
        self.phase = None;
    }
}
