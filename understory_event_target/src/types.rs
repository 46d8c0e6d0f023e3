// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types shared by paths, the dispatcher, and listeners.

/// Propagation phase of a dispatch entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Root → parent of the target.
    Capture,
    /// The target node itself.
    Target,
    /// Parent of the target → root.
    Bubble,
}

/// One step of a propagation sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dispatch<K> {
    /// Phase this entry belongs to.
    pub phase: Phase,
    /// Node whose listeners run for this entry.
    pub node: K,
}

impl<K> Dispatch<K> {
    /// A capture-phase entry.
    pub fn capture(node: K) -> Self {
        Self {
            phase: Phase::Capture,
            node,
        }
    }

    /// A target-phase entry.
    pub fn target(node: K) -> Self {
        Self {
            phase: Phase::Target,
            node,
        }
    }

    /// A bubble-phase entry.
    pub fn bubble(node: K) -> Self {
        Self {
            phase: Phase::Bubble,
            node,
        }
    }
}

/// Handler outcome controlling propagation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Keep walking the sequence.
    Continue,
    /// Abort propagation immediately.
    Stop,
}

/// Resolve the parent of a node so a root → target path can be reconstructed.
pub trait ParentLookup<K> {
    /// Parent of `node`, or `None` for roots and unknown nodes.
    fn parent_of(&self, node: &K) -> Option<K>;
}

/// A [`ParentLookup`] for flat targets: every node is its own root.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoParent;

impl<K> ParentLookup<K> for NoParent {
    fn parent_of(&self, _node: &K) -> Option<K> {
        None
    }
}
