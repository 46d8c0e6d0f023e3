// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the element tree: node identifiers, node kinds, and host capabilities.

/// Identifier for a node in the document (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Kind of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// An element with a tag, class list, and attributes.
    Element,
    /// A text node.
    Text,
    /// A comment node.
    Comment,
}

bitflags::bitflags! {
    /// Host features a document exposes.
    ///
    /// A document models a host page; a reduced set describes an older or
    /// headless host. Consumers check for what they need once, up front.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Selector queries over the document (class lookups in document order).
        const QUERY_SELECTOR  = 0b0000_0001;
        /// Per-element class lists.
        const CLASS_LIST      = 0b0000_0010;
        /// Event listener registration and dispatch.
        const EVENT_LISTENERS = 0b0000_0100;
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}
