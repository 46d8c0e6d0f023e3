// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_event_target --heading-base-level=0

//! Understory Event Target: DOM-style event propagation for any parent-linked tree.
//!
//! ## Overview
//!
//! This crate owns the listener side of a document: who listens to what, on which node, in which phase.
//! It does not own the tree.
//! Instead, the host supplies a [`ParentLookup`](crate::types::ParentLookup) so the crate can reconstruct
//! the root → target path for a dispatch.
//!
//! ## Propagation
//!
//! [`propagation_path`](crate::path::propagation_path) emits the capture → target → bubble sequence for a target:
//!
//! - Capture: root → parent of target.
//! - Target: only the target node.
//! - Bubble: parent of target → root, only when the [`Event`](crate::event::Event) bubbles.
//!
//! [`dispatcher::run`] walks a sequence and honors [`Outcome::Stop`](crate::types::Outcome::Stop).
//! [`EventListeners::dispatch`](crate::listeners::EventListeners::dispatch) combines both and
//! invokes the listeners registered on each node along the way.
//!
//! ## Cancelation
//!
//! Stopping propagation and preventing the default action live on the [`Event`](crate::event::Event),
//! not in the dispatcher. A listener calls [`Event::prevent_default`](crate::event::Event::prevent_default)
//! (honored only for cancelable events) or [`Event::stop_propagation`](crate::event::Event::stop_propagation).
//!
//! ```
//! use understory_event_target::event::Event;
//! use understory_event_target::listeners::EventListeners;
//! use understory_event_target::types::ParentLookup;
//!
//! #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
//! struct Node(u32);
//!
//! struct Parents;
//! impl ParentLookup<Node> for Parents {
//!     fn parent_of(&self, node: &Node) -> Option<Node> {
//!         (node.0 > 1).then(|| Node(node.0 - 1))
//!     }
//! }
//!
//! let mut listeners = EventListeners::new();
//! listeners.add(Node(1), "change", false, |ev: &mut Event<Node>| ev.prevent_default());
//!
//! // Dispatched on Node(3), the event bubbles up to Node(1), whose listener cancels it.
//! let mut ev = Event::new("change").with_bubbles(true).with_cancelable(true);
//! let not_canceled = listeners.dispatch(&Parents, Node(3), &mut ev);
//! assert!(!not_canceled);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod dispatcher;
pub mod event;
pub mod listeners;
pub mod path;
pub mod types;
