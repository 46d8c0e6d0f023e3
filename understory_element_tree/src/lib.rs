// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_element_tree --heading-base-level=0

//! Understory Element Tree: a small, DOM-like document model.
//!
//! Understory Element Tree is the structural half of a web-style widget layer.
//! It represents what markup-driven code needs to read and mutate, and nothing else:
//!
//! - A hierarchy of element, text, and comment nodes addressed by generational [`NodeId`]s.
//! - Per-element tag name, [`ClassList`], and ordered string attributes.
//! - Document-order class queries over nodes connected to the root.
//! - Event listeners and capture → target → bubble dispatch via [`understory_event_target`].
//! - [`Capabilities`] describing which host features the document exposes.
//!
//! ## Not a renderer
//!
//! There is no layout, style resolution, or painting here.
//! This crate only answers structural questions ("which elements carry this class?",
//! "who is this node's parent?") and routes events.
//!
//! ## API overview
//!
//! - [`Document`]: container owning the nodes and their listeners.
//! - [`Document::create_element`] / [`Document::create_text`] / [`Document::create_comment`] → [`NodeId`]
//! - [`Document::append_child`], [`Document::detach`], [`Document::remove`]
//! - [`Document::class_list`], [`Document::add_class`], [`Document::attribute`], [`Document::set_attribute`]
//! - [`Document::query_class`]: connected elements carrying a class, in document order.
//! - [`Document::add_event_listener`] and [`Document::dispatch_event`]
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod class_list;
mod tree;
mod types;

pub use class_list::ClassList;
pub use tree::Document;
pub use types::{Capabilities, NodeId, NodeType};
pub use understory_event_target::event::Event;
pub use understory_event_target::listeners::ListenerId;
