// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_upgrade --heading-base-level=0

//! Understory Upgrade: a component registry and upgrade lifecycle for markup-driven widgets.
//!
//! ## Overview
//!
//! Markup declares intent with marker classes (`js-button`, `js-ripple`). This crate finds
//! elements carrying those markers and attaches behavior to them exactly once.
//!
//! - [`Registry`] maps a type id to a [`ComponentDescriptor`]: marker class, factory, and
//!   whether instances are published as widgets.
//! - [`ComponentHandler`] scans a [`Document`](understory_element_tree::Document), constructs
//!   behaviors, records them, runs `on_upgraded` callbacks, and dispatches lifecycle events.
//! - [`UpgradedList`] is the per-element persisted state: a comma-separated attribute naming
//!   the types already applied. Re-scanning never upgrades an element twice for the same type.
//!
//! ## Lifecycle
//!
//! Before an element receives any new type, a cancelable `component-upgrading` event bubbles
//! from it; preventing default leaves the element untouched. Each applied type then fires a
//! `component-upgraded` event. [`ComponentHandler::downgrade_elements`] asks each
//! [`Behavior`] to tear down and fires `component-downgraded` for those that did.
//!
//! Event and attribute names are configurable through [`HandlerConfig`].
//!
//! ## Example
//!
//! ```
//! use understory_element_tree::{Document, NodeId};
//! use understory_upgrade::{Behavior, Component, ComponentDescriptor, ComponentHandler, FactoryError};
//!
//! struct Button {
//!     clicks: u32,
//! }
//!
//! impl Behavior for Button {}
//!
//! impl Component for Button {
//!     fn upgrade(_: &mut Document, _: NodeId) -> Result<Self, FactoryError> {
//!         Ok(Self { clicks: 0 })
//!     }
//! }
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let button = doc.create_element("button");
//! doc.add_class(button, "js-button");
//! doc.append_child(root, button);
//!
//! let mut handler = ComponentHandler::default();
//! handler.register(ComponentDescriptor::of::<Button>("Button", "js-button")).unwrap();
//! handler.start(&mut doc).unwrap();
//!
//! assert_eq!(doc.attribute(button, "data-upgraded"), Some("Button"));
//! assert_eq!(handler.widget::<Button>(button, "Button").map(|b| b.clicks), Some(0));
//!
//! // Upgrading again changes nothing.
//! handler.upgrade_element(&mut doc, button, None).unwrap();
//! assert_eq!(handler.records(button).count(), 1);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod component;
mod config;
mod error;
mod handler;
mod registry;
mod upgraded;

pub use component::{
    Behavior, COMPONENT_CONFIG_PROPERTY, Component, ComponentDescriptor, FactoryError, Teardown,
};
pub use config::HandlerConfig;
pub use error::UpgradeError;
pub use handler::{ComponentHandler, UpgradeRecord};
pub use registry::{Registry, UpgradeCallback};
pub use upgraded::UpgradedList;
