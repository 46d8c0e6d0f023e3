// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Upgrading markup into widgets: registry, lifecycle events, and downgrade.
//!
//! This example shows how to:
//! - register components against marker classes,
//! - upgrade a document and late-added subtrees exactly once,
//! - observe and cancel upgrades through bubbling events,
//! - tear behavior back down with `downgrade_elements`.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p understory_demos --example upgrade_widgets`

use std::cell::Cell;
use std::rc::Rc;

use log::info;
use understory_element_tree::{Document, Event, ListenerId, NodeId};
use understory_upgrade::{
    Behavior, Component, ComponentDescriptor, ComponentHandler, FactoryError, Teardown,
};

/// Counts clicks on its element.
struct Button {
    clicks: Rc<Cell<u32>>,
    listener: ListenerId,
}

impl Behavior for Button {
    fn downgrade(&mut self, document: &mut Document, element: NodeId) -> Teardown {
        document.remove_event_listener(element, self.listener);
        Teardown::Complete
    }
}

impl Component for Button {
    const PROPERTIES: &'static [&'static str] = &["clicks"];

    fn upgrade(document: &mut Document, element: NodeId) -> Result<Self, FactoryError> {
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let listener = document
            .add_event_listener(element, "click", false, move |_| counter.set(counter.get() + 1))
            .ok_or("button element vanished")?;
        Ok(Self { clicks, listener })
    }
}

/// Adds a decorative ink child. Cannot be undone.
struct Ripple;

impl Behavior for Ripple {}

impl Component for Ripple {
    fn upgrade(document: &mut Document, element: NodeId) -> Result<Self, FactoryError> {
        let ink = document.create_element("span");
        document.add_class(ink, "ripple__ink");
        document.append_child(element, ink);
        Ok(Self)
    }
}

fn button(doc: &mut Document, parent: NodeId, classes: &[&str]) -> NodeId {
    let id = doc.create_element("button");
    for class in classes {
        doc.add_class(id, class);
    }
    doc.append_child(parent, id);
    id
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut doc = Document::new();
    let root = doc.root();
    let save = button(&mut doc, root, &["js-button", "js-ripple"]);
    let frozen = button(&mut doc, root, &["js-button", "frozen"]);

    // Veto upgrades of anything marked frozen.
    let veto_target = frozen;
    doc.add_event_listener(root, "component-upgrading", false, move |e: &mut Event<NodeId>| {
        if e.target() == Some(veto_target) {
            e.prevent_default();
        }
    });
    doc.add_event_listener(root, "component-upgraded", false, |e: &mut Event<NodeId>| {
        info!("upgraded {:?}", e.target());
    });

    let mut handler = ComponentHandler::default();
    handler.register(ComponentDescriptor::of::<Button>("Button", "js-button"))?;
    handler.register(ComponentDescriptor::of::<Ripple>("Ripple", "js-ripple").with_widget(false))?;
    handler.on_upgraded("Button", |doc, el| {
        doc.set_attribute(el, "role", "button");
    });
    handler.start(&mut doc)?;

    println!("save:   {:?}", doc.attribute(save, "data-upgraded"));
    println!("frozen: {:?}", doc.attribute(frozen, "data-upgraded"));

    // Content added later is upgraded on request.
    let panel = doc.create_element("section");
    let late = button(&mut doc, panel, &["js-button"]);
    doc.append_child(root, panel);
    handler.upgrade_elements(&mut doc, [panel])?;
    handler.upgrade_elements(&mut doc, [panel])?;
    println!("late:   {:?}", doc.attribute(late, "data-upgraded"));

    for _ in 0..3 {
        doc.dispatch_event(save, &mut Event::new("click").with_bubbles(true));
    }
    if let Some(widget) = handler.widget::<Button>(save, "Button") {
        println!("save clicked {} times", widget.clicks.get());
    }

    handler.downgrade_elements(&mut doc, [save])?;
    println!("after downgrade: {:?}", doc.attribute(save, "data-upgraded"));
    println!("listeners left on save: {}", doc.listener_count(save));
    Ok(())
}
