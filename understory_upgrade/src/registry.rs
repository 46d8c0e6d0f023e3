// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registered component types and their post-upgrade callbacks.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use log::debug;
use understory_element_tree::{Document, NodeId};

use crate::component::{COMPONENT_CONFIG_PROPERTY, ComponentDescriptor};
use crate::error::UpgradeError;

/// Callback run after a component of a given type finishes upgrading an element.
pub type UpgradeCallback = Box<dyn FnMut(&mut Document, NodeId)>;

struct Slot {
    descriptor: Rc<ComponentDescriptor>,
    callbacks: Vec<UpgradeCallback>,
}

/// Ordered table of component types.
///
/// Registration order is the order in which types are upgraded when an element
/// carries several markers. Type ids and markers are both unique.
#[derive(Default)]
pub struct Registry {
    slots: Vec<Slot>,
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|s| (&s.descriptor, s.callbacks.len())))
            .finish()
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component type.
    ///
    /// Registering an existing type id replaces its descriptor in place, keeping its
    /// position and dropping its callbacks. A marker already used by a different
    /// type, or a declared [`COMPONENT_CONFIG_PROPERTY`], is rejected and leaves the
    /// registry unchanged.
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> Result<(), UpgradeError> {
        if let Some(other) = self
            .slots
            .iter()
            .find(|s| s.descriptor.marker() == descriptor.marker())
            .filter(|s| s.descriptor.type_id() != descriptor.type_id())
        {
            return Err(UpgradeError::DuplicateMarker {
                marker: descriptor.marker().into(),
                existing: other.descriptor.type_id().into(),
            });
        }
        if descriptor.properties().contains(&COMPONENT_CONFIG_PROPERTY) {
            return Err(UpgradeError::ReservedProperty {
                type_id: descriptor.type_id().into(),
                property: COMPONENT_CONFIG_PROPERTY,
            });
        }

        let slot = Slot {
            descriptor: Rc::new(descriptor),
            callbacks: Vec::new(),
        };
        match self.position(slot.descriptor.type_id()) {
            Some(i) => {
                debug!("replacing component `{}`", slot.descriptor.type_id());
                self.slots[i] = slot;
            }
            None => {
                debug!(
                    "registered component `{}` for marker `{}`",
                    slot.descriptor.type_id(),
                    slot.descriptor.marker()
                );
                self.slots.push(slot);
            }
        }
        Ok(())
    }

    /// Look up a component by type id.
    pub fn find(&self, type_id: &str) -> Option<&ComponentDescriptor> {
        self.slot(type_id).map(|s| &*s.descriptor)
    }

    /// Registration index of `type_id`.
    pub fn position(&self, type_id: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.descriptor.type_id() == type_id)
    }

    /// Append a callback for `type_id`.
    ///
    /// Unknown type ids are ignored.
    pub fn on_upgraded(
        &mut self,
        type_id: &str,
        callback: impl FnMut(&mut Document, NodeId) + 'static,
    ) {
        match self.slots.iter_mut().find(|s| s.descriptor.type_id() == type_id) {
            Some(slot) => slot.callbacks.push(Box::new(callback)),
            None => debug!("ignoring upgrade callback for unknown component `{type_id}`"),
        }
    }

    /// Number of callbacks registered for `type_id`.
    pub fn callback_count(&self, type_id: &str) -> usize {
        self.slot(type_id).map_or(0, |s| s.callbacks.len())
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> + '_ {
        self.slots.iter().map(|s| &*s.descriptor)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn descriptors(&self) -> impl Iterator<Item = &Rc<ComponentDescriptor>> + '_ {
        self.slots.iter().map(|s| &s.descriptor)
    }

    pub(crate) fn shared(&self, type_id: &str) -> Option<&Rc<ComponentDescriptor>> {
        self.slot(type_id).map(|s| &s.descriptor)
    }

    /// Run the callbacks for `type_id` in registration order.
    pub(crate) fn run_callbacks(&mut self, type_id: &str, document: &mut Document, element: NodeId) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.descriptor.type_id() == type_id) {
            for callback in &mut slot.callbacks {
                callback(document, element);
            }
        }
    }

    fn slot(&self, type_id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.descriptor.type_id() == type_id)
    }
}
