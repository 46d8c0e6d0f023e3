// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Behaviors, component types, and their registration descriptors.

use alloc::boxed::Box;
use alloc::string::String;
use core::any::Any;

use understory_element_tree::{Document, NodeId};

/// Property name the controller reserves for its own bookkeeping.
///
/// Components must not list it in [`Component::PROPERTIES`].
pub const COMPONENT_CONFIG_PROPERTY: &str = "component_config";

/// Error a factory returns when it cannot build its behavior.
pub type FactoryError = Box<dyn core::error::Error>;

/// Result of asking a behavior to tear itself down.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Teardown {
    /// The behavior detached itself; the controller forgets the upgrade.
    Complete,
    /// The behavior is not reversible; the upgrade stays in place.
    Unsupported,
}

/// Behavior attached to an element by an upgrade.
///
/// Behaviors are constructed by a component factory, own whatever listeners
/// and derived structure they installed, and are kept alive by the controller
/// until a successful downgrade.
pub trait Behavior: Any {
    /// Undo the upgrade on `element`.
    ///
    /// The default reports [`Teardown::Unsupported`] without touching anything,
    /// which makes downgrading this behavior a no-op.
    fn downgrade(&mut self, document: &mut Document, element: NodeId) -> Teardown {
        let _ = (document, element);
        Teardown::Unsupported
    }
}

/// A behavior type that knows how to construct itself for an element.
///
/// ```
/// use understory_element_tree::{Document, NodeId};
/// use understory_upgrade::{Behavior, Component, ComponentDescriptor, FactoryError};
///
/// struct Ripple {
///     host: NodeId,
/// }
///
/// impl Behavior for Ripple {}
///
/// impl Component for Ripple {
///     fn upgrade(document: &mut Document, element: NodeId) -> Result<Self, FactoryError> {
///         let ink = document.create_element("span");
///         document.add_class(ink, "ripple__ink");
///         document.append_child(element, ink);
///         Ok(Self { host: element })
///     }
/// }
///
/// let descriptor = ComponentDescriptor::of::<Ripple>("Ripple", "js-ripple").with_widget(false);
/// assert_eq!(descriptor.marker(), "js-ripple");
/// ```
pub trait Component: Behavior + Sized {
    /// Property names instances of this component define up front.
    const PROPERTIES: &'static [&'static str] = &[];

    /// Build the behavior for `element`, wiring listeners and structure as needed.
    fn upgrade(document: &mut Document, element: NodeId) -> Result<Self, FactoryError>;
}

type FactoryFn = dyn Fn(&mut Document, NodeId) -> Result<Box<dyn Behavior>, FactoryError>;

/// Registration metadata for one component type.
pub struct ComponentDescriptor {
    type_id: String,
    marker: String,
    widget: bool,
    properties: &'static [&'static str],
    factory: Box<FactoryFn>,
}

impl core::fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("type_id", &self.type_id)
            .field("marker", &self.marker)
            .field("widget", &self.widget)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

impl ComponentDescriptor {
    /// Describe component type `C`, found by `marker` and registered as `type_id`.
    ///
    /// Widgets are enabled by default; see [`ComponentDescriptor::with_widget`].
    pub fn of<C: Component>(type_id: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            marker: marker.into(),
            widget: true,
            properties: C::PROPERTIES,
            factory: Box::new(|document, element| {
                let behavior = C::upgrade(document, element)?;
                Ok(Box::new(behavior) as Box<dyn Behavior>)
            }),
        }
    }

    /// Describe a component built by an arbitrary factory closure.
    pub fn from_fn<F>(type_id: impl Into<String>, marker: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&mut Document, NodeId) -> Result<Box<dyn Behavior>, FactoryError> + 'static,
    {
        Self {
            type_id: type_id.into(),
            marker: marker.into(),
            widget: true,
            properties: &[],
            factory: Box::new(factory),
        }
    }

    /// Set whether instances are published for [`widget`](crate::ComponentHandler::widget) lookup.
    #[must_use]
    pub fn with_widget(mut self, widget: bool) -> Self {
        self.widget = widget;
        self
    }

    /// Override the property names instances define up front.
    #[must_use]
    pub fn with_properties(mut self, properties: &'static [&'static str]) -> Self {
        self.properties = properties;
        self
    }

    /// Registered type id.
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// Marker class used to find candidate elements.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Whether instances are published as widgets.
    pub fn is_widget(&self) -> bool {
        self.widget
    }

    /// Property names instances define up front.
    pub fn properties(&self) -> &'static [&'static str] {
        self.properties
    }

    pub(crate) fn construct(
        &self,
        document: &mut Document,
        element: NodeId,
    ) -> Result<Box<dyn Behavior>, FactoryError> {
        (self.factory)(document, element)
    }
}
