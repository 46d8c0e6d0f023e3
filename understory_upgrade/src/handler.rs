// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The upgrade controller.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;
use log::{debug, trace, warn};
use smallvec::{SmallVec, smallvec};
use understory_element_tree::{Document, Event, NodeId};

use crate::component::{Behavior, ComponentDescriptor, Teardown};
use crate::config::HandlerConfig;
use crate::error::UpgradeError;
use crate::registry::Registry;
use crate::upgraded::UpgradedList;

/// One component instance attached to one element.
pub struct UpgradeRecord {
    element: NodeId,
    descriptor: Rc<ComponentDescriptor>,
    instance: Box<dyn Behavior>,
}

impl core::fmt::Debug for UpgradeRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UpgradeRecord")
            .field("element", &self.element)
            .field("type_id", &self.descriptor.type_id())
            .finish_non_exhaustive()
    }
}

impl UpgradeRecord {
    /// The upgraded element.
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// Descriptor the instance was built from.
    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    /// Shorthand for `descriptor().type_id()`.
    pub fn type_id(&self) -> &str {
        self.descriptor.type_id()
    }

    /// The behavior instance.
    pub fn instance(&self) -> &dyn Behavior {
        &*self.instance
    }

    /// The behavior instance, mutably.
    pub fn instance_mut(&mut self) -> &mut dyn Behavior {
        &mut *self.instance
    }
}

type Records = SmallVec<[UpgradeRecord; 2]>;

/// Registry plus upgrade/downgrade lifecycle over a [`Document`].
///
/// The handler owns every behavior it constructs. The set of types applied to an
/// element is persisted on the element in [`HandlerConfig::upgraded_attribute`], which
/// makes repeated upgrades idempotent.
///
/// For each type applied to an element the steps run strictly in this order:
///
/// 1. the type id is appended to the element's upgraded list,
/// 2. the factory constructs the behavior,
/// 3. the instance is recorded and, for widgets, published,
/// 4. `on_upgraded` callbacks for the type run in registration order,
/// 5. a bubbling, non-cancelable upgraded event is dispatched on the element.
pub struct ComponentHandler {
    config: HandlerConfig,
    registry: Registry,
    records: HashMap<NodeId, Records>,
    enabled: bool,
}

impl core::fmt::Debug for ComponentHandler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComponentHandler")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("upgraded_elements", &self.records.len())
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl Default for ComponentHandler {
    fn default() -> Self {
        Self::new(HandlerConfig::default())
    }
}

impl ComponentHandler {
    /// Create a handler with an empty registry.
    pub fn new(config: HandlerConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
            records: HashMap::new(),
            enabled: true,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// The component registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether upgrades are still enabled.
    ///
    /// Becomes `false` permanently once [`start`](Self::start) finds the host lacking.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Register a component type. See [`Registry::register`].
    ///
    /// Does nothing once the handler is disabled.
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> Result<(), UpgradeError> {
        if !self.enabled {
            trace!("handler disabled; ignoring `{}`", descriptor.type_id());
            return Ok(());
        }
        self.registry.register(descriptor)
    }

    /// Look up a registered component by type id.
    pub fn find(&self, type_id: &str) -> Option<&ComponentDescriptor> {
        self.registry.find(type_id)
    }

    /// Run `callback` after each future upgrade of `type_id`.
    ///
    /// Unknown type ids are ignored. Re-registering the type drops its callbacks.
    pub fn on_upgraded(
        &mut self,
        type_id: &str,
        callback: impl FnMut(&mut Document, NodeId) + 'static,
    ) {
        self.registry.on_upgraded(type_id, callback);
    }

    /// Check the host and upgrade everything registered so far.
    ///
    /// If `document` lacks any of [`HandlerConfig::required_capabilities`], the handler
    /// logs a warning and disables itself: later registrations and upgrades do nothing.
    pub fn start(&mut self, document: &mut Document) -> Result<(), UpgradeError> {
        let missing = self
            .config
            .required_capabilities
            .difference(document.capabilities());
        if !missing.is_empty() {
            warn!("document lacks {missing:?}; component upgrades are disabled");
            self.enabled = false;
            return Ok(());
        }
        self.upgrade_all_registered(document)
    }

    /// Upgrade every registered type across the document, in registration order.
    pub fn upgrade_all_registered(&mut self, document: &mut Document) -> Result<(), UpgradeError> {
        let type_ids: Vec<String> = self.registry.iter().map(|d| d.type_id().into()).collect();
        for type_id in &type_ids {
            self.upgrade_dom(document, Some(type_id.as_str()), None)?;
        }
        Ok(())
    }

    /// Upgrade connected elements carrying a marker with `type_id`.
    ///
    /// Without a type id this is [`upgrade_all_registered`](Self::upgrade_all_registered).
    /// The marker defaults to the registered one; an unregistered type with no explicit
    /// marker is a no-op. Matches are processed in document order.
    pub fn upgrade_dom(
        &mut self,
        document: &mut Document,
        type_id: Option<&str>,
        marker: Option<&str>,
    ) -> Result<(), UpgradeError> {
        let Some(type_id) = type_id else {
            return self.upgrade_all_registered(document);
        };
        let marker: String = match (marker, self.registry.find(type_id)) {
            (Some(marker), _) => marker.into(),
            (None, Some(descriptor)) => descriptor.marker().into(),
            (None, None) => {
                debug!("upgrade_dom: `{type_id}` is not registered");
                return Ok(());
            }
        };
        for element in document.query_class(&marker) {
            // An earlier factory may have removed it.
            if !document.is_alive(element) {
                continue;
            }
            self.upgrade_element(document, element, Some(type_id))?;
        }
        Ok(())
    }

    /// Upgrade one element.
    ///
    /// With `type_id`, only that type is applied, whether or not the element carries its
    /// marker. Without it, every registered type whose marker the element carries is
    /// applied in registration order. Types already listed on the element, or still
    /// attached to it, are skipped; attached types missing from the list are written back.
    ///
    /// If anything is left to apply, a bubbling, cancelable upgrading event is
    /// dispatched first; canceling it leaves the element untouched.
    ///
    /// A factory error aborts the call with [`UpgradeError::Construction`]. Types applied
    /// earlier in the same call stay upgraded and the failing type is taken back off
    /// the element's upgraded list.
    ///
    /// If a factory removes the element from the document, the remaining types are
    /// skipped and the handler drops every record it held for that element.
    pub fn upgrade_element(
        &mut self,
        document: &mut Document,
        element: NodeId,
        type_id: Option<&str>,
    ) -> Result<(), UpgradeError> {
        if !self.enabled {
            return Ok(());
        }
        if !document.is_element(element) {
            return Err(UpgradeError::InvalidArgument(
                "upgrade_element requires a live element",
            ));
        }

        let explicit = match type_id {
            Some(type_id) => Some(
                self.registry
                    .shared(type_id)
                    .cloned()
                    .ok_or_else(|| UpgradeError::UnknownComponent(type_id.into()))?,
            ),
            None => None,
        };
        let upgraded = self.sync_upgraded(document, element);
        let pending: SmallVec<[Rc<ComponentDescriptor>; 2]> = match explicit {
            Some(descriptor) if upgraded.contains(descriptor.type_id()) => SmallVec::new(),
            Some(descriptor) => smallvec![descriptor],
            None => self
                .registry
                .descriptors()
                .filter(|d| document.has_class(element, d.marker()))
                .filter(|d| !upgraded.contains(d.type_id()))
                .cloned()
                .collect(),
        };
        if pending.is_empty() {
            trace!("{element:?}: nothing to upgrade");
            return Ok(());
        }

        let mut upgrading = Event::new(self.config.upgrading_event)
            .with_bubbles(true)
            .with_cancelable(true);
        if !document.dispatch_event(element, &mut upgrading) {
            debug!("{element:?}: upgrade canceled by listener");
            return Ok(());
        }

        for descriptor in pending {
            self.apply(document, element, descriptor)?;
            if !document.is_alive(element) {
                debug!("{element:?}: removed while upgrading; dropping its records");
                self.records.remove(&element);
                break;
            }
        }
        Ok(())
    }

    /// Upgrade each node's element subtree, children before their parent.
    ///
    /// Stale ids and non-element nodes are skipped.
    pub fn upgrade_elements(
        &mut self,
        document: &mut Document,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> Result<(), UpgradeError> {
        for node in nodes {
            self.upgrade_subtree(document, node)?;
        }
        Ok(())
    }

    /// Tear down every component attached to each node.
    ///
    /// Behaviors reporting [`Teardown::Unsupported`] stay attached. All ids are checked
    /// before anything is torn down; a stale id fails the whole call.
    pub fn downgrade_elements(
        &mut self,
        document: &mut Document,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> Result<(), UpgradeError> {
        let nodes: SmallVec<[NodeId; 4]> = nodes.into_iter().collect();
        if nodes.iter().any(|&node| !document.is_alive(node)) {
            return Err(UpgradeError::InvalidArgument(
                "downgrade_elements requires live nodes",
            ));
        }
        for node in nodes {
            self.downgrade_node(document, node);
        }
        Ok(())
    }

    /// Records attached to `element`, in upgrade order.
    pub fn records(&self, element: NodeId) -> impl Iterator<Item = &UpgradeRecord> + '_ {
        self.records.get(&element).into_iter().flatten()
    }

    /// The behavior of type `type_id` attached to `element`.
    pub fn instance(&self, element: NodeId, type_id: &str) -> Option<&dyn Behavior> {
        self.record(element, type_id).map(UpgradeRecord::instance)
    }

    /// The behavior of type `type_id` attached to `element`, mutably.
    pub fn instance_mut(&mut self, element: NodeId, type_id: &str) -> Option<&mut dyn Behavior> {
        self.records
            .get_mut(&element)?
            .iter_mut()
            .find(|r| r.type_id() == type_id)
            .map(UpgradeRecord::instance_mut)
    }

    /// The published widget of type `type_id` on `element`, downcast to `T`.
    ///
    /// Returns `None` if the component is not a widget or `T` is the wrong type.
    pub fn widget<T: Behavior>(&self, element: NodeId, type_id: &str) -> Option<&T> {
        let record = self.record(element, type_id)?;
        if !record.descriptor.is_widget() {
            return None;
        }
        let any: &dyn core::any::Any = &*record.instance;
        any.downcast_ref()
    }

    /// Mutable counterpart of [`widget`](Self::widget).
    pub fn widget_mut<T: Behavior>(&mut self, element: NodeId, type_id: &str) -> Option<&mut T> {
        let record = self
            .records
            .get_mut(&element)?
            .iter_mut()
            .find(|r| r.type_id() == type_id)?;
        if !record.descriptor.is_widget() {
            return None;
        }
        let any: &mut dyn core::any::Any = &mut *record.instance;
        any.downcast_mut()
    }

    /// Type ids persisted on `element`.
    pub fn upgraded_types(&self, document: &Document, element: NodeId) -> UpgradedList {
        UpgradedList::read(document, element, self.config.upgraded_attribute)
    }

    /// Whether `element` lists `type_id` as applied.
    pub fn is_upgraded(&self, document: &Document, element: NodeId, type_id: &str) -> bool {
        self.upgraded_types(document, element).contains(type_id)
    }

    // --- internals ---

    fn record(&self, element: NodeId, type_id: &str) -> Option<&UpgradeRecord> {
        self.records(element).find(|r| r.type_id() == type_id)
    }

    fn apply(
        &mut self,
        document: &mut Document,
        element: NodeId,
        descriptor: Rc<ComponentDescriptor>,
    ) -> Result<(), UpgradeError> {
        let attribute = self.config.upgraded_attribute;
        let type_id = descriptor.type_id();

        let previous = document.attribute(element, attribute).map(String::from);
        let mut upgraded = previous
            .as_deref()
            .map(UpgradedList::parse)
            .unwrap_or_default();
        upgraded.insert(type_id);
        upgraded.write(document, element, attribute);

        let instance = match descriptor.construct(document, element) {
            Ok(instance) => instance,
            Err(source) => {
                warn!("{element:?}: constructing `{type_id}` failed: {source}");
                if document.is_alive(element) {
                    let mut current = UpgradedList::read(document, element, attribute);
                    current.remove(type_id);
                    if current.is_empty() && previous.is_none() {
                        document.remove_attribute(element, attribute);
                    } else {
                        current.write(document, element, attribute);
                    }
                } else {
                    self.records.remove(&element);
                }
                return Err(UpgradeError::Construction {
                    type_id: type_id.into(),
                    source,
                });
            }
        };
        if !document.is_alive(element) {
            return Ok(());
        }

        self.records
            .entry(element)
            .or_default()
            .push(UpgradeRecord {
                element,
                descriptor: descriptor.clone(),
                instance,
            });
        self.registry.run_callbacks(type_id, document, element);

        let mut upgraded_event = Event::new(self.config.upgraded_event).with_bubbles(true);
        document.dispatch_event(element, &mut upgraded_event);
        debug!("{element:?}: upgraded with `{type_id}`");
        Ok(())
    }

    /// Post-order walk with an explicit stack; `true` marks an element whose children are queued.
    fn upgrade_subtree(&mut self, document: &mut Document, node: NodeId) -> Result<(), UpgradeError> {
        let mut stack: Vec<(NodeId, bool)> = vec![(node, false)];
        while let Some((id, expanded)) = stack.pop() {
            if !document.is_element(id) {
                continue;
            }
            if expanded {
                self.upgrade_element(document, id, None)?;
                continue;
            }
            stack.push((id, true));
            let first_child = stack.len();
            stack.extend(document.element_children(id).map(|c| (c, false)));
            stack[first_child..].reverse();
        }
        Ok(())
    }

    /// Read the upgraded list, restoring any type that still has a record.
    fn sync_upgraded(&self, document: &mut Document, element: NodeId) -> UpgradedList {
        let attribute = self.config.upgraded_attribute;
        let mut upgraded = UpgradedList::read(document, element, attribute);
        let mut restored = false;
        for record in self.records(element) {
            restored |= upgraded.insert(record.type_id());
        }
        if restored {
            debug!("{element:?}: restored `{attribute}` from attached components");
            upgraded.write(document, element, attribute);
        }
        upgraded
    }

    fn downgrade_node(&mut self, document: &mut Document, node: NodeId) {
        let Some(records) = self.records.remove(&node) else {
            return;
        };
        let attribute = self.config.upgraded_attribute;
        let mut kept = Records::new();
        for mut record in records {
            match record.instance.downgrade(document, node) {
                Teardown::Unsupported => {
                    trace!("{node:?}: `{}` cannot be downgraded", record.type_id());
                    kept.push(record);
                }
                Teardown::Complete => {
                    let mut upgraded = UpgradedList::read(document, node, attribute);
                    upgraded.remove(record.type_id());
                    upgraded.write(document, node, attribute);
                    debug!("{node:?}: downgraded `{}`", record.type_id());

                    let mut downgraded =
                        Event::new(self.config.downgraded_event).with_bubbles(true);
                    document.dispatch_event(node, &mut downgraded);
                }
            }
        }
        if !kept.is_empty() {
            self.records.insert(node, kept);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, FactoryError};
    use alloc::vec;
    use core::cell::RefCell;
    use understory_element_tree::{Capabilities, NodeType};

    type Log = Rc<RefCell<Vec<String>>>;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn element(doc: &mut Document, parent: NodeId, classes: &[&str]) -> NodeId {
        let id = doc.create_element("div");
        for class in classes {
            doc.add_class(id, class);
        }
        assert!(doc.append_child(parent, id));
        id
    }

    fn listen(doc: &mut Document, node: NodeId, event_type: &'static str, log: &Log) {
        let log = log.clone();
        doc.add_event_listener(node, event_type, false, move |e| {
            log.borrow_mut().push(e.event_type().into());
        })
        .unwrap();
    }

    #[derive(Debug)]
    struct Boom;

    impl core::fmt::Display for Boom {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.write_str("boom")
        }
    }

    impl core::error::Error for Boom {}

    struct Counter {
        hits: u32,
    }

    impl Behavior for Counter {}

    impl Component for Counter {
        fn upgrade(_: &mut Document, _: NodeId) -> Result<Self, FactoryError> {
            Ok(Self { hits: 0 })
        }
    }

    /// Adds an ink child on upgrade and removes it on downgrade.
    struct Ink {
        ink: NodeId,
    }

    impl Behavior for Ink {
        fn downgrade(&mut self, document: &mut Document, _: NodeId) -> Teardown {
            document.remove(self.ink);
            Teardown::Complete
        }
    }

    impl Component for Ink {
        fn upgrade(document: &mut Document, element: NodeId) -> Result<Self, FactoryError> {
            let ink = document.create_element("span");
            document.append_child(element, ink);
            Ok(Self { ink })
        }
    }

    fn failing(type_id: &str, marker: &str) -> ComponentDescriptor {
        ComponentDescriptor::from_fn(type_id, marker, |_, _| Err(Boom.into()))
    }

    #[test]
    fn btn_upgrade_runs_steps_in_order() {
        init_logging();
        let mut doc = Document::new();
        let root = doc.root();
        let btn = element(&mut doc, root, &["js-btn"]);
        let log: Log = Rc::default();
        listen(&mut doc, root, "component-upgrading", &log);
        listen(&mut doc, root, "component-upgraded", &log);

        let mut handler = ComponentHandler::default();
        let factory_log = log.clone();
        handler
            .register(ComponentDescriptor::from_fn("Btn", "js-btn", move |doc, el| {
                // The marker is persisted before construction.
                assert_eq!(doc.attribute(el, "data-upgraded"), Some("Btn"));
                factory_log.borrow_mut().push("construct".into());
                Ok(Box::new(Counter { hits: 0 }))
            }))
            .unwrap();
        let callback_log = log.clone();
        handler.on_upgraded("Btn", move |_, _| {
            callback_log.borrow_mut().push("callback".into());
        });

        handler.start(&mut doc).unwrap();

        assert_eq!(doc.attribute(btn, "data-upgraded"), Some("Btn"));
        assert_eq!(
            *log.borrow(),
            ["component-upgrading", "construct", "callback", "component-upgraded"]
        );
        let records: Vec<_> = handler.records(btn).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].type_id(), "Btn");
        assert_eq!(records[0].element(), btn);
        assert!(handler.widget::<Counter>(btn, "Btn").is_some());
    }

    #[test]
    fn repeated_upgrades_are_idempotent() {
        let mut doc = Document::new();
        let root = doc.root();
        let btn = element(&mut doc, root, &["js-btn"]);
        let log: Log = Rc::default();
        listen(&mut doc, btn, "component-upgrading", &log);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Counter>("Btn", "js-btn"))
            .unwrap();
        handler.start(&mut doc).unwrap();
        handler.upgrade_dom(&mut doc, Some("Btn"), None).unwrap();
        handler.upgrade_element(&mut doc, btn, None).unwrap();
        handler.upgrade_element(&mut doc, btn, Some("Btn")).unwrap();
        handler.upgrade_elements(&mut doc, [root]).unwrap();

        assert_eq!(handler.records(btn).count(), 1);
        assert_eq!(doc.attribute(btn, "data-upgraded"), Some("Btn"));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn multiple_markers_apply_in_registration_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let el = element(&mut doc, root, &["js-b", "js-a"]);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Counter>("A", "js-a"))
            .unwrap();
        handler
            .register(ComponentDescriptor::of::<Ink>("B", "js-b"))
            .unwrap();
        handler.upgrade_element(&mut doc, el, None).unwrap();

        assert_eq!(doc.attribute(el, "data-upgraded"), Some("A,B"));
        let types: Vec<_> = handler.records(el).map(UpgradeRecord::type_id).collect();
        assert_eq!(types, ["A", "B"]);
        assert_eq!(handler.upgraded_types(&doc, el).len(), 2);
    }

    #[test]
    fn unknown_type_is_rejected_without_mutation() {
        let mut doc = Document::new();
        let root = doc.root();
        let el = element(&mut doc, root, &["js-btn"]);
        let mut handler = ComponentHandler::default();

        let err = handler
            .upgrade_element(&mut doc, el, Some("DoesNotExist"))
            .unwrap_err();
        assert!(matches!(err, UpgradeError::UnknownComponent(ref t) if t == "DoesNotExist"));
        assert!(!doc.has_attribute(el, "data-upgraded"));
        assert_eq!(handler.records(el).count(), 0);
    }

    #[test]
    fn non_elements_and_stale_ids_are_invalid() {
        let mut doc = Document::new();
        let root = doc.root();
        let text = doc.create_text("label");
        doc.append_child(root, text);
        let gone = element(&mut doc, root, &["js-btn"]);
        doc.remove(gone);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Counter>("Btn", "js-btn"))
            .unwrap();

        assert_eq!(doc.node_type(text), Some(NodeType::Text));
        assert!(matches!(
            handler.upgrade_element(&mut doc, text, None),
            Err(UpgradeError::InvalidArgument(_))
        ));
        assert!(matches!(
            handler.upgrade_element(&mut doc, gone, None),
            Err(UpgradeError::InvalidArgument(_))
        ));
        // Batch upgrades skip them instead.
        handler.upgrade_elements(&mut doc, [text, gone]).unwrap();
    }

    #[test]
    fn canceled_upgrade_leaves_element_untouched() {
        let mut doc = Document::new();
        let root = doc.root();
        let el = element(&mut doc, root, &["js-btn"]);
        let canceler = doc
            .add_event_listener(root, "component-upgrading", false, |e| e.prevent_default())
            .unwrap();

        let mut handler = ComponentHandler::default();
        let constructed = Rc::new(RefCell::new(0_u32));
        let counter = constructed.clone();
        handler
            .register(ComponentDescriptor::from_fn("Btn", "js-btn", move |_, _| {
                *counter.borrow_mut() += 1;
                Ok(Box::new(Counter { hits: 0 }))
            }))
            .unwrap();

        handler.start(&mut doc).unwrap();
        assert!(!doc.has_attribute(el, "data-upgraded"));
        assert_eq!(handler.records(el).count(), 0);
        assert_eq!(*constructed.borrow(), 0);

        doc.remove_event_listener(root, canceler);
        handler.upgrade_element(&mut doc, el, None).unwrap();
        assert_eq!(doc.attribute(el, "data-upgraded"), Some("Btn"));
        assert_eq!(*constructed.borrow(), 1);
    }

    #[test]
    fn factory_failure_keeps_earlier_types_and_rolls_back_its_own() {
        init_logging();
        let mut doc = Document::new();
        let root = doc.root();
        let el = element(&mut doc, root, &["js-a", "js-b", "js-c"]);
        let log: Log = Rc::default();
        listen(&mut doc, el, "component-upgraded", &log);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Counter>("A", "js-a"))
            .unwrap();
        handler.register(failing("B", "js-b")).unwrap();
        handler
            .register(ComponentDescriptor::of::<Counter>("C", "js-c"))
            .unwrap();

        let err = handler.upgrade_element(&mut doc, el, None).unwrap_err();
        assert!(matches!(err, UpgradeError::Construction { ref type_id, .. } if type_id == "B"));
        assert!(core::error::Error::source(&err).is_some());

        assert_eq!(doc.attribute(el, "data-upgraded"), Some("A"));
        let types: Vec<_> = handler.records(el).map(UpgradeRecord::type_id).collect();
        assert_eq!(types, ["A"]);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn factory_failure_on_fresh_element_removes_attribute() {
        let mut doc = Document::new();
        let root = doc.root();
        let el = element(&mut doc, root, &["js-bad"]);

        let mut handler = ComponentHandler::default();
        handler.register(failing("Bad", "js-bad")).unwrap();
        assert!(handler.start(&mut doc).is_err());
        assert!(!doc.has_attribute(el, "data-upgraded"));
        assert!(!handler.is_upgraded(&doc, el, "Bad"));
    }

    #[test]
    fn upgrade_elements_visits_children_before_parents() {
        let mut doc = Document::new();
        let root = doc.root();
        let parent = element(&mut doc, root, &["js-a"]);
        let first = element(&mut doc, parent, &["js-a"]);
        let grandchild = element(&mut doc, first, &["js-a"]);
        let second = element(&mut doc, parent, &["js-a"]);

        let order: Rc<RefCell<Vec<NodeId>>> = Rc::default();
        let seen = order.clone();
        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::from_fn("A", "js-a", move |_, el| {
                seen.borrow_mut().push(el);
                Ok(Box::new(Counter { hits: 0 }))
            }))
            .unwrap();

        handler.upgrade_elements(&mut doc, [parent]).unwrap();
        assert_eq!(*order.borrow(), vec![grandchild, first, second, parent]);
    }

    #[test]
    fn upgrade_elements_reaches_detached_subtrees() {
        let mut doc = Document::new();
        let host = doc.create_element("section");
        let inner = doc.create_element("div");
        doc.add_class(inner, "js-a");
        doc.append_child(host, inner);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Counter>("A", "js-a"))
            .unwrap();

        handler.start(&mut doc).unwrap();
        assert!(!handler.is_upgraded(&doc, inner, "A"));

        handler.upgrade_elements(&mut doc, [host]).unwrap();
        assert!(handler.is_upgraded(&doc, inner, "A"));
        assert!(!doc.has_attribute(host, "data-upgraded"));
    }

    #[test]
    fn upgrade_dom_accepts_marker_override() {
        let mut doc = Document::new();
        let root = doc.root();
        let plain = element(&mut doc, root, &["js-a"]);
        let alt = element(&mut doc, root, &["alt-a"]);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Counter>("A", "js-a"))
            .unwrap();

        handler.upgrade_dom(&mut doc, Some("A"), Some("alt-a")).unwrap();
        assert!(handler.is_upgraded(&doc, alt, "A"));
        assert!(!handler.is_upgraded(&doc, plain, "A"));

        // Unregistered type without a marker does nothing.
        handler.upgrade_dom(&mut doc, Some("Ghost"), None).unwrap();
        // With a marker, the unknown type surfaces as an error.
        assert!(matches!(
            handler.upgrade_dom(&mut doc, Some("Ghost"), Some("js-a")),
            Err(UpgradeError::UnknownComponent(_))
        ));

        handler.upgrade_dom(&mut doc, None, None).unwrap();
        assert!(handler.is_upgraded(&doc, plain, "A"));
    }

    #[test]
    fn downgrade_tears_down_and_allows_reupgrade() {
        let mut doc = Document::new();
        let root = doc.root();
        let el = element(&mut doc, root, &["js-ink", "js-count"]);
        let log: Log = Rc::default();
        listen(&mut doc, root, "component-downgraded", &log);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Ink>("Ink", "js-ink"))
            .unwrap();
        handler
            .register(ComponentDescriptor::of::<Counter>("Count", "js-count"))
            .unwrap();
        handler.start(&mut doc).unwrap();
        assert_eq!(doc.children_of(el).len(), 1);

        handler.downgrade_elements(&mut doc, [el]).unwrap();

        // Ink tore itself down; Counter does not support downgrading.
        assert!(doc.children_of(el).is_empty());
        assert_eq!(doc.attribute(el, "data-upgraded"), Some("Count"));
        let types: Vec<_> = handler.records(el).map(UpgradeRecord::type_id).collect();
        assert_eq!(types, ["Count"]);
        assert_eq!(*log.borrow(), ["component-downgraded"]);

        handler.upgrade_element(&mut doc, el, None).unwrap();
        assert_eq!(doc.attribute(el, "data-upgraded"), Some("Count,Ink"));
        assert_eq!(doc.children_of(el).len(), 1);
    }

    #[test]
    fn downgrading_last_type_leaves_empty_list() {
        let mut doc = Document::new();
        let root = doc.root();
        let el = element(&mut doc, root, &["js-ink"]);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Ink>("Ink", "js-ink"))
            .unwrap();
        handler.start(&mut doc).unwrap();
        handler.downgrade_elements(&mut doc, [el]).unwrap();

        assert_eq!(doc.attribute(el, "data-upgraded"), Some(""));
        assert_eq!(handler.records(el).count(), 0);
        // Never-upgraded nodes are fine too.
        handler.downgrade_elements(&mut doc, [root]).unwrap();
    }

    #[test]
    fn downgrade_checks_every_id_first() {
        let mut doc = Document::new();
        let root = doc.root();
        let el = element(&mut doc, root, &["js-ink"]);
        let gone = element(&mut doc, root, &[]);
        doc.remove(gone);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Ink>("Ink", "js-ink"))
            .unwrap();
        handler.start(&mut doc).unwrap();

        assert!(matches!(
            handler.downgrade_elements(&mut doc, [el, gone]),
            Err(UpgradeError::InvalidArgument(_))
        ));
        assert!(handler.is_upgraded(&doc, el, "Ink"));
        assert_eq!(handler.records(el).count(), 1);
    }

    #[test]
    fn missing_capabilities_disable_the_handler() {
        init_logging();
        let mut doc = Document::with_capabilities(Capabilities::CLASS_LIST);
        let root = doc.root();
        let el = element(&mut doc, root, &["js-btn"]);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Counter>("Btn", "js-btn"))
            .unwrap();
        handler.start(&mut doc).unwrap();

        assert!(!handler.is_enabled());
        assert!(!doc.has_attribute(el, "data-upgraded"));

        handler
            .register(ComponentDescriptor::of::<Counter>("Other", "js-other"))
            .unwrap();
        assert!(handler.find("Other").is_none());
        handler.upgrade_element(&mut doc, el, Some("Btn")).unwrap();
        assert_eq!(handler.records(el).count(), 0);
    }

    #[test]
    fn relaxed_requirements_allow_limited_hosts() {
        let mut doc = Document::with_capabilities(Capabilities::CLASS_LIST);
        let root = doc.root();
        let el = element(&mut doc, root, &["js-btn"]);

        let mut handler = ComponentHandler::new(HandlerConfig {
            required_capabilities: Capabilities::CLASS_LIST,
            upgraded_attribute: "data-enhanced",
            ..HandlerConfig::default()
        });
        handler
            .register(ComponentDescriptor::of::<Counter>("Btn", "js-btn"))
            .unwrap();
        handler.start(&mut doc).unwrap();

        assert!(handler.is_enabled());
        assert_eq!(doc.attribute(el, "data-enhanced"), Some("Btn"));
        assert!(!doc.has_attribute(el, "data-upgraded"));
    }

    #[test]
    fn widgets_are_published_only_when_enabled() {
        let mut doc = Document::new();
        let root = doc.root();
        let el = element(&mut doc, root, &["js-w", "js-hidden"]);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Counter>("W", "js-w"))
            .unwrap();
        handler
            .register(ComponentDescriptor::of::<Counter>("Hidden", "js-hidden").with_widget(false))
            .unwrap();
        handler.start(&mut doc).unwrap();

        handler.widget_mut::<Counter>(el, "W").unwrap().hits += 2;
        assert_eq!(handler.widget::<Counter>(el, "W").map(|c| c.hits), Some(2));
        assert!(handler.widget::<Ink>(el, "W").is_none());

        assert!(handler.widget::<Counter>(el, "Hidden").is_none());
        assert!(handler.instance(el, "Hidden").is_some());
        assert!(handler.instance_mut(el, "Hidden").is_some());
        assert!(handler.instance(el, "Missing").is_none());
    }

    #[test]
    fn callbacks_run_per_upgrade_and_reset_on_reregister() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = element(&mut doc, root, &["js-btn"]);
        let b = element(&mut doc, root, &["js-btn"]);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Counter>("Btn", "js-btn"))
            .unwrap();
        let seen: Rc<RefCell<Vec<NodeId>>> = Rc::default();
        let first = seen.clone();
        handler.on_upgraded("Btn", move |_, el| first.borrow_mut().push(el));
        handler.on_upgraded("Unknown", |_, _| panic!("never registered"));

        handler.upgrade_element(&mut doc, a, None).unwrap();
        assert_eq!(*seen.borrow(), vec![a]);

        handler
            .register(ComponentDescriptor::of::<Counter>("Btn", "js-btn"))
            .unwrap();
        assert_eq!(handler.registry().callback_count("Btn"), 0);
        handler.upgrade_element(&mut doc, b, None).unwrap();
        assert_eq!(*seen.borrow(), vec![a]);
    }

    #[test]
    fn records_survive_external_attribute_edits() {
        let mut doc = Document::new();
        let root = doc.root();
        let el = element(&mut doc, root, &["js-btn"]);

        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::of::<Counter>("Btn", "js-btn"))
            .unwrap();
        handler.upgrade_element(&mut doc, el, None).unwrap();

        doc.remove_attribute(el, "data-upgraded");
        handler.upgrade_element(&mut doc, el, None).unwrap();
        handler.upgrade_element(&mut doc, el, Some("Btn")).unwrap();

        assert_eq!(handler.records(el).count(), 1);
        assert_eq!(doc.attribute(el, "data-upgraded"), Some("Btn"));
    }

    #[test]
    fn element_removed_by_factory_stops_the_batch() {
        let mut doc = Document::new();
        let root = doc.root();
        let el = element(&mut doc, root, &["js-a", "js-b", "js-c"]);

        let built: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let (seen_a, seen_b, seen_c) = (built.clone(), built.clone(), built.clone());
        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::from_fn("A", "js-a", move |_, _| {
                seen_a.borrow_mut().push("A");
                Ok(Box::new(Counter { hits: 0 }))
            }))
            .unwrap();
        handler
            .register(ComponentDescriptor::from_fn("B", "js-b", move |doc, el| {
                seen_b.borrow_mut().push("B");
                doc.remove(el);
                Ok(Box::new(Counter { hits: 0 }))
            }))
            .unwrap();
        handler
            .register(ComponentDescriptor::from_fn("C", "js-c", move |_, _| {
                seen_c.borrow_mut().push("C");
                Ok(Box::new(Counter { hits: 0 }))
            }))
            .unwrap();

        handler.upgrade_element(&mut doc, el, None).unwrap();

        assert!(!doc.is_alive(el));
        assert_eq!(*built.borrow(), ["A", "B"]);
        assert_eq!(handler.records(el).count(), 0);
    }

    #[test]
    fn reregistered_factory_applies_to_later_upgrades_only() {
        let mut doc = Document::new();
        let root = doc.root();
        let first = element(&mut doc, root, &["js-btn"]);
        let second = element(&mut doc, root, &["js-btn"]);

        let built: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let (v1, v2) = (built.clone(), built.clone());
        let mut handler = ComponentHandler::default();
        handler
            .register(
                ComponentDescriptor::from_fn("Btn", "js-btn", move |_, _| {
                    v1.borrow_mut().push("v1");
                    Ok(Box::new(Counter { hits: 0 }))
                })
                .with_properties(&["v1"]),
            )
            .unwrap();
        handler.upgrade_element(&mut doc, first, None).unwrap();

        handler
            .register(
                ComponentDescriptor::from_fn("Btn", "js-btn", move |_, _| {
                    v2.borrow_mut().push("v2");
                    Ok(Box::new(Counter { hits: 0 }))
                })
                .with_properties(&["v2"]),
            )
            .unwrap();
        handler.upgrade_element(&mut doc, second, None).unwrap();
        handler.upgrade_element(&mut doc, first, None).unwrap();

        assert_eq!(*built.borrow(), ["v1", "v2"]);
        let old: Vec<_> = handler.records(first).map(|r| r.descriptor().properties()).collect();
        let new: Vec<_> = handler.records(second).map(|r| r.descriptor().properties()).collect();
        assert_eq!(old, [["v1"]]);
        assert_eq!(new, [["v2"]]);
    }

    #[test]
    fn deep_subtrees_upgrade_innermost_first() {
        let mut doc = Document::new();
        let mut parent = doc.root();
        let mut chain = Vec::new();
        for _ in 0..2_000 {
            parent = element(&mut doc, parent, &["js-a"]);
            chain.push(parent);
        }

        let order: Rc<RefCell<Vec<NodeId>>> = Rc::default();
        let seen = order.clone();
        let mut handler = ComponentHandler::default();
        handler
            .register(ComponentDescriptor::from_fn("A", "js-a", move |_, el| {
                seen.borrow_mut().push(el);
                Ok(Box::new(Counter { hits: 0 }))
            }))
            .unwrap();

        handler.upgrade_elements(&mut doc, [chain[0]]).unwrap();
        chain.reverse();
        assert_eq!(*order.borrow(), chain);
    }
}
