// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core document implementation: structure, element data, queries, events.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use smallvec::SmallVec;
use understory_event_target::event::Event;
use understory_event_target::listeners::{EventListeners, ListenerId};
use understory_event_target::types::ParentLookup;

use crate::class_list::ClassList;
use crate::types::{Capabilities, NodeId, NodeType};

/// A DOM-like document: a tree of element, text, and comment nodes.
///
/// Every document owns a root element created by [`Document::new`]. Nodes are
/// created detached and become part of the document once appended under the
/// root (directly or through ancestors). Queries such as
/// [`Document::query_class`] only see connected nodes; everything else works on
/// detached nodes too.
///
/// ## Example
///
/// ```rust
/// use understory_element_tree::Document;
///
/// let mut doc = Document::new();
/// let button = doc.create_element("button");
/// doc.add_class(button, "js-btn");
/// doc.append_child(doc.root(), button);
///
/// assert_eq!(doc.query_class("js-btn"), vec![button]);
/// ```
pub struct Document {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
    capabilities: Capabilities,
    listeners: EventListeners<NodeId>,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Document")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("capabilities", &self.capabilities)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct ElementData {
    tag: String,
    classes: ClassList,
    attributes: SmallVec<[(String, String); 4]>,
}

#[derive(Clone, Debug)]
enum NodeData {
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

impl Node {
    fn new(generation: u32, data: NodeData) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            data,
        }
    }

    fn element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// Parent lookup over the raw slots, usable while the listener store is borrowed mutably.
struct Ancestry<'a> {
    nodes: &'a [Option<Node>],
}

impl ParentLookup<NodeId> for Ancestry<'_> {
    fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        let n = self.nodes.get(node.idx())?.as_ref()?;
        if n.generation != node.1 {
            return None;
        }
        n.parent
    }
}

impl ParentLookup<NodeId> for Document {
    fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        Self::parent_of(self, *node)
    }
}

impl Document {
    /// Create a document with a root `html` element and every [`Capabilities`] flag.
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::default())
    }

    /// Create a document describing a host with the given capabilities.
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::new(0, 0),
            capabilities,
            listeners: EventListeners::new(),
        };
        doc.root = doc.create_element("html");
        doc
    }

    /// The host capabilities this document was created with.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// The root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element with the given tag name.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(ElementData {
            tag: tag.into(),
            classes: ClassList::default(),
            attributes: SmallVec::new(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Comment(text.into()))
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, data));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, data)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// Append `child` as the last child of `parent`, moving it if it already has a parent.
    ///
    /// Returns `false` and leaves the tree unchanged if either id is stale,
    /// `parent` is not an element, or `child` is `parent` or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.is_alive(child) || !self.is_element(parent) {
            return false;
        }
        if self.is_inclusive_ancestor(child, parent) {
            return false;
        }
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
        true
    }

    /// Unlink `id` from its parent, keeping it (and its subtree) alive.
    pub fn detach(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|c| *c != id);
            self.node_mut(id).parent = None;
        }
    }

    /// Remove a node and its subtree, dropping their listeners.
    ///
    /// The root cannot be removed. Removed ids become stale immediately.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) || id == self.root {
            return;
        }
        self.detach(id);
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            stack.append(&mut self.node_mut(id).children);
            self.listeners.clear_node(id);
            self.nodes[id.idx()] = None;
            self.free_list.push(id.idx());
        }
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is live if its slot exists and its generation matches the
    /// generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Kind of a live node.
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        let node = self.node_opt(id)?;
        Some(match node.data {
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
        })
    }

    /// Whether `id` is a live element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.node_type(id) == Some(NodeType::Element)
    }

    /// Whether `id` is the root or one of its descendants.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_alive(id) && self.is_inclusive_ancestor(self.root, id)
    }

    /// Returns the parent of a node if live, or `None` for detached nodes, the root, or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|node| node.parent)
    }

    /// Get the children of a node, or an empty slice if the node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Iterate the element children of a node, skipping text and comments.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children_of(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
    }

    /// Tag name of a live element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.node_opt(id)?.element().map(|e| e.tag.as_str())
    }

    /// Content of a live text or comment node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node_opt(id)?.data {
            NodeData::Text(t) | NodeData::Comment(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }

    /// Class list of a live element.
    pub fn class_list(&self, id: NodeId) -> Option<&ClassList> {
        self.node_opt(id)?.element().map(|e| &e.classes)
    }

    /// Mutable class list of a live element.
    pub fn class_list_mut(&mut self, id: NodeId) -> Option<&mut ClassList> {
        self.node_opt_mut(id)?.element_mut().map(|e| &mut e.classes)
    }

    /// Whether a live element carries `class`.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.class_list(id).is_some_and(|c| c.contains(class))
    }

    /// Add `class` to a live element. Returns `false` if it was already present or `id` is not an element.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> bool {
        self.class_list_mut(id).is_some_and(|c| c.add(class))
    }

    /// Remove `class` from a live element. Returns `false` if it was absent or `id` is not an element.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> bool {
        self.class_list_mut(id).is_some_and(|c| c.remove(class))
    }

    /// Value of attribute `name` on a live element.
    ///
    /// The class list is kept separately; see [`Document::class_list`].
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node_opt(id)?
            .element()?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a live element has attribute `name`.
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set attribute `name` on a live element, keeping its position if it already exists.
    ///
    /// Returns `false` if `id` is not a live element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let Some(element) = self.node_opt_mut(id).and_then(Node::element_mut) else {
            return false;
        };
        if let Some((_, v)) = element.attributes.iter_mut().find(|(n, _)| n == name) {
            v.clear();
            v.push_str(value);
        } else {
            element.attributes.push((name.into(), value.into()));
        }
        true
    }

    /// Remove attribute `name`. Returns `false` if it was absent.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let Some(element) = self.node_opt_mut(id).and_then(Node::element_mut) else {
            return false;
        };
        let before = element.attributes.len();
        element.attributes.retain(|(n, _)| n.as_str() != name);
        element.attributes.len() != before
    }

    /// Connected elements carrying `class`, in document (pre-order) order.
    pub fn query_class(&self, class: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = Some(self.root);
        while let Some(id) = cur {
            if self.has_class(id, class) {
                out.push(id);
            }
            cur = self.next_in_order(id);
        }
        out
    }

    /// Get the next node in depth-first traversal order.
    ///
    /// Returns `None` if no next node exists or if the current node is stale.
    /// This is a standard tree traversal that does not wrap around.
    pub fn next_depth_first(&self, current: NodeId) -> Option<NodeId> {
        if !self.is_alive(current) {
            return None;
        }
        self.next_in_order(current)
    }

    /// Register an event listener on a live node.
    ///
    /// Returns `None` for stale ids.
    pub fn add_event_listener(
        &mut self,
        id: NodeId,
        event_type: impl Into<Cow<'static, str>>,
        capture: bool,
        callback: impl FnMut(&mut Event<NodeId>) + 'static,
    ) -> Option<ListenerId> {
        if !self.is_alive(id) {
            return None;
        }
        Some(self.listeners.add(id, event_type, capture, callback))
    }

    /// Remove a listener previously added to `id`.
    pub fn remove_event_listener(&mut self, id: NodeId, listener: ListenerId) -> bool {
        self.listeners.remove(id, listener)
    }

    /// Number of listeners registered on `id`.
    pub fn listener_count(&self, id: NodeId) -> usize {
        self.listeners.count(id)
    }

    /// Dispatch `event` on `target`, propagating through its ancestors.
    ///
    /// Returns `false` if the target is stale or a listener canceled the event.
    pub fn dispatch_event(&mut self, target: NodeId, event: &mut Event<NodeId>) -> bool {
        if !self.is_alive(target) {
            return false;
        }
        let parents = Ancestry { nodes: &self.nodes };
        self.listeners.dispatch(&parents, target, event)
    }

    // --- internals ---

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent_of(id);
        }
        false
    }

    fn next_in_order(&self, current: NodeId) -> Option<NodeId> {
        if let Some(&first_child) = self.node(current).children.first() {
            return Some(first_child);
        }
        let mut node = current;
        while let Some(parent) = self.parent_of(node) {
            if let Some(next) = self.next_sibling(node) {
                return Some(next);
            }
            node = parent;
        }
        None
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(node)?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|&id| id == node)?;
        siblings.get(pos + 1).copied()
    }
}
