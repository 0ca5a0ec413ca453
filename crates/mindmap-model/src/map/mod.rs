//! The mind map tree.
//!
//! Topics live in a per-map arena and refer to each other by [`NodeId`].
//! Every read and edit goes through [`MindMap`], which keeps the tree
//! invariants: a topic sits in exactly one parent's child list, the root has
//! no parent, and no topic is its own ancestor.
//!
//! The map is single threaded. Listener notifications run synchronously on
//! the mutating thread after the change is complete.

mod arena;
mod edit;
mod events;
mod links;
mod search;
mod topic;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::attributes::{FORMAT_VERSION, VERSION};
use crate::codec::attribute_line::{is_single_line, is_valid_name};
use crate::error::ModelError;

pub(crate) use arena::Arena;
pub use arena::NodeId;
pub use events::{ListenerId, MapListener};
pub use search::{ContentMatcher, SearchScope};
pub(crate) use topic::Subtree;
pub use topic::Topic;

/// A mind map document: an optional root topic plus document attributes.
pub struct MindMap {
    nodes: Arena<Topic>,
    root: Option<NodeId>,
    attributes: BTreeMap<String, String>,
    listeners: RefCell<Vec<(ListenerId, Rc<dyn MapListener>)>>,
    next_listener: Cell<u64>,
}

impl MindMap {
    /// An empty map carrying the current format version.
    pub fn new() -> Self {
        let mut map = Self::blank();
        map.attributes
            .insert(VERSION.to_string(), FORMAT_VERSION.to_string());
        map
    }

    /// A map with an empty root topic.
    pub fn with_root() -> Self {
        let mut map = Self::new();
        let root = map.nodes.insert(Topic::new(""));
        map.root = Some(root);
        map
    }

    /// A map with no attributes at all, for the parser.
    pub(crate) fn blank() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            attributes: BTreeMap::new(),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// True when the map has no root.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of live topics, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn topic(&self, id: NodeId) -> Option<&Topic> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some()
    }

    pub(crate) fn check(&self, id: NodeId) -> Result<&Topic, ModelError> {
        if !self.nodes.owns(id) {
            return Err(ModelError::ForeignTopic(id));
        }
        self.nodes.get(id).ok_or(ModelError::UnknownTopic(id))
    }

    pub(crate) fn check_mut(&mut self, id: NodeId) -> Result<&mut Topic, ModelError> {
        if !self.nodes.owns(id) {
            return Err(ModelError::ForeignTopic(id));
        }
        self.nodes.get_mut(id).ok_or(ModelError::UnknownTopic(id))
    }

    pub fn global_attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn global_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Sets or, with `None`, removes a document attribute. Returns whether
    /// anything changed.
    pub fn set_global_attribute(
        &mut self,
        name: &str,
        value: Option<&str>,
    ) -> Result<bool, ModelError> {
        if let Some(value) = value {
            check_attribute(name, value)?;
        }
        Ok(set_or_remove(&mut self.attributes, name, value))
    }

    /// Creates a topic that is not yet part of the tree.
    pub fn create_topic(&mut self, text: impl Into<String>) -> NodeId {
        self.nodes.insert(Topic::new(text))
    }

    /// Replaces the root. The previous root stays in the map, detached.
    pub fn set_root(&mut self, root: Option<NodeId>, notify: bool) -> Result<(), ModelError> {
        if let Some(id) = root
            && self.check(id)?.parent.is_some()
        {
            return Err(ModelError::AlreadyAttached(id));
        }
        self.root = root;
        if notify {
            self.fire_structure_changed(root);
        }
        Ok(())
    }

    /// Drops every topic.
    pub fn clear(&mut self, notify: bool) {
        self.nodes.clear();
        self.root = None;
        if notify {
            self.fire_structure_changed(None);
        }
    }

    /// Pre-order traversal of the tree: parent before children, children in
    /// order.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            map: self,
            stack: self.root.into_iter().collect(),
        }
    }

    /// Pre-order traversal of the subtree rooted at `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> PreOrder<'_> {
        let stack = if self.contains(id) { vec![id] } else { Vec::new() };
        PreOrder { map: self, stack }
    }

    /// Ancestors of `id`, nearest first, `id` excluded.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            map: self,
            next: self.topic(id).and_then(Topic::parent),
        }
    }

    /// Number of parent hops to the top of the tree. The root has depth 0.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.topic(id)?;
        Some(self.ancestors(id).count())
    }

    /// Topmost ancestor of `id`, or `id` itself.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        self.topic(id)?;
        Some(self.ancestors(id).last().unwrap_or(id))
    }

    /// Chain from the top of the tree down to `id`, both included.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut path: Vec<NodeId> = std::iter::once(id).chain(self.ancestors(id)).collect();
        path.reverse();
        path
    }

    /// Child indexes matching [`MindMap::path`]. The first entry stands for
    /// the top of the tree and is always 0.
    pub fn position_path(&self, id: NodeId) -> Vec<usize> {
        self.path(id)
            .into_iter()
            .map(|node| self.index_in_parent(node).unwrap_or(0))
            .collect()
    }

    /// Inverse of [`MindMap::position_path`] for topics under the root.
    pub fn find_topic_at_position_path(&self, positions: &[usize]) -> Option<NodeId> {
        let (_, children) = positions.split_first()?;
        let mut current = self.root?;
        for &index in children {
            current = *self.topic(current)?.children.get(index)?;
        }
        Some(current)
    }

    pub(crate) fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.topic(id)?.parent?;
        self.topic(parent)?.children.iter().position(|c| *c == id)
    }

    /// Nearest strict ancestor carrying attribute `name`.
    pub fn find_ancestor_with_attribute(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.ancestors(id)
            .find(|ancestor| self.topic(*ancestor).is_some_and(|t| t.attributes.contains_key(name)))
    }

    /// True when `ancestor` is a strict ancestor of `id`.
    pub fn has_ancestor(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Compares content and shape with another map, ignoring topic ids.
    pub fn same_structure(&self, other: &MindMap) -> bool {
        self.attributes == other.attributes
            && match (self.root, other.root) {
                (None, None) => true,
                (Some(a), Some(b)) => self.same_subtree(a, other, b),
                _ => false,
            }
    }

    fn same_subtree(&self, id: NodeId, other: &MindMap, other_id: NodeId) -> bool {
        let (Some(a), Some(b)) = (self.topic(id), other.topic(other_id)) else {
            return false;
        };
        a.same_content(b)
            && a.children.len() == b.children.len()
            && a.children
                .iter()
                .zip(&b.children)
                .all(|(x, y)| self.same_subtree(*x, other, *y))
    }
}

impl Default for MindMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy of the attributes and the tree under the root. Listeners and
/// detached topics are not copied.
impl Clone for MindMap {
    fn clone(&self) -> Self {
        let mut copy = Self::blank();
        copy.attributes = self.attributes.clone();
        if let Some(root) = self.root
            && let Some(subtree) = self.snapshot(root, true)
        {
            copy.root = Some(copy.insert_subtree(subtree, None));
        }
        copy
    }
}

impl fmt::Debug for MindMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MindMap")
            .field("root", &self.root)
            .field("attributes", &self.attributes)
            .field("topics", &self.nodes.len())
            .finish()
    }
}

impl<'a> IntoIterator for &'a MindMap {
    type Item = NodeId;
    type IntoIter = PreOrder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Depth-first, parent-before-children iterator over topic ids.
pub struct PreOrder<'a> {
    map: &'a MindMap,
    stack: Vec<NodeId>,
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if let Some(topic) = self.map.topic(id) {
            self.stack.extend(topic.children.iter().rev());
        }
        Some(id)
    }
}

pub struct Ancestors<'a> {
    map: &'a MindMap,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.map.topic(id).and_then(Topic::parent);
        Some(id)
    }
}

/// Rejects attributes that would not survive a trip through an attribute
/// line.
pub(crate) fn check_attribute(name: &str, value: &str) -> Result<(), ModelError> {
    if !is_valid_name(name) {
        return Err(ModelError::InvalidAttributeName(name.to_string()));
    }
    if !is_single_line(value) {
        return Err(ModelError::MultilineAttribute(name.to_string()));
    }
    Ok(())
}

pub(crate) fn set_or_remove(
    map: &mut BTreeMap<String, String>,
    name: &str,
    value: Option<&str>,
) -> bool {
    match value {
        Some(value) => map.insert(name.to_string(), value.to_string()).as_deref() != Some(value),
        None => map.remove(name).is_some(),
    }
}
