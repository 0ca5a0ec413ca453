use std::collections::BTreeMap;

use crate::map::NodeId;
use crate::payload::{Discriminant, Payload};

/// One item of the mind map tree.
///
/// Topics are owned by their [`MindMap`](crate::MindMap) and edited through
/// it; this type only exposes reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topic {
    pub(crate) text: String,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) payloads: BTreeMap<Discriminant, Payload>,
    pub(crate) code_snippets: BTreeMap<String, String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Topic {
    pub(crate) fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Payloads in discriminant order.
    pub fn payloads(&self) -> impl Iterator<Item = &Payload> {
        self.payloads.values()
    }

    pub fn payload(&self, discriminant: Discriminant) -> Option<&Payload> {
        self.payloads.get(&discriminant)
    }

    pub fn has_payloads(&self) -> bool {
        !self.payloads.is_empty()
    }

    /// Code snippets keyed by language tag.
    pub fn code_snippets(&self) -> &BTreeMap<String, String> {
        &self.code_snippets
    }

    pub fn code_snippet(&self, language: &str) -> Option<&str> {
        self.code_snippets.get(language).map(String::as_str)
    }

    /// `None` for the root and for detached topics.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Content equality, ignoring tree links.
    pub(crate) fn same_content(&self, other: &Topic) -> bool {
        self.text == other.text
            && self.attributes == other.attributes
            && self.payloads == other.payloads
            && self.code_snippets == other.code_snippets
    }
}

/// An owned copy of a subtree, detached from any map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Subtree {
    pub(crate) text: String,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) payloads: BTreeMap<Discriminant, Payload>,
    pub(crate) code_snippets: BTreeMap<String, String>,
    pub(crate) children: Vec<Subtree>,
}

impl Subtree {
    /// Removes `name` from every topic in the copy.
    pub(crate) fn strip_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
        for child in &mut self.children {
            child.strip_attribute(name);
        }
    }

    pub(crate) fn into_topic(self) -> (Topic, Vec<Subtree>) {
        let topic = Topic {
            text: self.text,
            attributes: self.attributes,
            payloads: self.payloads,
            code_snippets: self.code_snippets,
            parent: None,
            children: Vec::new(),
        };
        (topic, self.children)
    }
}
