use std::collections::BTreeSet;
use std::path::Path;

use regex::Regex;

use crate::map::{MindMap, NodeId};
use crate::payload::Discriminant;

/// Application supplied matching on top of text and payload search, e.g.
/// for formats the core does not understand.
pub trait ContentMatcher {
    fn matches(&self, map: &MindMap, topic: NodeId, base: Option<&Path>, pattern: &Regex) -> bool;
}

/// What a search looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchScope {
    /// Match the topic text.
    pub in_text: bool,
    /// Match payloads of these kinds.
    pub payloads: BTreeSet<Discriminant>,
}

impl SearchScope {
    pub fn text_only() -> Self {
        Self {
            in_text: true,
            payloads: BTreeSet::new(),
        }
    }

    pub fn everything() -> Self {
        Self {
            in_text: true,
            payloads: Discriminant::ALL.into_iter().collect(),
        }
    }
}

impl MindMap {
    fn topic_matches(
        &self,
        id: NodeId,
        base: Option<&Path>,
        pattern: &Regex,
        scope: &SearchScope,
        extension: Option<&dyn ContentMatcher>,
    ) -> bool {
        let Some(topic) = self.topic(id) else {
            return false;
        };
        (scope.in_text && pattern.is_match(&topic.text))
            || topic.payloads().any(|payload| {
                scope.payloads.contains(&payload.discriminant())
                    && payload.matches_pattern(base, pattern)
            })
            || extension.is_some_and(|matcher| matcher.matches(self, id, base, pattern))
    }

    /// First matching topic after `start` in pre-order, or from the top
    /// when `start` is `None`.
    pub fn find_next(
        &self,
        base: Option<&Path>,
        start: Option<NodeId>,
        pattern: &Regex,
        scope: &SearchScope,
        extension: Option<&dyn ContentMatcher>,
    ) -> Option<NodeId> {
        let order: Vec<NodeId> = self.iter().collect();
        let from = match start {
            Some(start) => order.iter().position(|id| *id == start)? + 1,
            None => 0,
        };
        order[from..]
            .iter()
            .copied()
            .find(|id| self.topic_matches(*id, base, pattern, scope, extension))
    }

    /// Last matching topic before `start` in pre-order, or from the end
    /// when `start` is `None`.
    pub fn find_prev(
        &self,
        base: Option<&Path>,
        start: Option<NodeId>,
        pattern: &Regex,
        scope: &SearchScope,
        extension: Option<&dyn ContentMatcher>,
    ) -> Option<NodeId> {
        let order: Vec<NodeId> = self.iter().collect();
        let until = match start {
            Some(start) => order.iter().position(|id| *id == start)?,
            None => order.len(),
        };
        order[..until]
            .iter()
            .rev()
            .copied()
            .find(|id| self.topic_matches(*id, base, pattern, scope, extension))
    }

    /// All topics carrying a payload of the given kind, in pre-order.
    pub fn find_all_with_payload(&self, discriminant: Discriminant) -> Vec<NodeId> {
        self.iter()
            .filter(|id| {
                self.topic(*id)
                    .is_some_and(|t| t.payload(discriminant).is_some())
            })
            .collect()
    }
}
