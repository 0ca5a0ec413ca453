use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::attributes::TOPIC_LINK_UID;
use crate::error::ModelError;
use crate::map::{MindMap, NodeId};
use crate::payload::{Discriminant, Payload};

fn clock_stem(nanos: bool) -> String {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    if nanos {
        format!("{:X}", elapsed.as_nanos())
    } else {
        format!("{:X}", elapsed.as_millis())
    }
}

impl MindMap {
    /// The topic whose `topicLinkUID` equals `uid`.
    pub fn find_topic_for_link_target(&self, uid: &str) -> Option<NodeId> {
        self.iter()
            .find(|id| self.topic(*id).and_then(|t| t.attribute(TOPIC_LINK_UID)) == Some(uid))
    }

    /// Builds a topic link to `target`, giving it a `topicLinkUID` first if
    /// it has none.
    pub fn make_link_to(&mut self, target: NodeId) -> Result<Payload, ModelError> {
        if let Some(uid) = self.check(target)?.attribute(TOPIC_LINK_UID) {
            return Ok(Payload::TopicRef(uid.to_string()));
        }
        let uid = self.allocate_link_uid(clock_stem(false), || clock_stem(true));
        self.set_attribute(target, TOPIC_LINK_UID, Some(&uid))?;
        Ok(Payload::TopicRef(uid))
    }

    /// First free `stem + letter` candidate, letters `A` to `Z`. When all
    /// 26 are taken a new stem is drawn and the letters start over.
    fn allocate_link_uid(&self, stem: String, mut next_stem: impl FnMut() -> String) -> String {
        let mut stem = stem;
        loop {
            for letter in 'A'..='Z' {
                let candidate = format!("{stem}{letter}");
                if self.find_topic_for_link_target(&candidate).is_none() {
                    return candidate;
                }
            }
            stem = next_stem();
        }
    }

    /// Removes every topic link under `subtree` that points at `target`.
    pub fn remove_all_links_to(&mut self, subtree: NodeId, target: NodeId) -> Result<bool, ModelError> {
        self.check(subtree)?;
        let Some(uid) = self
            .check(target)?
            .attribute(TOPIC_LINK_UID)
            .map(str::to_string)
        else {
            return Ok(false);
        };
        Ok(self.scrub_links(subtree, &uid))
    }

    pub(crate) fn scrub_links(&mut self, subtree: NodeId, uid: &str) -> bool {
        let nodes: Vec<NodeId> = self.descendants(subtree).collect();
        let mut changed = false;
        for id in nodes {
            if let Some(topic) = self.nodes.get_mut(id)
                && matches!(topic.payloads.get(&Discriminant::Topic), Some(Payload::TopicRef(u)) if u == uid)
            {
                topic.payloads.remove(&Discriminant::Topic);
                changed = true;
            }
        }
        changed
    }

    fn file_links_under(&self, subtree: NodeId) -> Vec<NodeId> {
        self.descendants(subtree)
            .filter(|id| {
                self.topic(*id)
                    .is_some_and(|t| matches!(t.payload(Discriminant::File), Some(Payload::File(_))))
            })
            .collect()
    }

    /// True when a file link under `subtree` points at `file` or into it.
    pub fn subtree_contains_file_link(&self, subtree: NodeId, base: Option<&Path>, file: &Path) -> bool {
        self.descendants(subtree).any(|id| {
            matches!(
                self.topic(id).and_then(|t| t.payload(Discriminant::File)),
                Some(Payload::File(path)) if path.is_same_or_has_parent(base, file)
            )
        })
    }

    /// Drops file links under `subtree` pointing at `file` or into it.
    pub fn delete_file_link_if_present(
        &mut self,
        subtree: NodeId,
        base: Option<&Path>,
        file: &Path,
    ) -> Result<bool, ModelError> {
        self.check(subtree)?;
        let mut changed = false;
        for id in self.file_links_under(subtree) {
            let hit = matches!(
                self.topic(id).and_then(|t| t.payload(Discriminant::File)),
                Some(Payload::File(path)) if path.is_same_or_has_parent(base, file)
            );
            if hit {
                self.remove_payload(id, Discriminant::File)?;
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Re-targets file links under `subtree` that point at `old` or into it
    /// so they point at `new` with the same suffix.
    pub fn replace_file_link_if_present(
        &mut self,
        subtree: NodeId,
        base: Option<&Path>,
        old: &Path,
        new: &Path,
    ) -> Result<bool, ModelError> {
        self.check(subtree)?;
        let mut changed = false;
        for id in self.file_links_under(subtree) {
            let replacement = match self.topic(id).and_then(|t| t.payload(Discriminant::File)) {
                Some(Payload::File(path)) => path.replace_parent_path(base, old, new),
                _ => None,
            };
            if let Some(path) = replacement {
                self.set_payload(id, Payload::File(path))?;
                changed = true;
            }
        }
        Ok(changed)
    }

    /// Whole-map form of [`MindMap::subtree_contains_file_link`].
    pub fn contains_file_link(&self, base: Option<&Path>, file: &Path) -> bool {
        self.root
            .is_some_and(|root| self.subtree_contains_file_link(root, base, file))
    }

    /// Whole-map form of [`MindMap::delete_file_link_if_present`]; fires one
    /// structure change when anything was removed.
    pub fn delete_all_links_to_file(&mut self, base: Option<&Path>, file: &Path) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let changed = self
            .delete_file_link_if_present(root, base, file)
            .unwrap_or(false);
        if changed {
            self.fire_structure_changed(Some(root));
        }
        changed
    }

    /// Whole-map form of [`MindMap::replace_file_link_if_present`]; fires
    /// one structure change when anything was re-targeted.
    pub fn replace_all_links_to_file(&mut self, base: Option<&Path>, old: &Path, new: &Path) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let changed = self
            .replace_file_link_if_present(root, base, old, new)
            .unwrap_or(false);
        if changed {
            self.fire_structure_changed(Some(root));
        }
        changed
    }
}
