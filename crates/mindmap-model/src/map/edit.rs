use crate::attributes::TOPIC_LINK_UID;
use crate::error::ModelError;
use crate::map::{MindMap, NodeId, Subtree, Topic, check_attribute, set_or_remove};
use crate::payload::{Discriminant, Payload};

impl MindMap {
    /// Adds a new child under `parent`, right after `after` when that is one
    /// of `parent`'s children, otherwise at the end.
    pub fn make_child(
        &mut self,
        parent: NodeId,
        text: impl Into<String>,
        after: Option<NodeId>,
    ) -> Result<NodeId, ModelError> {
        self.check(parent)?;
        let id = self.nodes.insert(Topic::new(text));
        self.link_child(parent, id, after);
        Ok(id)
    }

    /// Inserts `child` into `parent`'s list. Both must be live and `child`
    /// detached.
    fn link_child(&mut self, parent: NodeId, child: NodeId, after: Option<NodeId>) {
        if let Some(topic) = self.nodes.get_mut(child) {
            topic.parent = Some(parent);
        }
        if let Some(topic) = self.nodes.get_mut(parent) {
            let position = after
                .and_then(|after| topic.children.iter().position(|c| *c == after))
                .map_or(topic.children.len(), |index| index + 1);
            topic.children.insert(position, child);
        }
    }

    /// Removes `id` from its parent's list, leaving it detached.
    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get_mut(id).and_then(|t| t.parent.take()) else {
            return;
        };
        if let Some(topic) = self.nodes.get_mut(parent) {
            topic.children.retain(|c| *c != id);
        }
    }

    /// Frees `id` and everything below it.
    fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(topic) = self.nodes.remove(next) {
                pending.extend(topic.children);
            }
        }
    }

    /// Detaches `id` from its parent and destroys its subtree. The root is
    /// left alone and `Ok(false)` returned.
    pub fn delete(&mut self, id: NodeId) -> Result<bool, ModelError> {
        self.check(id)?;
        if self.root == Some(id) {
            return Ok(false);
        }
        self.unlink(id);
        self.free_subtree(id);
        Ok(true)
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), ModelError> {
        self.check_mut(id)?.text = text.into();
        Ok(())
    }

    /// Sets the text and notifies listeners that the topic changed.
    pub fn update_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), ModelError> {
        self.set_text(id, text)?;
        self.fire_node_changed(id);
        Ok(())
    }

    /// Moves `id` right before its sibling `target`. `Ok(false)` when the
    /// two are not distinct siblings.
    pub fn move_before(&mut self, id: NodeId, target: NodeId) -> Result<bool, ModelError> {
        self.move_next_to(id, target, 0)
    }

    /// Moves `id` right after its sibling `target`.
    pub fn move_after(&mut self, id: NodeId, target: NodeId) -> Result<bool, ModelError> {
        self.move_next_to(id, target, 1)
    }

    fn move_next_to(&mut self, id: NodeId, target: NodeId, offset: usize) -> Result<bool, ModelError> {
        let parent = self.check(id)?.parent;
        if id == target || parent.is_none() || self.check(target)?.parent != parent {
            return Ok(false);
        }
        let Some(siblings) = parent.and_then(|p| self.nodes.get_mut(p)).map(|t| &mut t.children)
        else {
            return Ok(false);
        };
        siblings.retain(|c| *c != id);
        let Some(target_index) = siblings.iter().position(|c| *c == target) else {
            return Ok(false);
        };
        siblings.insert(target_index + offset, id);
        Ok(true)
    }

    /// Moves `id` to the front of its parent's list.
    pub fn make_first(&mut self, id: NodeId) -> Result<bool, ModelError> {
        self.reposition(id, true)
    }

    /// Moves `id` to the back of its parent's list.
    pub fn make_last(&mut self, id: NodeId) -> Result<bool, ModelError> {
        self.reposition(id, false)
    }

    fn reposition(&mut self, id: NodeId, first: bool) -> Result<bool, ModelError> {
        let Some(parent) = self.check(id)?.parent else {
            return Ok(false);
        };
        let Some(siblings) = self.nodes.get_mut(parent).map(|t| &mut t.children) else {
            return Ok(false);
        };
        let already = if first { siblings.first() } else { siblings.last() };
        if already == Some(&id) {
            return Ok(false);
        }
        siblings.retain(|c| *c != id);
        if first {
            siblings.insert(0, id);
        } else {
            siblings.push(id);
        }
        Ok(true)
    }

    /// Re-parents `id` (with its subtree) as the last child of `new_parent`.
    ///
    /// Returns `Ok(false)` when `new_parent` already is the parent. Moving a
    /// topic into its own subtree or moving the root is an error.
    pub fn move_to_new_parent(&mut self, id: NodeId, new_parent: NodeId) -> Result<bool, ModelError> {
        let current_parent = self.check(id)?.parent;
        self.check(new_parent)?;
        if self.root == Some(id) {
            return Err(ModelError::RootOperation { operation: "move" });
        }
        if id == new_parent || self.has_ancestor(new_parent, id) {
            return Err(ModelError::MoveIntoSubtree {
                moved: id,
                target: new_parent,
            });
        }
        if current_parent == Some(new_parent) {
            return Ok(false);
        }
        self.unlink(id);
        self.link_child(new_parent, id, None);
        Ok(true)
    }

    /// Attaches `payload`, replacing any payload with the same
    /// discriminant. Returns the replaced payload.
    pub fn set_payload(&mut self, id: NodeId, payload: Payload) -> Result<Option<Payload>, ModelError> {
        for (name, value) in payload.attributes_for_write() {
            check_attribute(name, &value)?;
        }
        let topic = self.check_mut(id)?;
        let previous = topic.payloads.remove(&payload.discriminant());
        if let Some(previous) = &previous {
            previous.on_detach(&mut topic.attributes);
        }
        payload.on_attach(&mut topic.attributes);
        topic.payloads.insert(payload.discriminant(), payload);
        Ok(previous)
    }

    pub fn remove_payload(
        &mut self,
        id: NodeId,
        discriminant: Discriminant,
    ) -> Result<Option<Payload>, ModelError> {
        let topic = self.check_mut(id)?;
        let removed = topic.payloads.remove(&discriminant);
        if let Some(removed) = &removed {
            removed.on_detach(&mut topic.attributes);
        }
        Ok(removed)
    }

    /// Sets or, with `None`, removes a topic attribute. Returns whether the
    /// value changed.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<bool, ModelError> {
        if let Some(value) = value {
            check_attribute(name, value)?;
        }
        Ok(set_or_remove(&mut self.check_mut(id)?.attributes, name, value))
    }

    /// Sets or, with `None`, removes the snippet for `language`. Returns
    /// whether anything changed. The language has to survive the opening
    /// fence line unchanged.
    pub fn set_code_snippet(
        &mut self,
        id: NodeId,
        language: &str,
        body: Option<&str>,
    ) -> Result<bool, ModelError> {
        if body.is_some() && !is_valid_language(language) {
            return Err(ModelError::InvalidSnippetLanguage(language.to_string()));
        }
        Ok(set_or_remove(&mut self.check_mut(id)?.code_snippets, language, body))
    }

    /// Removes attribute `name` from every topic under `id`, `id` included.
    pub fn remove_attribute_from_subtree(&mut self, id: NodeId, name: &str) -> Result<bool, ModelError> {
        self.check(id)?;
        let subtree: Vec<NodeId> = self.descendants(id).collect();
        let mut changed = false;
        for node in subtree {
            if let Some(topic) = self.nodes.get_mut(node) {
                changed |= topic.attributes.remove(name).is_some();
            }
        }
        Ok(changed)
    }

    /// Removes payloads of the given kinds from every topic under `id`,
    /// `id` included.
    pub fn remove_payload_from_subtree(
        &mut self,
        id: NodeId,
        discriminants: &[Discriminant],
    ) -> Result<bool, ModelError> {
        self.check(id)?;
        let subtree: Vec<NodeId> = self.descendants(id).collect();
        let mut changed = false;
        for node in subtree {
            for discriminant in discriminants {
                changed |= self.remove_payload(node, *discriminant)?.is_some();
            }
        }
        Ok(changed)
    }

    pub(crate) fn snapshot(&self, id: NodeId, with_children: bool) -> Option<Subtree> {
        let topic = self.topic(id)?;
        let children = if with_children {
            topic
                .children
                .iter()
                .filter_map(|child| self.snapshot(*child, true))
                .collect()
        } else {
            Vec::new()
        };
        Some(Subtree {
            text: topic.text.clone(),
            attributes: topic.attributes.clone(),
            payloads: topic.payloads.clone(),
            code_snippets: topic.code_snippets.clone(),
            children,
        })
    }

    /// Materialises `subtree` under `parent` (or detached) and returns the
    /// id of its top topic.
    pub(crate) fn insert_subtree(&mut self, subtree: Subtree, parent: Option<NodeId>) -> NodeId {
        let (topic, children) = subtree.into_topic();
        let id = self.nodes.insert(topic);
        if let Some(parent) = parent {
            self.link_child(parent, id, None);
        }
        for child in children {
            self.insert_subtree(child, Some(id));
        }
        id
    }

    /// Copies `id` from this map into `target`, as the last child of
    /// `new_parent` or detached when `new_parent` is `None`.
    pub fn copy_topic_into(
        &self,
        id: NodeId,
        target: &mut MindMap,
        new_parent: Option<NodeId>,
        with_children: bool,
    ) -> Result<NodeId, ModelError> {
        self.check(id)?;
        if let Some(parent) = new_parent {
            target.check(parent)?;
        }
        let subtree = self
            .snapshot(id, with_children)
            .ok_or(ModelError::UnknownTopic(id))?;
        Ok(target.insert_subtree(subtree, new_parent))
    }

    /// Duplicates `id` as the last child of its own parent. Link target
    /// UIDs are stripped from the copy so links keep a single target.
    pub fn clone_topic(&mut self, id: NodeId, with_children: bool) -> Result<NodeId, ModelError> {
        let Some(parent) = self.check(id)?.parent else {
            return Err(ModelError::RootOperation { operation: "clone" });
        };
        let mut subtree = self
            .snapshot(id, with_children)
            .ok_or(ModelError::UnknownTopic(id))?;
        subtree.strip_attribute(TOPIC_LINK_UID);
        let copy = self.insert_subtree(subtree, Some(parent));
        self.fire_structure_changed(Some(parent));
        Ok(copy)
    }

    /// Removes `id` and scrubs every topic link pointing at it. Removing the
    /// root empties it instead: text, payloads and children go while its
    /// attributes and code snippets stay.
    pub fn remove_topic(&mut self, id: NodeId) -> Result<bool, ModelError> {
        let topic = self.check(id)?;
        if self.root == Some(id) {
            let children = topic.children.clone();
            for child in children {
                self.free_subtree(child);
            }
            if let Some(root) = self.nodes.get_mut(id) {
                root.text.clear();
                root.children.clear();
                for payload in std::mem::take(&mut root.payloads).into_values() {
                    payload.on_detach(&mut root.attributes);
                }
            }
        } else {
            let uid = topic.attribute(TOPIC_LINK_UID).map(str::to_string);
            self.delete(id)?;
            if let (Some(uid), Some(root)) = (uid, self.root) {
                self.scrub_links(root, &uid);
            }
        }
        self.fire_structure_changed(self.root);
        Ok(true)
    }
}

/// Non-empty, no surrounding whitespace, no control characters and no
/// leading backtick.
fn is_valid_language(language: &str) -> bool {
    !language.is_empty()
        && language.trim() == language
        && !language.starts_with('`')
        && !language.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{NOTE_ENCRYPTED, NOTE_ENCRYPTED_HINT};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn children_texts(map: &MindMap, parent: NodeId) -> Vec<String> {
        map.topic(parent)
            .unwrap()
            .children()
            .iter()
            .map(|c| map.topic(*c).unwrap().text().to_string())
            .collect()
    }

    fn with_children(names: &[&str]) -> (MindMap, NodeId, Vec<NodeId>) {
        let mut map = MindMap::with_root();
        let root = map.root().unwrap();
        let ids = names
            .iter()
            .map(|name| map.make_child(root, *name, None).unwrap())
            .collect();
        (map, root, ids)
    }

    #[test]
    fn make_child_after_sibling() {
        let (mut map, root, ids) = with_children(&["a", "b", "c"]);
        map.make_child(root, "after-a", Some(ids[0])).unwrap();
        map.make_child(root, "end", Some(map.root().unwrap())).unwrap();

        assert_eq!(children_texts(&map, root), vec!["a", "after-a", "b", "c", "end"]);
    }

    #[rstest]
    #[case::forward_before(0, 2, true, &["b", "a", "c", "d"])]
    #[case::backward_before(3, 1, true, &["a", "d", "b", "c"])]
    #[case::forward_after(0, 2, false, &["b", "c", "a", "d"])]
    #[case::backward_after(3, 0, false, &["a", "d", "b", "c"])]
    fn move_relative_to_sibling(
        #[case] moved: usize,
        #[case] target: usize,
        #[case] before: bool,
        #[case] expected: &[&str],
    ) {
        let (mut map, root, ids) = with_children(&["a", "b", "c", "d"]);
        let result = if before {
            map.move_before(ids[moved], ids[target])
        } else {
            map.move_after(ids[moved], ids[target])
        };

        assert_eq!(result, Ok(true));
        assert_eq!(children_texts(&map, root), expected);
    }

    #[test]
    fn move_before_non_sibling_is_noop() {
        let (mut map, root, ids) = with_children(&["a", "b"]);
        let nested = map.make_child(ids[0], "nested", None).unwrap();

        assert_eq!(map.move_before(ids[1], nested), Ok(false));
        assert_eq!(map.move_before(ids[1], ids[1]), Ok(false));
        assert_eq!(children_texts(&map, root), vec!["a", "b"]);
    }

    #[test]
    fn make_first_and_last() {
        let (mut map, root, ids) = with_children(&["a", "b", "c"]);

        assert_eq!(map.make_first(ids[2]), Ok(true));
        assert_eq!(map.make_first(ids[2]), Ok(false));
        assert_eq!(map.make_last(ids[2]), Ok(true));
        assert_eq!(map.make_first(root), Ok(false));
        assert_eq!(children_texts(&map, root), vec!["a", "b", "c"]);
    }

    #[test]
    fn move_to_new_parent_rules() {
        let (mut map, root, ids) = with_children(&["a", "b"]);
        let nested = map.make_child(ids[0], "nested", None).unwrap();

        assert_eq!(map.move_to_new_parent(ids[1], nested), Ok(true));
        assert_eq!(map.topic(ids[1]).unwrap().parent(), Some(nested));
        assert_eq!(map.depth(ids[1]), Some(3));

        assert_eq!(map.move_to_new_parent(ids[1], nested), Ok(false));
        assert_eq!(
            map.move_to_new_parent(ids[0], nested),
            Err(ModelError::MoveIntoSubtree {
                moved: ids[0],
                target: nested
            })
        );
        assert_eq!(
            map.move_to_new_parent(ids[0], ids[0]),
            Err(ModelError::MoveIntoSubtree {
                moved: ids[0],
                target: ids[0]
            })
        );
        assert_eq!(
            map.move_to_new_parent(root, ids[0]),
            Err(ModelError::RootOperation { operation: "move" })
        );
    }

    #[test]
    fn detached_topic_can_be_attached() {
        let (mut map, root, _) = with_children(&["a"]);
        let loose = map.create_topic("loose");

        assert_eq!(map.move_to_new_parent(loose, root), Ok(true));
        assert_eq!(children_texts(&map, root), vec!["a", "loose"]);
    }

    #[test]
    fn foreign_topics_are_rejected() {
        let (mut map, root, _) = with_children(&["a"]);
        let mut other = MindMap::with_root();
        let foreign = other.make_child(other.root().unwrap(), "x", None).unwrap();

        assert_eq!(
            map.move_to_new_parent(foreign, root),
            Err(ModelError::ForeignTopic(foreign))
        );
        assert_eq!(
            map.make_child(foreign, "y", None),
            Err(ModelError::ForeignTopic(foreign))
        );
    }

    #[test]
    fn delete_frees_subtree_and_keeps_root() {
        let (mut map, root, ids) = with_children(&["a", "b"]);
        let nested = map.make_child(ids[0], "nested", None).unwrap();

        assert_eq!(map.delete(ids[0]), Ok(true));
        assert!(!map.contains(nested));
        assert_eq!(map.delete(nested), Err(ModelError::UnknownTopic(nested)));
        assert_eq!(map.delete(root), Ok(false));
        assert_eq!(children_texts(&map, root), vec!["b"]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn payloads_replace_by_discriminant_and_run_hooks() {
        let (mut map, _, ids) = with_children(&["a"]);
        let topic = ids[0];

        let previous = map
            .set_payload(topic, Payload::encrypted_note("CIPHER", Some("hint".into())))
            .unwrap();
        assert_eq!(previous, None);
        assert_eq!(map.topic(topic).unwrap().attribute(NOTE_ENCRYPTED), Some("true"));

        let previous = map.set_payload(topic, Payload::note("plain")).unwrap();
        assert!(matches!(previous, Some(Payload::Note { encrypted: true, .. })));
        assert_eq!(map.topic(topic).unwrap().attribute(NOTE_ENCRYPTED), None);

        map.set_payload(topic, Payload::encrypted_note("C2", Some("h2".into())))
            .unwrap();
        let removed = map.remove_payload(topic, Discriminant::Note).unwrap();
        assert!(removed.is_some());
        let topic = map.topic(topic).unwrap();
        assert!(!topic.has_payloads());
        assert_eq!(topic.attribute(NOTE_ENCRYPTED_HINT), None);
    }

    #[test]
    fn attribute_and_snippet_edits_report_changes() {
        let (mut map, _, ids) = with_children(&["a"]);
        let topic = ids[0];

        assert_eq!(map.set_attribute(topic, "collapsed", Some("true")), Ok(true));
        assert_eq!(map.set_attribute(topic, "collapsed", Some("true")), Ok(false));
        assert_eq!(map.set_attribute(topic, "collapsed", None), Ok(true));
        assert_eq!(map.set_attribute(topic, "collapsed", None), Ok(false));

        assert_eq!(map.set_code_snippet(topic, "Shell", Some("exit\n")), Ok(true));
        assert_eq!(map.set_code_snippet(topic, "Shell", Some("exit\n")), Ok(false));
        assert_eq!(map.topic(topic).unwrap().code_snippet("Shell"), Some("exit\n"));
        assert_eq!(map.set_code_snippet(topic, "Shell", None), Ok(true));
    }

    #[test]
    fn remove_attribute_from_subtree() {
        let (mut map, root, ids) = with_children(&["a", "b"]);
        map.set_attribute(root, "leftSide", Some("true")).unwrap();
        map.set_attribute(ids[1], "leftSide", Some("true")).unwrap();

        assert_eq!(map.remove_attribute_from_subtree(root, "leftSide"), Ok(true));
        assert_eq!(map.remove_attribute_from_subtree(root, "leftSide"), Ok(false));
        assert!(map.iter().all(|id| map.topic(id).unwrap().attribute("leftSide").is_none()));
    }

    #[test]
    fn copy_into_other_map() {
        let (mut map, _, ids) = with_children(&["a"]);
        map.make_child(ids[0], "nested", None).unwrap();
        map.set_payload(ids[0], Payload::note("note")).unwrap();
        map.set_code_snippet(ids[0], "Java", Some("x();\n")).unwrap();

        let mut target = MindMap::with_root();
        let target_root = target.root().unwrap();
        let deep = map
            .copy_topic_into(ids[0], &mut target, Some(target_root), true)
            .unwrap();
        let shallow = map.copy_topic_into(ids[0], &mut target, None, false).unwrap();

        assert_eq!(children_texts(&target, target_root), vec!["a"]);
        assert_eq!(children_texts(&target, deep), vec!["nested"]);
        assert_eq!(
            target.topic(deep).unwrap().payload(Discriminant::Note),
            Some(&Payload::note("note"))
        );
        assert_eq!(target.topic(deep).unwrap().code_snippet("Java"), Some("x();\n"));
        assert!(!target.topic(shallow).unwrap().has_children());
        assert_eq!(target.topic(shallow).unwrap().parent(), None);
    }

    #[test]
    fn clone_topic_strips_link_uids() {
        let (mut map, root, ids) = with_children(&["a", "b"]);
        let nested = map.make_child(ids[0], "nested", None).unwrap();
        map.set_attribute(ids[0], TOPIC_LINK_UID, Some("UID1A")).unwrap();
        map.set_attribute(nested, TOPIC_LINK_UID, Some("UID2A")).unwrap();

        let copy = map.clone_topic(ids[0], true).unwrap();

        assert_eq!(children_texts(&map, root), vec!["a", "b", "a"]);
        assert!(
            map.descendants(copy)
                .all(|id| map.topic(id).unwrap().attribute(TOPIC_LINK_UID).is_none())
        );
        assert_eq!(map.topic(nested).unwrap().attribute(TOPIC_LINK_UID), Some("UID2A"));
        assert_eq!(
            map.clone_topic(root, true),
            Err(ModelError::RootOperation { operation: "clone" })
        );
    }

    #[test]
    fn remove_topic_scrubs_links_to_it() {
        let (mut map, root, ids) = with_children(&["target", "linker"]);
        let link = map.make_link_to(ids[0]).unwrap();
        map.set_payload(ids[1], link).unwrap();

        assert_eq!(map.remove_topic(ids[0]), Ok(true));
        assert_eq!(children_texts(&map, root), vec!["linker"]);
        assert!(!map.topic(ids[1]).unwrap().has_payloads());
    }

    #[test]
    fn remove_root_empties_it() {
        let (mut map, root, ids) = with_children(&["a"]);
        map.set_text(root, "root").unwrap();
        map.set_attribute(root, "fillColor", Some("#fff")).unwrap();
        map.set_code_snippet(root, "Shell", Some("ls\n")).unwrap();
        map.set_payload(root, Payload::encrypted_note("c1pher", Some("pet".to_string())))
            .unwrap();

        assert_eq!(map.remove_topic(root), Ok(true));
        let topic = map.topic(root).unwrap();
        assert_eq!(topic.text(), "");
        assert!(!topic.has_payloads());
        assert!(!topic.has_children());
        assert!(!map.contains(ids[0]));
        assert_eq!(topic.attribute("fillColor"), Some("#fff"));
        assert_eq!(topic.attribute(NOTE_ENCRYPTED), None);
        assert_eq!(topic.attribute(NOTE_ENCRYPTED_HINT), None);
        assert_eq!(topic.code_snippet("Shell"), Some("ls\n"));
    }

    #[test]
    fn attribute_values_must_fit_one_line() {
        let (mut map, root, _) = with_children(&[]);

        assert_eq!(
            map.set_attribute(root, "comment", Some("line one\n# Injected")),
            Err(ModelError::MultilineAttribute("comment".to_string()))
        );
        assert_eq!(
            map.set_attribute(root, "comment", Some("carriage\rreturn")),
            Err(ModelError::MultilineAttribute("comment".to_string()))
        );
        assert_eq!(map.topic(root).unwrap().attribute("comment"), None);
    }

    #[rstest]
    #[case("my key")]
    #[case("a=b")]
    #[case("a,b")]
    #[case("")]
    #[case("nul\u{0}")]
    fn attribute_names_must_be_writable(#[case] name: &str) {
        let (mut map, root, _) = with_children(&[]);

        assert_eq!(
            map.set_attribute(root, name, Some("v")),
            Err(ModelError::InvalidAttributeName(name.to_string()))
        );
        assert!(map.topic(root).unwrap().attributes().is_empty());
    }

    #[test]
    fn multiline_hint_is_rejected_before_attaching() {
        let (mut map, root, _) = with_children(&[]);
        let note = Payload::encrypted_note("c1pher", Some("my\nhint".to_string()));

        assert_eq!(
            map.set_payload(root, note),
            Err(ModelError::MultilineAttribute(NOTE_ENCRYPTED_HINT.to_string()))
        );
        let topic = map.topic(root).unwrap();
        assert!(!topic.has_payloads());
        assert!(topic.attributes().is_empty());
    }

    #[rstest]
    #[case("")]
    #[case(" md")]
    #[case("`md")]
    #[case("md\n# Root")]
    fn snippet_language_must_fit_the_fence_line(#[case] language: &str) {
        let (mut map, root, _) = with_children(&[]);

        assert_eq!(
            map.set_code_snippet(root, language, Some("body\n")),
            Err(ModelError::InvalidSnippetLanguage(language.to_string()))
        );
        assert!(map.topic(root).unwrap().code_snippets().is_empty());
        assert_eq!(map.set_code_snippet(root, language, None), Ok(false));
    }

    #[test]
    fn snippet_language_may_contain_inner_spaces() {
        let (mut map, root, _) = with_children(&[]);
        assert_eq!(map.set_code_snippet(root, "Objective C", Some("x\n")), Ok(true));
    }

    #[test]
    fn remove_payload_from_subtree_drops_selected_kinds() {
        let (mut map, root, ids) = with_children(&["a", "b"]);
        let deep = map.make_child(ids[0], "deep", None).unwrap();
        map.set_payload(root, Payload::note("root note")).unwrap();
        map.set_payload(deep, Payload::encrypted_note("c1pher", None)).unwrap();
        map.set_payload(ids[1], Payload::TopicRef("18AB".to_string()))
            .unwrap();

        assert_eq!(
            map.remove_payload_from_subtree(ids[0], &[Discriminant::Note]),
            Ok(true)
        );
        assert!(!map.topic(deep).unwrap().has_payloads());
        assert_eq!(map.topic(deep).unwrap().attribute(NOTE_ENCRYPTED), None);
        assert!(map.topic(root).unwrap().has_payloads());

        assert_eq!(
            map.remove_payload_from_subtree(root, &[Discriminant::Note, Discriminant::Topic]),
            Ok(true)
        );
        assert!(map.iter().all(|id| !map.topic(id).unwrap().has_payloads()));
        assert_eq!(
            map.remove_payload_from_subtree(root, &[Discriminant::Note]),
            Ok(false)
        );
    }
}
