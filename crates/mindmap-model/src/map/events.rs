use std::rc::Rc;

use crate::map::{MindMap, NodeId};

/// Receives change notifications from a [`MindMap`].
///
/// `path` runs from the top of the tree down to the affected topic and is
/// empty when the change concerns the whole map.
pub trait MapListener {
    fn structure_changed(&self, map: &MindMap, path: &[NodeId]);

    fn node_changed(&self, map: &MindMap, path: &[NodeId]);
}

/// Registration handle returned by [`MindMap::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl MindMap {
    pub fn add_listener(&self, listener: Rc<dyn MapListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Returns whether the listener was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    // Notification iterates over a copy, so listeners may add or remove
    // listeners while being called.
    fn listener_snapshot(&self) -> Vec<Rc<dyn MapListener>> {
        self.listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }

    pub fn fire_structure_changed(&self, topic: Option<NodeId>) {
        let path = topic.map(|id| self.path(id)).unwrap_or_default();
        log::debug!("structure changed at {path:?}");
        for listener in self.listener_snapshot() {
            listener.structure_changed(self, &path);
        }
    }

    pub fn fire_node_changed(&self, topic: NodeId) {
        let path = self.path(topic);
        for listener in self.listener_snapshot() {
            listener.node_changed(self, &path);
        }
    }
}
