use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_ARENA_TAG: AtomicU32 = AtomicU32::new(1);

/// Stable handle to a topic inside one [`MindMap`](crate::MindMap).
///
/// Handles carry the owning map's tag, so a handle from another map is
/// rejected rather than silently aliasing a slot, and a generation, so a
/// handle to a deleted topic never resolves to whatever reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    tag: u32,
    index: u32,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational slot storage.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    tag: u32,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            tag: NEXT_ARENA_TAG.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// True when `id` was issued by this arena, live or not.
    pub(crate) fn owns(&self, id: NodeId) -> bool {
        id.tag == self.tag
    }

    pub(crate) fn insert(&mut self, value: T) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return NodeId {
                tag: self.tag,
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        NodeId {
            tag: self.tag,
            index,
            generation: 0,
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        if !self.owns(id) {
            return None;
        }
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        if !self.owns(id) {
            return None;
        }
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> Option<T> {
        if !self.owns(id) {
            return None;
        }
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Drops every value. Outstanding handles become stale.
    pub(crate) fn clear(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index as u32);
        }
    }
}
