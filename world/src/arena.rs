//! Generational storage for room entities.

use maze_dungeon_core::EntityId;

#[derive(Clone, Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot map whose handles go stale once the addressed value is removed.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> EntityId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            if let Some(slot) = usize::try_from(index)
                .ok()
                .and_then(|i| self.slots.get_mut(i))
            {
                slot.generation = slot.generation.wrapping_add(1);
                slot.value = Some(value);
                return EntityId::new(index, slot.generation);
            }
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        EntityId::new(index, 0)
    }

    fn slot(&self, id: EntityId) -> Option<&Slot<T>> {
        let slot = usize::try_from(id.index())
            .ok()
            .and_then(|i| self.slots.get(i))?;
        (slot.generation == id.generation()).then_some(slot)
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&T> {
        self.slot(id).and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let slot = usize::try_from(id.index())
            .ok()
            .and_then(|i| self.slots.get_mut(i))?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<T> {
        let slot = usize::try_from(id.index())
            .ok()
            .and_then(|i| self.slots.get_mut(i))?;
        if slot.generation != id.generation() {
            return None;
        }
        let value = slot.value.take()?;
        self.free.push(id.index());
        self.len -= 1;
        Some(value)
    }

    /// Live entries in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let value = slot.value.as_ref()?;
            let index = u32::try_from(index).ok()?;
            Some((EntityId::new(index, slot.generation), value))
        })
    }

    pub(crate) fn ids(&self) -> Vec<EntityId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}
