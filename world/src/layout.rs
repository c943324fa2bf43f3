//! Lazily built runtime contents of a single room.

use log::{debug, warn};
use maze_dungeon_core::{
    Archetype, CellCoord, EntityId, ObstacleCode, ObstacleView, Room, RoomPlan, SlotCoord,
    SLOTS_PER_CELL,
};
use rand::Rng;

use crate::{arena::Arena, entities::Entity};

/// Archetypes that may spawn on `level`.
pub(crate) fn spawn_table(level: u32) -> Vec<Archetype> {
    let mut table = vec![Archetype::Walker];
    if level >= 2 {
        table.push(Archetype::Bruiser);
    }
    if level >= 3 {
        table.push(Archetype::Shooter);
    }
    table
}

/// Entities instantiated from a room plan.
#[derive(Clone, Debug)]
pub(crate) struct RoomLayout {
    room: Room,
    pub(crate) entities: Arena<Entity>,
    statics: Vec<Option<EntityId>>,
    dynamics: Vec<EntityId>,
    solid: Vec<bool>,
    exit_door: Option<EntityId>,
}

impl RoomLayout {
    pub(crate) fn build<R: Rng + ?Sized>(room: Room, plan: &RoomPlan, level: u32, rng: &mut R) -> Self {
        let columns = room.slot_columns();
        let rows = room.slot_rows();
        let len = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut layout = Self {
            room,
            entities: Arena::new(),
            statics: vec![None; len],
            dynamics: Vec::new(),
            solid: vec![false; len],
            exit_door: None,
        };

        let table = spawn_table(level);
        let mut empty = Vec::new();
        let mut template_door = None;

        for (slot, code) in plan.template.iter() {
            let position = room.slot_center(slot);
            let entity = match code {
                ObstacleCode::Empty => {
                    empty.push(slot);
                    continue;
                }
                ObstacleCode::Rock => Entity::rock(position),
                ObstacleCode::Trap => Entity::trap(position),
                ObstacleCode::Scroll => Entity::scroll(position),
                ObstacleCode::Door => Entity::door(position),
                ObstacleCode::Enemy => {
                    let archetype = table[rng.gen_range(0..table.len())];
                    Entity::enemy(archetype, level, position)
                }
            };
            let id = layout.place(slot, entity);
            if code == ObstacleCode::Door && template_door.is_none() {
                template_door = id;
            }
        }

        if plan.needs_exit_door {
            let door = template_door.or_else(|| {
                let bottom = rows.saturating_sub(1);
                let candidates: Vec<SlotCoord> = empty
                    .iter()
                    .copied()
                    .filter(|slot| slot.row() < bottom)
                    .collect();
                let pool = if candidates.is_empty() { &empty } else { &candidates };
                if pool.is_empty() {
                    warn!("room {} has no free slot for its exit door", room.id().get());
                    return None;
                }
                let slot = pool[rng.gen_range(0..pool.len())];
                layout.place(slot, Entity::door(room.slot_center(slot)))
            });
            layout.exit_door = door;
        }

        debug!(
            "built layout for room {}: {} entities, {} enemies",
            room.id().get(),
            layout.entities.len(),
            layout.dynamics.len()
        );
        layout
    }

    fn index(&self, slot: SlotCoord) -> Option<usize> {
        let columns = self.room.slot_columns();
        if slot.column() < columns && slot.row() < self.room.slot_rows() {
            let row = usize::try_from(slot.row()).ok()?;
            let column = usize::try_from(slot.column()).ok()?;
            let width = usize::try_from(columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn place(&mut self, slot: SlotCoord, entity: Entity) -> Option<EntityId> {
        let is_static = entity.is_static;
        let is_solid = entity.is_solid;
        let id = self.entities.insert(entity);
        if !is_static {
            self.dynamics.push(id);
            return Some(id);
        }

        let index = self.index(slot)?;
        if let Some(entry) = self.statics.get_mut(index) {
            *entry = Some(id);
        }
        if let Some(entry) = self.solid.get_mut(index) {
            *entry = is_solid;
        }
        Some(id)
    }

    pub(crate) fn room(&self) -> &Room {
        &self.room
    }

    pub(crate) fn exit_door(&self) -> Option<EntityId> {
        self.exit_door
    }

    /// Static entity occupying the slot, if any.
    pub(crate) fn static_at(&self, slot: SlotCoord) -> Option<EntityId> {
        self.index(slot)
            .and_then(|index| self.statics.get(index).copied().flatten())
    }

    pub(crate) fn static_ids(&self) -> Vec<EntityId> {
        self.statics.iter().flatten().copied().collect()
    }

    pub(crate) fn dynamic_ids(&self) -> &[EntityId] {
        &self.dynamics
    }

    /// Locked while any enemy, alive or fading, remains.
    pub(crate) fn has_enemies(&self) -> bool {
        !self.dynamics.is_empty()
    }

    pub(crate) fn obstacle_view(&self) -> ObstacleView<'_> {
        ObstacleView::new(&self.solid, self.room.slot_columns(), self.room.slot_rows())
    }

    /// Removes every entity flagged for removal.
    pub(crate) fn compact(&mut self) -> usize {
        let doomed: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, entity)| entity.pending_removal)
            .map(|(id, _)| id)
            .collect();

        for id in &doomed {
            let Some(entity) = self.entities.remove(*id) else {
                continue;
            };
            if entity.is_static {
                for (entry, solid) in self.statics.iter_mut().zip(self.solid.iter_mut()) {
                    if *entry == Some(*id) {
                        *entry = None;
                        *solid = false;
                    }
                }
            } else {
                self.dynamics.retain(|candidate| candidate != id);
            }
        }

        doomed.len()
    }

    /// First cell whose slots hold no entity, scanning rows then columns.
    pub(crate) fn free_cell(&self) -> Option<CellCoord> {
        let bounds = self.room.bounds();
        let occupied: Vec<SlotCoord> = self
            .dynamics
            .iter()
            .filter_map(|id| self.entities.get(*id))
            .filter_map(|entity| self.room.slot_at(entity.body.position))
            .collect();

        bounds.cells().find(|cell| {
            let local_column = (cell.column() - bounds.origin().column()) * SLOTS_PER_CELL;
            let local_row = (cell.row() - bounds.origin().row()) * SLOTS_PER_CELL;
            (0..SLOTS_PER_CELL).all(|dy| {
                (0..SLOTS_PER_CELL).all(|dx| {
                    let slot = SlotCoord::new(local_column + dx, local_row + dy);
                    self.static_at(slot).is_none() && !occupied.contains(&slot)
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_dungeon_core::{CellRect, CellRectSize, EntityKind, ObstacleTemplate, RoomId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn room() -> Room {
        Room::new(
            RoomId::new(1),
            CellRect::from_origin_and_size(CellCoord::new(1, 1), CellRectSize::new(2, 2)),
        )
    }

    fn plan(codes: &[u8], needs_exit_door: bool) -> RoomPlan {
        RoomPlan {
            room: RoomId::new(1),
            template: ObstacleTemplate::from_codes(4, 4, codes).expect("valid template"),
            needs_exit_door,
        }
    }

    #[test]
    fn template_codes_become_entities() {
        #[rustfmt::skip]
        let codes = [
            1, 0, 0, 0,
            0, 4, 0, 0,
            0, 0, 2, 0,
            0, 0, 0, 3,
        ];
        let layout = RoomLayout::build(room(), &plan(&codes, false), 1, &mut ChaCha8Rng::seed_from_u64(1));

        assert_eq!(layout.entities.len(), 4);
        assert_eq!(layout.dynamic_ids().len(), 1);
        assert!(layout.has_enemies());
        assert!(layout.obstacle_view().is_blocked(SlotCoord::new(0, 0)));
        assert!(!layout.obstacle_view().is_blocked(SlotCoord::new(2, 2)));

        let rock = layout.static_at(SlotCoord::new(0, 0)).expect("rock slot");
        let entity = layout.entities.get(rock).expect("rock entity");
        assert_eq!(entity.kind, EntityKind::Rock);
        assert_eq!(entity.body.position, glam::Vec2::new(125.0, 125.0));
    }

    #[test]
    fn exit_door_avoids_the_bottom_row() {
        for seed in 0..16 {
            let layout = RoomLayout::build(
                room(),
                &plan(&[0; 16], true),
                1,
                &mut ChaCha8Rng::seed_from_u64(seed),
            );
            let door = layout.exit_door().expect("door placed");
            let entity = layout.entities.get(door).expect("door entity");
            assert!(entity.locked);
            let slot = layout.room().slot_at(entity.body.position).expect("door inside room");
            assert!(slot.row() < 3);
        }
    }

    #[test]
    fn compaction_clears_slots_and_dynamics() {
        let codes = [1, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut layout =
            RoomLayout::build(room(), &plan(&codes, false), 1, &mut ChaCha8Rng::seed_from_u64(2));
        for id in layout.entities.ids() {
            if let Some(entity) = layout.entities.get_mut(id) {
                entity.pending_removal = true;
            }
        }

        assert_eq!(layout.compact(), 2);
        assert!(!layout.has_enemies());
        assert!(layout.static_ids().is_empty());
        assert!(!layout.obstacle_view().is_blocked(SlotCoord::new(0, 0)));
    }

    #[test]
    fn free_cell_skips_occupied_cells() {
        let codes = [0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let layout = RoomLayout::build(room(), &plan(&codes, false), 1, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(layout.free_cell(), Some(CellCoord::new(2, 1)));
    }

    #[test]
    fn spawn_table_unlocks_archetypes_by_level() {
        assert_eq!(spawn_table(1), vec![Archetype::Walker]);
        assert_eq!(spawn_table(2).len(), 2);
        assert_eq!(spawn_table(5), vec![Archetype::Walker, Archetype::Bruiser, Archetype::Shooter]);
    }
}
