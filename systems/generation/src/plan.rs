//! Room content planning: obstacle templates, enemy markers and pickups.

use maze_dungeon_core::{ObstacleCode, ObstacleTemplate, Room, RoomPlan, SlotCoord, SLOTS_PER_CELL};
use rand::{seq::SliceRandom, Rng};

/// Base obstacle map measured in whole cells. `1` marks a rock.
struct BaseTemplate {
    columns: u32,
    rows: u32,
    cells: &'static [u8],
}

const BASE_TEMPLATES: [BaseTemplate; 6] = [
    BaseTemplate {
        columns: 3,
        rows: 3,
        cells: &[
            0, 0, 0, //
            1, 0, 0, //
            1, 0, 0,
        ],
    },
    BaseTemplate {
        columns: 4,
        rows: 3,
        cells: &[
            0, 0, 0, 0, //
            0, 1, 1, 0, //
            0, 0, 0, 0,
        ],
    },
    BaseTemplate {
        columns: 5,
        rows: 5,
        cells: &[
            0, 0, 0, 1, 1, //
            0, 1, 0, 0, 0, //
            0, 1, 1, 0, 0, //
            0, 0, 0, 0, 0, //
            0, 0, 0, 0, 0,
        ],
    },
    BaseTemplate {
        columns: 6,
        rows: 4,
        cells: &[
            0, 0, 0, 0, 0, 0, //
            0, 1, 1, 1, 0, 0, //
            0, 0, 0, 1, 0, 0, //
            0, 0, 0, 1, 0, 0,
        ],
    },
    BaseTemplate {
        columns: 7,
        rows: 4,
        cells: &[
            1, 1, 1, 1, 1, 0, 0, //
            0, 0, 0, 0, 0, 0, 0, //
            0, 0, 0, 1, 1, 1, 1, //
            0, 0, 0, 0, 0, 0, 0,
        ],
    },
    BaseTemplate {
        columns: 5,
        rows: 5,
        cells: &[
            0, 0, 0, 0, 0, //
            0, 0, 1, 0, 0, //
            0, 1, 1, 1, 0, //
            0, 0, 1, 0, 0, //
            0, 0, 0, 0, 0,
        ],
    },
];

impl BaseTemplate {
    fn footprint(&self, transposed: bool) -> (u32, u32) {
        if transposed {
            (self.rows, self.columns)
        } else {
            (self.columns, self.rows)
        }
    }

    fn is_rock(&self, column: u32, row: u32, transposed: bool) -> bool {
        let (column, row) = if transposed { (row, column) } else { (column, row) };
        let index = row * self.columns + column;
        usize::try_from(index)
            .ok()
            .and_then(|index| self.cells.get(index))
            .is_some_and(|code| *code == ObstacleCode::Rock.code())
    }
}

/// Builds one plan per room, in placement order.
pub(crate) fn plan_rooms<R: Rng + ?Sized>(rooms: &[Room], level: u32, rng: &mut R) -> Vec<RoomPlan> {
    let exit = rooms.last().map(Room::id);
    rooms
        .iter()
        .enumerate()
        .map(|(index, room)| {
            let is_entry = index == 0;
            let mut template = stamp_obstacles(room, rng);
            if !is_entry {
                scatter_enemies(&mut template, room, level, rng);
            }
            scatter_pickups(&mut template, rng);
            RoomPlan {
                room: room.id(),
                template,
                needs_exit_door: Some(room.id()) == exit,
            }
        })
        .collect()
}

fn stamp_obstacles<R: Rng + ?Sized>(room: &Room, rng: &mut R) -> ObstacleTemplate {
    let size = room.bounds().size();
    let mut template = ObstacleTemplate::empty(room.slot_columns(), room.slot_rows());

    let candidates: Vec<(&BaseTemplate, bool)> = BASE_TEMPLATES
        .iter()
        .flat_map(|base| [(base, false), (base, true)])
        .filter(|(base, transposed)| {
            let (columns, rows) = base.footprint(*transposed);
            columns <= size.width() && rows <= size.height()
        })
        .collect();

    let Some(&(base, transposed)) = candidates.choose(rng) else {
        return template;
    };

    let (columns, rows) = base.footprint(transposed);
    let offset_column = (size.width() - columns) * SLOTS_PER_CELL / 2;
    let offset_row = (size.height() - rows) * SLOTS_PER_CELL / 2;

    for row in 0..rows {
        for column in 0..columns {
            if !base.is_rock(column, row, transposed) {
                continue;
            }
            for dy in 0..SLOTS_PER_CELL {
                for dx in 0..SLOTS_PER_CELL {
                    let slot = SlotCoord::new(
                        offset_column + column * SLOTS_PER_CELL + dx,
                        offset_row + row * SLOTS_PER_CELL + dy,
                    );
                    let _ = template.set(slot, ObstacleCode::Rock);
                }
            }
        }
    }

    template
}

/// Number of enemies spawned in a room of `area` cells on `level`.
pub(crate) fn enemy_budget(level: u32, area: u32) -> usize {
    usize::try_from(1 + level / 2 + area / 12).unwrap_or(usize::MAX)
}

fn empty_slots(template: &ObstacleTemplate) -> Vec<SlotCoord> {
    template
        .iter()
        .filter(|(_, code)| *code == ObstacleCode::Empty)
        .map(|(slot, _)| slot)
        .collect()
}

fn scatter_enemies<R: Rng + ?Sized>(
    template: &mut ObstacleTemplate,
    room: &Room,
    level: u32,
    rng: &mut R,
) {
    let mut slots = empty_slots(template);
    let budget = enemy_budget(level, room.bounds().size().area()).min(slots.len());
    let (chosen, _) = slots.partial_shuffle(rng, budget);
    for slot in chosen.iter() {
        let _ = template.set(*slot, ObstacleCode::Enemy);
    }
}

fn scatter_pickups<R: Rng + ?Sized>(template: &mut ObstacleTemplate, rng: &mut R) {
    for code in [ObstacleCode::Trap, ObstacleCode::Scroll] {
        if !rng.gen_bool(0.5) {
            continue;
        }
        let slots = empty_slots(template);
        if let Some(slot) = slots.choose(rng) {
            let _ = template.set(*slot, code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_dungeon_core::{CellCoord, CellRect, CellRectSize, RoomId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn room(id: u8, width: u32, height: u32) -> Room {
        Room::new(
            RoomId::new(id),
            CellRect::from_origin_and_size(CellCoord::new(1, 1), CellRectSize::new(width, height)),
        )
    }

    #[test]
    fn enemy_budget_grows_with_level_and_area() {
        assert_eq!(enemy_budget(1, 9), 1);
        assert_eq!(enemy_budget(4, 24), 5);
    }

    #[test]
    fn entry_room_has_no_enemies_and_last_room_hosts_exit() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let rooms = [room(1, 5, 5), room(2, 6, 4), room(3, 4, 4)];
        let plans = plan_rooms(&rooms, 3, &mut rng);

        assert_eq!(plans.len(), 3);
        assert_eq!(plans[0].template.count(ObstacleCode::Enemy), 0);
        assert!(plans[1].template.count(ObstacleCode::Enemy) > 0);
        assert!(!plans[0].needs_exit_door);
        assert!(!plans[1].needs_exit_door);
        assert!(plans[2].needs_exit_door);
    }

    #[test]
    fn obstacles_stay_inside_the_room_slot_grid() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for seed in 0..32 {
            let room = room(1, 3 + seed % 5, 3 + (seed / 5) % 5);
            let template = stamp_obstacles(&room, &mut rng);
            assert_eq!(template.columns(), room.slot_columns());
            assert_eq!(template.rows(), room.slot_rows());
            assert_eq!(template.count(ObstacleCode::Rock) % 4, 0);
        }
    }

    #[test]
    fn rooms_too_small_for_any_template_stay_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let template = stamp_obstacles(&room(1, 2, 2), &mut rng);
        assert_eq!(template.count(ObstacleCode::Rock), 0);
    }
}
