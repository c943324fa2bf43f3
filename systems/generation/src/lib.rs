#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural floor generator that carves a connected maze of rooms and corridors.
//!
//! Generation runs in five passes over a scratch grid: room placement, corridor
//! carving, region connection, dead-end removal and conversion into the runtime
//! [`MazeGrid`]. Every pass draws from the caller supplied random number
//! generator so identical seeds reproduce identical floors.

mod plan;

use log::{debug, warn};
use maze_dungeon_core::{
    CellCoord, CellRect, CellRectSize, Direction, GeneratedFloor, MazeGrid, Room, RoomId,
    WallMask, MAX_ROOM_ID,
};
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tuning knobs that shape generated floors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Number of cell columns in the maze.
    pub width: u32,
    /// Number of cell rows in the maze.
    pub height: u32,
    /// Number of room placements attempted before corridors are carved.
    pub room_attempts: u32,
    /// Smallest room edge length in cells.
    pub min_room_size: u32,
    /// Largest room edge length in cells, before the rectangularity modifier.
    pub max_room_size: u32,
    /// Exclusive upper bound of the modifier added to one room edge.
    pub rectangularity: u32,
    /// Percentage chance of turning instead of continuing straight. 0 yields long corridors.
    pub winding_percent: u32,
    /// Probability of opening an extra connection between already joined regions.
    pub random_open_chance: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 40,
            room_attempts: 50,
            min_room_size: 3,
            max_room_size: 7,
            rectangularity: 3,
            winding_percent: 50,
            random_open_chance: 0.03,
        }
    }
}

/// Errors raised when a [`GenerationConfig`] cannot produce a maze.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GenerationError {
    /// The grid has no cells.
    #[error("maze dimensions must be non-zero, got {width}x{height}")]
    EmptyGrid {
        /// Configured column count.
        width: u32,
        /// Configured row count.
        height: u32,
    },
    /// The room size range is empty or starts at zero.
    #[error("invalid room size range {min}..={max}")]
    InvalidRoomSize {
        /// Configured minimum edge length.
        min: u32,
        /// Configured maximum edge length.
        max: u32,
    },
    /// The winding percentage exceeds 100.
    #[error("winding percent {0} exceeds 100")]
    WindingOutOfRange(u32),
    /// The extra connection probability lies outside `[0, 1]`.
    #[error("random open chance {0} must lie within [0, 1]")]
    RandomOpenOutOfRange(f64),
}

/// Validated maze generator.
#[derive(Clone, Debug)]
pub struct MazeGenerator {
    config: GenerationConfig,
}

impl MazeGenerator {
    /// Validates the configuration and creates a generator.
    pub fn new(config: GenerationConfig) -> Result<Self, GenerationError> {
        let error = if config.width == 0 || config.height == 0 {
            Some(GenerationError::EmptyGrid {
                width: config.width,
                height: config.height,
            })
        } else if config.min_room_size == 0 || config.min_room_size > config.max_room_size {
            Some(GenerationError::InvalidRoomSize {
                min: config.min_room_size,
                max: config.max_room_size,
            })
        } else if config.winding_percent > 100 {
            Some(GenerationError::WindingOutOfRange(config.winding_percent))
        } else if !(0.0..=1.0).contains(&config.random_open_chance) {
            Some(GenerationError::RandomOpenOutOfRange(
                config.random_open_chance,
            ))
        } else {
            None
        };

        match error {
            Some(error) => {
                warn!("rejected generation config: {error}");
                Err(error)
            }
            None => Ok(Self { config }),
        }
    }

    /// Configuration the generator was built with.
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generates the first floor of a dungeon.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> GeneratedFloor {
        self.generate_level(1, rng)
    }

    /// Generates a floor whose room plans are scaled for `level`.
    pub fn generate_level<R: Rng + ?Sized>(&self, level: u32, rng: &mut R) -> GeneratedFloor {
        let mut scratch = Scratch::new(self.config.width, self.config.height);

        let rooms = self.place_rooms(&mut scratch, rng);
        scratch.carve_corridors(self.config.winding_percent, rng);
        scratch.connect_regions(&rooms, self.config.random_open_chance, rng);
        if !rooms.is_empty() {
            scratch.remove_dead_ends();
        }

        let grid = scratch.into_grid();
        let plans = plan::plan_rooms(&rooms, level, rng);
        let entry_room = rooms.first().map(Room::id);
        let exit_room = rooms.last().map(Room::id);

        debug!(
            "generated floor {level}: {}x{} cells, {} rooms",
            grid.width(),
            grid.height(),
            rooms.len()
        );

        GeneratedFloor {
            level,
            grid,
            rooms,
            plans,
            entry_room,
            exit_room,
        }
    }

    fn place_rooms<R: Rng + ?Sized>(&self, scratch: &mut Scratch, rng: &mut R) -> Vec<Room> {
        let config = &self.config;
        let mut rooms: Vec<Room> = Vec::new();

        for _ in 0..config.room_attempts {
            let size = rng.gen_range(config.min_room_size..=config.max_room_size);
            let modifier = if config.rectangularity > 0 {
                rng.gen_range(0..config.rectangularity)
            } else {
                0
            };
            let (mut width, mut height) = (size, size);
            if rng.gen_bool(0.5) {
                width += modifier;
            } else {
                height += modifier;
            }

            if width > config.width || height > config.height {
                continue;
            }

            let column = rng.gen_range(0..=config.width - width);
            let row = rng.gen_range(0..=config.height - height);
            let bounds = CellRect::from_origin_and_size(
                CellCoord::new(column, row),
                CellRectSize::new(width, height),
            );

            if rooms.len() >= usize::from(MAX_ROOM_ID) {
                continue;
            }
            if rooms.iter().any(|room| room.bounds().intersects(&bounds)) {
                continue;
            }

            let id = RoomId::new(u8::try_from(rooms.len() + 1).unwrap_or(MAX_ROOM_ID));
            rooms.push(Room::new(id, bounds));
        }

        for room in &rooms {
            scratch.place_room(room);
        }

        rooms
    }
}

#[derive(Clone, Copy, Debug)]
struct ScratchCell {
    walls: WallMask,
    region: u32,
    room: Option<RoomId>,
}

/// Mutable working grid used while a floor is carved.
#[derive(Debug)]
struct Scratch {
    width: u32,
    height: u32,
    cells: Vec<ScratchCell>,
    regions: u32,
}

impl Scratch {
    fn new(width: u32, height: u32) -> Self {
        let len = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![
                ScratchCell {
                    walls: WallMask::CLOSED,
                    region: 0,
                    room: None,
                };
                len
            ],
            regions: 0,
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.width && cell.row() < self.height {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn get(&self, cell: CellCoord) -> Option<&ScratchCell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    fn get_mut(&mut self, cell: CellCoord) -> Option<&mut ScratchCell> {
        self.index(cell).and_then(move |index| self.cells.get_mut(index))
    }

    fn region(&self, cell: CellCoord) -> u32 {
        self.get(cell).map_or(0, |entry| entry.region)
    }

    fn neighbor(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let (column, row) = match direction {
            Direction::North => (cell.column(), cell.row().checked_sub(1)?),
            Direction::East => (cell.column().checked_add(1)?, cell.row()),
            Direction::South => (cell.column(), cell.row().checked_add(1)?),
            Direction::West => (cell.column().checked_sub(1)?, cell.row()),
        };
        (column < self.width && row < self.height).then_some(CellCoord::new(column, row))
    }

    fn next_region(&mut self) -> u32 {
        self.regions += 1;
        self.regions
    }

    fn place_room(&mut self, room: &Room) {
        let region = self.next_region();
        let bounds = room.bounds();
        for cell in bounds.cells() {
            let mut walls = WallMask::OPEN;
            if cell.row() == bounds.origin().row() {
                walls = walls.with(Direction::North);
            }
            if cell.row() + 1 == bounds.bottom() {
                walls = walls.with(Direction::South);
            }
            if cell.column() == bounds.origin().column() {
                walls = walls.with(Direction::West);
            }
            if cell.column() + 1 == bounds.right() {
                walls = walls.with(Direction::East);
            }
            if let Some(entry) = self.get_mut(cell) {
                *entry = ScratchCell {
                    walls,
                    region,
                    room: Some(room.id()),
                };
            }
        }
    }

    /// Removes the wall between `cell` and its neighbour on both sides.
    fn carve(&mut self, cell: CellCoord, direction: Direction) {
        let Some(neighbor) = self.neighbor(cell, direction) else {
            return;
        };
        if let Some(entry) = self.get_mut(cell) {
            entry.walls = entry.walls.without(direction);
        }
        if let Some(entry) = self.get_mut(neighbor) {
            entry.walls = entry.walls.without(direction.opposite());
        }
    }

    fn first_unvisited(&self, from: CellCoord) -> Option<CellCoord> {
        let start = self.index(from)?;
        self.cells
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, entry)| entry.region == 0)
            .and_then(|(index, _)| {
                let index = u32::try_from(index).ok()?;
                Some(CellCoord::new(index % self.width, index / self.width))
            })
    }

    fn carve_corridors<R: Rng + ?Sized>(&mut self, winding_percent: u32, rng: &mut R) {
        let mut seed = self.first_unvisited(CellCoord::new(0, 0));
        while let Some(start) = seed {
            let region = self.next_region();
            self.grow_from(start, region, winding_percent, rng);
            seed = self.first_unvisited(start);
        }
    }

    fn grow_from<R: Rng + ?Sized>(
        &mut self,
        start: CellCoord,
        region: u32,
        winding_percent: u32,
        rng: &mut R,
    ) {
        if let Some(entry) = self.get_mut(start) {
            entry.region = region;
        }

        let mut active = vec![start];
        let mut last_direction: Option<Direction> = None;

        while let Some(&current) = active.last() {
            let candidates: Vec<(Direction, CellCoord)> = Direction::ALL
                .iter()
                .filter_map(|&direction| {
                    let neighbor = self.neighbor(current, direction)?;
                    (self.region(neighbor) == 0).then_some((direction, neighbor))
                })
                .collect();

            if candidates.is_empty() {
                let _ = active.pop();
                last_direction = None;
                continue;
            }

            let straight = match last_direction {
                Some(last) if rng.gen_range(0..100) >= winding_percent => candidates
                    .iter()
                    .copied()
                    .find(|(direction, _)| *direction == last),
                _ => None,
            };
            let (direction, neighbor) = match straight {
                Some(choice) => choice,
                None => candidates[rng.gen_range(0..candidates.len())],
            };

            self.carve(current, direction);
            if let Some(entry) = self.get_mut(neighbor) {
                entry.region = region;
            }
            active.push(neighbor);
            last_direction = Some(direction);
        }
    }

    fn connect_regions<R: Rng + ?Sized>(&mut self, rooms: &[Room], random_open_chance: f64, rng: &mut R) {
        let mut regions = UnionFind::new(self.regions);
        let mut edges = Vec::new();

        for room in rooms {
            let bounds = room.bounds();
            let (left, top) = (bounds.origin().column(), bounds.origin().row());
            let (right, bottom) = (bounds.right() - 1, bounds.bottom() - 1);
            for column in left..=right {
                edges.push((CellCoord::new(column, top), Direction::North));
            }
            for column in left..=right {
                edges.push((CellCoord::new(column, bottom), Direction::South));
            }
            for row in top..=bottom {
                edges.push((CellCoord::new(left, row), Direction::West));
            }
            for row in top..=bottom {
                edges.push((CellCoord::new(right, row), Direction::East));
            }
        }

        edges.shuffle(rng);

        for (cell, direction) in edges {
            let Some(neighbor) = self.neighbor(cell, direction) else {
                continue;
            };
            let (from, to) = (self.region(cell), self.region(neighbor));
            if to == 0 || to == from {
                continue;
            }
            if !regions.connected(from, to) || rng.gen_bool(random_open_chance) {
                self.carve(cell, direction);
                regions.union(from, to);
            }
        }

        // Corridor regions that never touched a room edge.
        let cells: Vec<CellCoord> = (0..self.height)
            .flat_map(|row| (0..self.width).map(move |column| CellCoord::new(column, row)))
            .collect();
        for cell in cells {
            for direction in [Direction::East, Direction::South] {
                let Some(neighbor) = self.neighbor(cell, direction) else {
                    continue;
                };
                let (from, to) = (self.region(cell), self.region(neighbor));
                if from == 0 || to == 0 || regions.connected(from, to) {
                    continue;
                }
                self.carve(cell, direction);
                regions.union(from, to);
            }
        }
    }

    fn remove_dead_ends(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            for row in 0..self.height {
                for column in 0..self.width {
                    let cell = CellCoord::new(column, row);
                    let Some(entry) = self.get(cell).copied() else {
                        continue;
                    };
                    if entry.room.is_some() || entry.walls == WallMask::CLOSED {
                        continue;
                    }
                    if entry.walls.open_sides() <= 1 {
                        self.fill(cell, entry.walls);
                        changed = true;
                    }
                }
            }
        }
    }

    fn fill(&mut self, cell: CellCoord, walls: WallMask) {
        for direction in Direction::ALL {
            if walls.contains(direction) {
                continue;
            }
            if let Some(neighbor) = self.neighbor(cell, direction) {
                if let Some(entry) = self.get_mut(neighbor) {
                    entry.walls = entry.walls.with(direction.opposite());
                }
            }
        }
        if let Some(entry) = self.get_mut(cell) {
            entry.walls = WallMask::CLOSED;
        }
    }

    fn into_grid(self) -> MazeGrid {
        let mut grid = MazeGrid::solid(self.width, self.height);
        for row in 0..self.height {
            for column in 0..self.width {
                let cell = CellCoord::new(column, row);
                if let Some(entry) = self.get(cell) {
                    let _ = grid.set(cell, entry.walls, entry.room);
                }
            }
        }
        grid
    }
}

/// Disjoint-set forest over region identifiers.
#[derive(Debug)]
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(regions: u32) -> Self {
        Self {
            parent: (0..=regions).collect(),
        }
    }

    fn find(&mut self, region: u32) -> u32 {
        let mut root = region;
        while let Some(&parent) = usize::try_from(root).ok().and_then(|i| self.parent.get(i)) {
            if parent == root {
                break;
            }
            root = parent;
        }

        let mut current = region;
        while current != root {
            let Some(slot) = usize::try_from(current)
                .ok()
                .and_then(|i| self.parent.get_mut(i))
            else {
                break;
            };
            current = std::mem::replace(slot, root);
        }
        root
    }

    fn union(&mut self, a: u32, b: u32) {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a != root_b {
            if let Some(slot) = usize::try_from(root_a)
                .ok()
                .and_then(|i| self.parent.get_mut(i))
            {
                *slot = root_b;
            }
        }
    }

    fn connected(&mut self, a: u32, b: u32) -> bool {
        self.find(a) == self.find(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_configs() {
        let zero = GenerationConfig {
            width: 0,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            MazeGenerator::new(zero),
            Err(GenerationError::EmptyGrid { .. })
        ));

        let inverted = GenerationConfig {
            min_room_size: 8,
            max_room_size: 4,
            ..GenerationConfig::default()
        };
        assert_eq!(
            MazeGenerator::new(inverted).unwrap_err(),
            GenerationError::InvalidRoomSize { min: 8, max: 4 }
        );

        let winding = GenerationConfig {
            winding_percent: 101,
            ..GenerationConfig::default()
        };
        assert_eq!(
            MazeGenerator::new(winding).unwrap_err(),
            GenerationError::WindingOutOfRange(101)
        );

        let chance = GenerationConfig {
            random_open_chance: 1.5,
            ..GenerationConfig::default()
        };
        assert!(matches!(
            MazeGenerator::new(chance),
            Err(GenerationError::RandomOpenOutOfRange(_))
        ));
    }

    #[test]
    fn union_find_joins_regions() {
        let mut regions = UnionFind::new(5);
        assert!(!regions.connected(1, 4));
        regions.union(1, 2);
        regions.union(2, 4);
        assert!(regions.connected(1, 4));
        assert!(!regions.connected(3, 4));
    }

    #[test]
    fn filling_a_cell_walls_its_neighbours() {
        let mut scratch = Scratch::new(3, 1);
        scratch.carve(CellCoord::new(0, 0), Direction::East);
        scratch.carve(CellCoord::new(1, 0), Direction::East);

        let middle = CellCoord::new(1, 0);
        let walls = scratch.get(middle).map(|entry| entry.walls).unwrap();
        scratch.fill(middle, walls);

        let left = scratch.get(CellCoord::new(0, 0)).unwrap();
        let right = scratch.get(CellCoord::new(2, 0)).unwrap();
        assert_eq!(left.walls, WallMask::CLOSED);
        assert_eq!(right.walls, WallMask::CLOSED);
    }
}
