#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Dungeon engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command batches.
//!
//! The crate also owns the data handed from generation to simulation: the
//! runtime [`MazeGrid`], the placed [`Room`] rectangles and the per-room
//! [`RoomPlan`] obstacle templates bundled in a [`GeneratedFloor`].

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to the Maze Dungeon.";

/// Side length of a single maze cell measured in world units.
pub const CELL_SIZE: f32 = 100.0;

/// Side length of a single entity slot. Every maze cell holds 2×2 slots.
pub const HALF_CELL: f32 = CELL_SIZE / 2.0;

/// Thickness of the wall segments drawn along cell edges.
pub const WALL_THICKNESS: f32 = 10.0;

/// Number of entity slots along each edge of a maze cell.
pub const SLOTS_PER_CELL: u32 = 2;

/// Largest room identifier that fits inside the packed room bits of a cell.
pub const MAX_ROOM_ID: u8 = 63;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock and applies the player's intents.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
        /// Movement and shooting intents forwarded by the input layer.
        input: PlayerInput,
    },
    /// Accelerates an enemy toward the provided direction for the current tick.
    ///
    /// A zero vector asks the enemy to hold position and bleed off velocity.
    SteerEnemy {
        /// Identifier of the enemy being steered.
        enemy: EntityId,
        /// Desired direction of travel. Normalised by the world.
        direction: Vec2,
    },
    /// Requests that a ranged enemy launch a projectile.
    FireProjectile {
        /// Identifier of the enemy that fires.
        enemy: EntityId,
        /// Direction the projectile should travel.
        direction: Vec2,
    },
    /// Runs the wall, pickup and combat collision pass followed by compaction.
    ResolveCollisions,
    /// Freezes the simulation while the next floor is prepared.
    BeginFloorTransition,
    /// Replaces the active floor with freshly generated data.
    CompleteFloor {
        /// Floor that becomes active once the command is applied.
        floor: Box<GeneratedFloor>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the player crossed into a different room or corridor.
    RoomChanged {
        /// Room the player occupied before the move, if any.
        from: Option<RoomId>,
        /// Room the player occupies now, if any.
        to: Option<RoomId>,
    },
    /// Confirms that a projectile was launched.
    ProjectileFired {
        /// Side that owns the projectile.
        faction: Faction,
        /// Spawn position of the projectile.
        position: Vec2,
    },
    /// Reports damage absorbed by the player.
    PlayerDamaged {
        /// Amount of health removed.
        amount: f32,
    },
    /// Reports damage absorbed by an enemy that survived the hit.
    EnemyDamaged {
        /// Identifier of the damaged enemy.
        enemy: EntityId,
        /// Health remaining after the hit.
        health: f32,
    },
    /// Reports that an enemy ran out of health and began fading out.
    EnemyKilled {
        /// Identifier of the defeated enemy.
        enemy: EntityId,
        /// Archetype of the defeated enemy.
        archetype: Archetype,
    },
    /// Announces that every enemy in a room has been removed.
    RoomCleared {
        /// Room that became cleared.
        room: RoomId,
    },
    /// Announces that an exit door became usable.
    DoorUnlocked {
        /// Identifier of the door entity.
        door: EntityId,
    },
    /// Reports that the player overlaps an unlocked door during this tick.
    DoorContact {
        /// Identifier of the touched door.
        door: EntityId,
    },
    /// Reports that a pickup granted an effect to the player.
    EffectGranted {
        /// Effect that was granted.
        effect: EffectKind,
    },
    /// Confirms that the world froze in preparation for a floor change.
    FloorTransitionStarted,
    /// Confirms that a new floor replaced the previous one.
    FloorAdvanced {
        /// One-based index of the floor that became active.
        floor: u32,
    },
}

/// Movement and shooting intents captured by the input layer for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerInput {
    /// Desired movement vector. Magnitudes above one are clamped.
    pub movement: Vec2,
    /// Direction the player wants to shoot in, if any.
    pub shoot: Option<Direction>,
}

/// Cardinal directions used for walls, facing and shooting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    North,
    /// Toward increasing column indices.
    East,
    /// Toward increasing row indices.
    South,
    /// Toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in the order Up, Right, Down, Left.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Unit vector in world space. Rows grow downward.
    #[must_use]
    pub fn unit_vector(self) -> Vec2 {
        match self {
            Self::North => Vec2::new(0.0, -1.0),
            Self::East => Vec2::new(1.0, 0.0),
            Self::South => Vec2::new(0.0, 1.0),
            Self::West => Vec2::new(-1.0, 0.0),
        }
    }

    /// Whether the direction runs along the x axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::East | Self::West)
    }

    /// Classifies an arbitrary vector into the closest cardinal direction.
    ///
    /// Returns `None` for a zero vector.
    #[must_use]
    pub fn from_vector(vector: Vec2) -> Option<Self> {
        if vector.length_squared() == 0.0 {
            return None;
        }
        let angle = vector.y.atan2(vector.x).to_degrees();
        if (-135.0..=-45.0).contains(&angle) {
            Some(Self::North)
        } else if (-45.0..45.0).contains(&angle) {
            Some(Self::East)
        } else if (45.0..135.0).contains(&angle) {
            Some(Self::South)
        } else {
            Some(Self::West)
        }
    }
}

/// Set of wall flags attached to one side of each maze cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WallMask(u8);

impl WallMask {
    /// Wall on the left edge of the cell.
    pub const LEFT: u8 = 0b0001;
    /// Wall on the top edge of the cell.
    pub const UP: u8 = 0b0010;
    /// Wall on the right edge of the cell.
    pub const RIGHT: u8 = 0b0100;
    /// Wall on the bottom edge of the cell.
    pub const DOWN: u8 = 0b1000;
    /// Mask with no walls.
    pub const OPEN: Self = Self(0);
    /// Mask with all four walls present.
    pub const CLOSED: Self = Self(0b1111);

    /// Builds a mask from raw bits, discarding anything outside the wall bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    /// Raw wall bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Bit that represents the wall on the provided side.
    #[must_use]
    pub const fn bit(direction: Direction) -> u8 {
        match direction {
            Direction::West => Self::LEFT,
            Direction::North => Self::UP,
            Direction::East => Self::RIGHT,
            Direction::South => Self::DOWN,
        }
    }

    /// Whether a wall is present on the provided side.
    #[must_use]
    pub const fn contains(self, direction: Direction) -> bool {
        self.0 & Self::bit(direction) != 0
    }

    /// Copy of the mask with the wall on `direction` set.
    #[must_use]
    pub const fn with(self, direction: Direction) -> Self {
        Self(self.0 | Self::bit(direction))
    }

    /// Copy of the mask with the wall on `direction` cleared.
    #[must_use]
    pub const fn without(self, direction: Direction) -> Self {
        Self(self.0 & !Self::bit(direction))
    }

    /// Number of sides without a wall.
    #[must_use]
    pub const fn open_sides(self) -> u32 {
        4 - self.0.count_ones()
    }
}

/// Identifier of a placed room. Zero is reserved for corridors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(u8);

impl RoomId {
    /// Creates a new room identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Stable handle into a generational entity arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Creates a handle from its slot index and generation counter.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the owning arena.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation counter that invalidates handles to recycled slots.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Location of a single maze cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Centre of the cell in world units.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(
            (self.column as f32 + 0.5) * CELL_SIZE,
            (self.row as f32 + 0.5) * CELL_SIZE,
        )
    }
}

/// Location of an entity slot inside a room, measured at double resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotCoord {
    column: u32,
    row: u32,
}

impl SlotCoord {
    /// Creates a new slot coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based slot column relative to the room's left edge.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based slot row relative to the room's top edge.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Column one past the rectangle's right edge.
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.origin.column() + self.size.width()
    }

    /// Row one past the rectangle's bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.origin.row() + self.size.height()
    }

    /// Reports whether the two rectangles share any cell.
    ///
    /// Rectangles that merely touch along an edge do not intersect.
    #[must_use]
    pub const fn intersects(&self, other: &CellRect) -> bool {
        self.origin.column() < other.right()
            && self.right() > other.origin.column()
            && self.origin.row() < other.bottom()
            && self.bottom() > other.origin.row()
    }

    /// Reports whether the cell lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() >= self.origin.column()
            && cell.column() < self.right()
            && cell.row() >= self.origin.row()
            && cell.row() < self.bottom()
    }

    /// Iterates every cell of the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let left = self.origin.column();
        let right = self.right();
        (self.origin.row()..self.bottom())
            .flat_map(move |row| (left..right).map(move |column| CellCoord::new(column, row)))
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells covered by the rectangle.
    #[must_use]
    pub const fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// Runtime maze representation: one packed `u16` per cell in row-major order.
///
/// The low four bits hold the [`WallMask`]; bits 8 through 13 hold the
/// [`RoomId`] of room cells and stay zero for corridors. A cell carrying all
/// four walls and no room id is solid rock that nothing can enter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeGrid {
    width: u32,
    height: u32,
    cells: Vec<u16>,
}

impl MazeGrid {
    /// Bit offset of the packed room identifier.
    pub const ROOM_SHIFT: u16 = 8;
    /// Mask selecting the packed room identifier.
    pub const ROOM_MASK: u16 = 0x3f00;
    /// Mask selecting the wall bits.
    pub const WALL_MASK: u16 = 0x000f;

    /// Creates a grid in which every cell is solid rock.
    #[must_use]
    pub fn solid(width: u32, height: u32) -> Self {
        let len = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            cells: vec![Self::pack(WallMask::CLOSED, None); len],
        }
    }

    /// Overwrites the walls and room of a cell. Returns `false` when out of range.
    pub fn set(&mut self, cell: CellCoord, walls: WallMask, room: Option<RoomId>) -> bool {
        match self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            Some(entry) => {
                *entry = Self::pack(walls, room);
                true
            }
            None => false,
        }
    }

    /// Wraps raw packed cells. Returns `None` when the length mismatches.
    #[must_use]
    pub fn from_raw(width: u32, height: u32, cells: Vec<u16>) -> Option<Self> {
        let expected = usize::try_from(u64::from(width) * u64::from(height)).ok()?;
        if cells.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            cells,
        })
    }

    /// Packs a wall mask and an optional room id into a single cell value.
    #[must_use]
    pub const fn pack(walls: WallMask, room: Option<RoomId>) -> u16 {
        let room_bits = match room {
            Some(room) => ((room.get() as u16) << Self::ROOM_SHIFT) & Self::ROOM_MASK,
            None => 0,
        };
        room_bits | walls.bits() as u16
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw packed cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[u16] {
        &self.cells
    }

    /// Wall mask of the cell, if it lies inside the grid.
    #[must_use]
    pub fn walls(&self, cell: CellCoord) -> Option<WallMask> {
        let raw = self.raw(cell)?;
        Some(WallMask::from_bits((raw & Self::WALL_MASK) as u8))
    }

    /// Room containing the cell. Corridors and out-of-range cells yield `None`.
    #[must_use]
    pub fn room_at(&self, cell: CellCoord) -> Option<RoomId> {
        let raw = self.raw(cell)?;
        let id = ((raw & Self::ROOM_MASK) >> Self::ROOM_SHIFT) as u8;
        (id > 0).then_some(RoomId::new(id))
    }

    /// Whether the cell is filled rock. Out-of-range cells count as solid.
    #[must_use]
    pub fn is_solid(&self, cell: CellCoord) -> bool {
        match self.raw(cell) {
            Some(raw) => raw == WallMask::CLOSED.bits() as u16,
            None => true,
        }
    }

    /// Whether the wall on the given side of the cell is present.
    ///
    /// Out-of-range cells report every side as walled.
    #[must_use]
    pub fn has_wall(&self, cell: CellCoord, direction: Direction) -> bool {
        self.walls(cell)
            .map_or(true, |walls| walls.contains(direction))
    }

    /// Neighbouring cell in the provided direction, if it lies inside the grid.
    #[must_use]
    pub fn neighbor(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let (column, row) = match direction {
            Direction::North => (cell.column(), cell.row().checked_sub(1)?),
            Direction::East => (cell.column().checked_add(1)?, cell.row()),
            Direction::South => (cell.column(), cell.row().checked_add(1)?),
            Direction::West => (cell.column().checked_sub(1)?, cell.row()),
        };
        (column < self.width && row < self.height).then_some(CellCoord::new(column, row))
    }

    /// Cell containing the world-space position, if any.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<CellCoord> {
        let column = (position.x / CELL_SIZE).floor();
        let row = (position.y / CELL_SIZE).floor();
        if column < 0.0 || row < 0.0 {
            return None;
        }
        let (column, row) = (column as u32, row as u32);
        (column < self.width && row < self.height).then_some(CellCoord::new(column, row))
    }

    /// Room containing the world-space position, if any.
    #[must_use]
    pub fn room_at_position(&self, position: Vec2) -> Option<RoomId> {
        self.cell_at(position).and_then(|cell| self.room_at(cell))
    }

    /// Iterates every cell coordinate in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = CellCoord> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |column| CellCoord::new(column, row)))
    }

    /// Row-major index of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.width && cell.row() < self.height {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }

    fn raw(&self, cell: CellCoord) -> Option<u16> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }
}

/// Rectangular room placed by the generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    id: RoomId,
    bounds: CellRect,
}

impl Room {
    /// Creates a room occupying the provided rectangle.
    #[must_use]
    pub const fn new(id: RoomId, bounds: CellRect) -> Self {
        Self { id, bounds }
    }

    /// Identifier packed into every cell of the room.
    #[must_use]
    pub const fn id(&self) -> RoomId {
        self.id
    }

    /// Rectangle covered by the room in cell coordinates.
    #[must_use]
    pub const fn bounds(&self) -> CellRect {
        self.bounds
    }

    /// World-space position of the room's upper-left corner.
    #[must_use]
    pub fn origin(&self) -> Vec2 {
        let origin = self.bounds.origin();
        Vec2::new(
            origin.column() as f32 * CELL_SIZE,
            origin.row() as f32 * CELL_SIZE,
        )
    }

    /// Number of slot columns covering the room.
    #[must_use]
    pub const fn slot_columns(&self) -> u32 {
        self.bounds.size().width() * SLOTS_PER_CELL
    }

    /// Number of slot rows covering the room.
    #[must_use]
    pub const fn slot_rows(&self) -> u32 {
        self.bounds.size().height() * SLOTS_PER_CELL
    }

    /// Slot containing the world-space position, if it lies inside the room.
    #[must_use]
    pub fn slot_at(&self, position: Vec2) -> Option<SlotCoord> {
        let local = position - self.origin();
        let column = (local.x / HALF_CELL).floor();
        let row = (local.y / HALF_CELL).floor();
        if column < 0.0 || row < 0.0 {
            return None;
        }
        let (column, row) = (column as u32, row as u32);
        (column < self.slot_columns() && row < self.slot_rows())
            .then_some(SlotCoord::new(column, row))
    }

    /// World-space centre of a slot.
    #[must_use]
    pub fn slot_center(&self, slot: SlotCoord) -> Vec2 {
        self.origin()
            + Vec2::new(
                slot.column() as f32 * HALF_CELL + HALF_CELL / 2.0,
                slot.row() as f32 * HALF_CELL + HALF_CELL / 2.0,
            )
    }
}

/// Entity type codes understood by obstacle templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleCode {
    /// Nothing is placed in the slot.
    Empty,
    /// A solid, immovable rock.
    Rock,
    /// A trap that curses the player on contact.
    Trap,
    /// A scroll that blesses the player on contact.
    Scroll,
    /// Spawn point for an enemy drawn from the floor's spawn table.
    Enemy,
    /// Fixed position for the room's exit door.
    Door,
}

impl ObstacleCode {
    /// Decodes a numeric template code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Rock),
            2 => Some(Self::Trap),
            3 => Some(Self::Scroll),
            4 => Some(Self::Enemy),
            5 => Some(Self::Door),
            _ => None,
        }
    }

    /// Numeric code used by serialized templates.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Rock => 1,
            Self::Trap => 2,
            Self::Scroll => 3,
            Self::Enemy => 4,
            Self::Door => 5,
        }
    }
}

/// Errors raised while constructing an [`ObstacleTemplate`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The number of codes does not match the declared dimensions.
    #[error("template declares {expected} slots but provides {actual} codes")]
    DimensionMismatch {
        /// Slot count implied by the dimensions.
        expected: usize,
        /// Number of codes supplied.
        actual: usize,
    },
    /// A code outside the known obstacle range was supplied.
    #[error("unknown obstacle code {code} at column {column}, row {row}")]
    UnknownCode {
        /// Offending code.
        code: u8,
        /// Slot column of the offending code.
        column: u32,
        /// Slot row of the offending code.
        row: u32,
    },
}

/// Dense slot-resolution grid of obstacle codes describing a room's contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleTemplate {
    columns: u32,
    rows: u32,
    codes: Vec<ObstacleCode>,
}

impl ObstacleTemplate {
    /// Creates an empty template with the provided dimensions.
    #[must_use]
    pub fn empty(columns: u32, rows: u32) -> Self {
        let len = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        Self {
            columns,
            rows,
            codes: vec![ObstacleCode::Empty; len],
        }
    }

    /// Decodes a row-major list of numeric codes, failing fast on bad input.
    pub fn from_codes(columns: u32, rows: u32, codes: &[u8]) -> Result<Self, TemplateError> {
        let expected = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(usize::MAX);
        if codes.len() != expected {
            return Err(TemplateError::DimensionMismatch {
                expected,
                actual: codes.len(),
            });
        }

        let mut decoded = Vec::with_capacity(codes.len());
        for (index, &code) in codes.iter().enumerate() {
            let Some(obstacle) = ObstacleCode::from_code(code) else {
                let index = u32::try_from(index).unwrap_or(u32::MAX);
                return Err(TemplateError::UnknownCode {
                    code,
                    column: index % columns.max(1),
                    row: index / columns.max(1),
                });
            };
            decoded.push(obstacle);
        }

        Ok(Self {
            columns,
            rows,
            codes: decoded,
        })
    }

    /// Number of slot columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of slot rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Code stored at the slot, if it lies inside the template.
    #[must_use]
    pub fn get(&self, slot: SlotCoord) -> Option<ObstacleCode> {
        self.index(slot)
            .and_then(|index| self.codes.get(index).copied())
    }

    /// Overwrites the code at the slot. Returns `false` when out of range.
    pub fn set(&mut self, slot: SlotCoord, code: ObstacleCode) -> bool {
        match self.index(slot).and_then(|index| self.codes.get_mut(index)) {
            Some(entry) => {
                *entry = code;
                true
            }
            None => false,
        }
    }

    /// Iterates every slot with its code in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotCoord, ObstacleCode)> + '_ {
        let columns = self.columns.max(1);
        self.codes.iter().enumerate().map(move |(index, code)| {
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            (SlotCoord::new(index % columns, index / columns), *code)
        })
    }

    /// Number of slots holding the provided code.
    #[must_use]
    pub fn count(&self, code: ObstacleCode) -> usize {
        self.codes.iter().filter(|candidate| **candidate == code).count()
    }

    fn index(&self, slot: SlotCoord) -> Option<usize> {
        if slot.column() < self.columns && slot.row() < self.rows {
            let row = usize::try_from(slot.row()).ok()?;
            let column = usize::try_from(slot.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Contents planned for one room, materialised when the player first enters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPlan {
    /// Room the plan belongs to.
    pub room: RoomId,
    /// Slot-resolution obstacle template covering the whole room.
    pub template: ObstacleTemplate,
    /// Whether the room must host the floor's exit door.
    pub needs_exit_door: bool,
}

/// Everything the generator produces for a single dungeon floor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFloor {
    /// Difficulty level used to scale spawned enemies.
    pub level: u32,
    /// Runtime wall and room grid.
    pub grid: MazeGrid,
    /// Rooms in placement order.
    pub rooms: Vec<Room>,
    /// One plan per room, in the same order as `rooms`.
    pub plans: Vec<RoomPlan>,
    /// Room the player starts in, if any room was placed.
    pub entry_room: Option<RoomId>,
    /// Room hosting the exit door, if any room was placed.
    pub exit_room: Option<RoomId>,
}

impl GeneratedFloor {
    /// Looks up a placed room by identifier.
    #[must_use]
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id() == id)
    }

    /// Looks up the plan for a room by identifier.
    #[must_use]
    pub fn plan(&self, id: RoomId) -> Option<&RoomPlan> {
        self.plans.iter().find(|plan| plan.room == id)
    }
}

/// Side that owns a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Fired by the player.
    Player,
    /// Fired by an enemy.
    Enemy,
}

/// Closed set of enemy archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    /// Fast melee chaser.
    Walker,
    /// Slow, hard-hitting melee chaser.
    Bruiser,
    /// Ranged kiter that fires projectiles.
    Shooter,
}

/// Combat and movement statistics of an enemy at a given level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Starting health.
    pub max_health: f32,
    /// Maximum movement speed in units per second.
    pub max_speed: f32,
    /// Acceleration in units per second squared.
    pub acceleration: f32,
    /// Damage dealt to the player on contact or by projectiles.
    pub damage: f32,
    /// Knockback impulse applied to the player.
    pub knockback: f32,
    /// Speed of fired projectiles. Zero for melee archetypes.
    pub projectile_speed: f32,
    /// Seconds between shots. Zero for melee archetypes.
    pub fire_interval: f32,
}

impl Archetype {
    /// Stats scaled linearly for the provided level, starting at level one.
    #[must_use]
    pub fn stats(self, level: u32) -> EnemyStats {
        let steps = level.saturating_sub(1) as f32;
        let scale = |base: f32, per_level: f32| base + per_level * steps;
        match self {
            Self::Walker => EnemyStats {
                max_health: 2.0,
                max_speed: 125.0,
                acceleration: 2000.0,
                damage: 0.5,
                knockback: 550.0,
                projectile_speed: 0.0,
                fire_interval: 0.0,
            },
            Self::Bruiser => EnemyStats {
                max_health: scale(2.0, 0.7),
                max_speed: scale(60.0, 8.0),
                acceleration: 2000.0,
                damage: scale(1.5, 0.5),
                knockback: scale(800.0, 50.0),
                projectile_speed: 0.0,
                fire_interval: 0.0,
            },
            Self::Shooter => EnemyStats {
                max_health: scale(0.5, 0.3),
                max_speed: scale(50.0, 12.0),
                acceleration: 2000.0,
                damage: scale(0.5, 0.25),
                knockback: scale(550.0, 40.0),
                projectile_speed: scale(300.0, 10.0),
                fire_interval: scale(2.2, -0.15).max(0.4),
            },
        }
    }

    /// Whether the archetype attacks from range.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        matches!(self, Self::Shooter)
    }
}

/// Categories of entity the simulation tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player character.
    Player,
    /// Solid, immovable obstacle.
    Rock,
    /// Cursed floor tile.
    Trap,
    /// Blessed pickup.
    Scroll,
    /// Exit door leading to the next floor.
    Door,
    /// Hostile creature of the given archetype.
    Enemy(Archetype),
    /// Projectile owned by the given faction.
    Projectile(Faction),
}

/// Where a pickup effect came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectSource {
    /// Granted by collecting a scroll.
    Scroll,
    /// Inflicted by stepping on a trap.
    Trap,
}

/// Effects granted by scrolls and traps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Fire two projectiles per shot.
    DoubleShot,
    /// Halve the shooting cooldown.
    RapidFire,
    /// Restore health instantly.
    Heal,
    /// Move faster. Stacks.
    SpeedBoost,
    /// Ignore incoming damage.
    Shield,
    /// Move slower. Stacks.
    SlowMovement,
    /// Lengthen the shooting cooldown.
    SlowShooting,
    /// Deal less damage.
    Weakened,
    /// Take damage instantly.
    Spikes,
}

/// Timed effect currently affecting the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectSnapshot {
    /// Effect that is active.
    pub kind: EffectKind,
    /// Seconds until the effect expires.
    pub remaining: f32,
    /// Full duration the effect was granted for.
    pub duration: f32,
    /// Number of times the effect has been stacked.
    pub stacks: u32,
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Centre of the player's box.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Half the width and height of the player's box.
    pub half_extents: Vec2,
    /// Direction the player faces.
    pub facing: Direction,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Whether the post-hit immunity window is running.
    pub invulnerable: bool,
    /// Whether the hurt flash is showing.
    pub hurt: bool,
}

/// Immutable representation of a room entity used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Handle of the entity inside its room.
    pub id: EntityId,
    /// Kind of entity.
    pub kind: EntityKind,
    /// Centre of the entity's box.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Half the width and height of the entity's box.
    pub half_extents: Vec2,
    /// Current health. Zero for entities without health.
    pub health: f32,
    /// Maximum health. Zero for entities without health.
    pub max_health: f32,
    /// Direction the entity faces.
    pub facing: Direction,
    /// Whether the hurt flash is showing.
    pub hurt: bool,
    /// Remaining fraction of the death fade, when the entity is dying.
    pub fading: Option<f32>,
    /// Whether the entity is a locked door.
    pub locked: bool,
}

/// Immutable representation of an in-flight projectile used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Ground position of the projectile.
    pub position: Vec2,
    /// Combined travel velocity.
    pub velocity: Vec2,
    /// Height above the ground.
    pub height: f32,
    /// Side that fired the projectile.
    pub faction: Faction,
}

/// Immutable representation of a single enemy used by the AI system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Handle of the enemy.
    pub id: EntityId,
    /// Archetype selecting the behaviour policy.
    pub archetype: Archetype,
    /// Centre of the enemy's box.
    pub position: Vec2,
    /// Current velocity.
    pub velocity: Vec2,
    /// Half the width and height of the enemy's box.
    pub half_extents: Vec2,
    /// Whether the enemy is alive and not fading out.
    pub alive: bool,
    /// Whether the fire cooldown has elapsed.
    pub ready_to_fire: bool,
}

/// Read-only snapshot describing the enemies of the active room.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Read-only view over a room's static obstacle grid at slot resolution.
#[derive(Clone, Copy, Debug)]
pub struct ObstacleView<'a> {
    solid: &'a [bool],
    columns: u32,
    rows: u32,
}

impl<'a> ObstacleView<'a> {
    /// Captures a view backed by a row-major slice of solid flags.
    #[must_use]
    pub fn new(solid: &'a [bool], columns: u32, rows: u32) -> Self {
        Self {
            solid,
            columns,
            rows,
        }
    }

    /// Whether the slot lies inside the grid.
    #[must_use]
    pub fn contains(&self, slot: SlotCoord) -> bool {
        self.index(slot).is_some()
    }

    /// Whether the slot holds a solid static entity. Out-of-range slots are blocked.
    #[must_use]
    pub fn is_blocked(&self, slot: SlotCoord) -> bool {
        self.index(slot)
            .map_or(true, |index| self.solid.get(index).copied().unwrap_or(true))
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    fn index(&self, slot: SlotCoord) -> Option<usize> {
        if slot.column() < self.columns && slot.row() < self.rows {
            let row = usize::try_from(slot.row()).ok()?;
            let column = usize::try_from(slot.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn maze_grid_round_trips_through_bincode() {
        let cells = vec![
            MazeGrid::pack(WallMask::from_bits(0b0011), Some(RoomId::new(2))),
            MazeGrid::pack(WallMask::from_bits(0b0110), None),
        ];
        let grid = MazeGrid::from_raw(2, 1, cells).expect("valid grid");
        let bytes = bincode::serialize(&grid).expect("serialize");
        let restored: MazeGrid = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, grid);
    }

    #[test]
    fn packed_cells_expose_walls_and_room() {
        let packed = MazeGrid::pack(WallMask::OPEN.with(Direction::North), Some(RoomId::new(5)));
        let grid = MazeGrid::from_raw(1, 1, vec![packed]).expect("valid grid");
        let cell = CellCoord::new(0, 0);

        assert_eq!(grid.room_at(cell), Some(RoomId::new(5)));
        assert!(grid.has_wall(cell, Direction::North));
        assert!(!grid.has_wall(cell, Direction::South));
        assert!(!grid.is_solid(cell));
    }

    #[test]
    fn out_of_range_queries_are_neutral() {
        let grid = MazeGrid::from_raw(2, 2, vec![0; 4]).expect("valid grid");
        assert_eq!(grid.walls(CellCoord::new(2, 0)), None);
        assert_eq!(grid.room_at(CellCoord::new(0, 9)), None);
        assert!(grid.is_solid(CellCoord::new(5, 5)));
        assert_eq!(grid.cell_at(Vec2::new(-1.0, 10.0)), None);
        assert_eq!(grid.neighbor(CellCoord::new(0, 0), Direction::West), None);
    }

    #[test]
    fn from_raw_rejects_mismatched_lengths() {
        assert!(MazeGrid::from_raw(3, 3, vec![0; 8]).is_none());
    }

    #[test]
    fn touching_rectangles_do_not_intersect() {
        let left = CellRect::from_origin_and_size(CellCoord::new(0, 0), CellRectSize::new(3, 3));
        let right = CellRect::from_origin_and_size(CellCoord::new(3, 0), CellRectSize::new(3, 3));
        let overlapping =
            CellRect::from_origin_and_size(CellCoord::new(2, 2), CellRectSize::new(3, 3));

        assert!(!left.intersects(&right));
        assert!(left.intersects(&overlapping));
        assert!(overlapping.intersects(&right));
    }

    #[test]
    fn template_rejects_unknown_codes() {
        let error = ObstacleTemplate::from_codes(2, 2, &[0, 1, 9, 0]).unwrap_err();
        assert_eq!(
            error,
            TemplateError::UnknownCode {
                code: 9,
                column: 0,
                row: 1
            }
        );
    }

    #[test]
    fn template_rejects_dimension_mismatch() {
        let error = ObstacleTemplate::from_codes(3, 2, &[0, 1]).unwrap_err();
        assert_eq!(
            error,
            TemplateError::DimensionMismatch {
                expected: 6,
                actual: 2
            }
        );
    }

    #[test]
    fn room_slot_conversions_agree() {
        let room = Room::new(
            RoomId::new(1),
            CellRect::from_origin_and_size(CellCoord::new(2, 3), CellRectSize::new(3, 2)),
        );
        let slot = SlotCoord::new(4, 1);
        let center = room.slot_center(slot);

        assert_eq!(center, Vec2::new(200.0 + 225.0, 300.0 + 75.0));
        assert_eq!(room.slot_at(center), Some(slot));
        assert_eq!(room.slot_at(Vec2::new(0.0, 0.0)), None);
    }

    #[test]
    fn shooter_stats_scale_per_level() {
        let base = Archetype::Shooter.stats(1);
        let scaled = Archetype::Shooter.stats(3);

        assert!((base.fire_interval - 2.2).abs() < 1e-5);
        assert!((scaled.fire_interval - 1.9).abs() < 1e-5);
        assert!((scaled.max_speed - 74.0).abs() < 1e-5);
        assert!((Archetype::Walker.stats(9).max_health - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn direction_from_vector_picks_closest_axis() {
        assert_eq!(Direction::from_vector(Vec2::new(1.0, 0.2)), Some(Direction::East));
        assert_eq!(Direction::from_vector(Vec2::new(0.1, -1.0)), Some(Direction::North));
        assert_eq!(Direction::from_vector(Vec2::new(-1.0, 0.0)), Some(Direction::West));
        assert_eq!(Direction::from_vector(Vec2::ZERO), None);
    }
}
