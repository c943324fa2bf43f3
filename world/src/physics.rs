//! Box bodies, wall geometry and the minimum-penetration push-out.

use glam::Vec2;
use maze_dungeon_core::{CellCoord, CellRect, Direction, MazeGrid, CELL_SIZE, WALL_THICKNESS};

const PUSH_OUT_SCALE: f32 = 1.01;
const CONTACT_FRICTION: f32 = 0.5;

/// Axis-aligned box in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Aabb {
    pub(crate) min: Vec2,
    pub(crate) max: Vec2,
}

impl Aabb {
    pub(crate) fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    fn from_rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    /// Strict overlap test; touching edges do not collide.
    pub(crate) fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Kinematic state shared by the player, enemies and projectiles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Body {
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) half_extents: Vec2,
    pub(crate) friction: f32,
    touched: bool,
}

impl Body {
    pub(crate) fn new(position: Vec2, width: f32, height: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            half_extents: Vec2::new(width / 2.0, height / 2.0),
            friction: 1.0,
            touched: false,
        }
    }

    pub(crate) fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }

    /// Accelerates toward `direction * max_speed` and integrates the position.
    pub(crate) fn steer(&mut self, direction: Vec2, max_speed: f32, acceleration: f32, dt: f32) {
        let diff = direction * max_speed * self.friction - self.velocity;
        let budget = acceleration * dt;
        if diff.length() < budget {
            self.velocity += diff;
        } else {
            self.velocity += diff.normalize_or_zero() * budget;
        }
        self.position += self.velocity * dt;
    }

    /// Pushes the body out of `other` along the axis of least penetration.
    ///
    /// Returns `true` when the boxes overlapped.
    pub(crate) fn resolve_against(&mut self, other: &Aabb) -> bool {
        let own = self.aabb();
        if !own.overlaps(other) {
            return false;
        }

        let push_left = own.max.x - other.min.x;
        let push_right = other.max.x - own.min.x;
        let push_up = own.max.y - other.min.y;
        let push_down = other.max.y - own.min.y;

        let horizontal = if push_left < push_right {
            -push_left
        } else {
            push_right
        };
        let vertical = if push_up < push_down {
            -push_up
        } else {
            push_down
        };

        if horizontal.abs() < vertical.abs() {
            self.position.x += horizontal * PUSH_OUT_SCALE;
            self.velocity.x = 0.0;
        } else {
            self.position.y += vertical * PUSH_OUT_SCALE;
            self.velocity.y = 0.0;
        }
        self.friction = CONTACT_FRICTION;
        self.touched = true;
        true
    }

    /// Restores full friction when nothing was touched since the last call.
    pub(crate) fn settle_friction(&mut self) {
        if !self.touched {
            self.friction = 1.0;
        }
        self.touched = false;
    }

    pub(crate) fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse;
    }
}

/// Wall boxes drawn along the walled edges of one cell.
fn cell_walls(grid: &MazeGrid, cell: CellCoord) -> impl Iterator<Item = Aabb> {
    let walls = grid.walls(cell);
    let solid = grid.is_solid(cell);
    let origin = Vec2::new(
        cell.column() as f32 * CELL_SIZE,
        cell.row() as f32 * CELL_SIZE,
    );
    let half = WALL_THICKNESS / 2.0;

    Direction::ALL.into_iter().filter_map(move |direction| {
        let walls = walls?;
        if solid || !walls.contains(direction) {
            return None;
        }
        let (x, y, width, height) = match direction {
            Direction::West => (-half, 0.0, WALL_THICKNESS, CELL_SIZE),
            Direction::North => (-half, -half, CELL_SIZE + WALL_THICKNESS, WALL_THICKNESS),
            Direction::East => (CELL_SIZE - half, 0.0, WALL_THICKNESS, CELL_SIZE),
            Direction::South => (
                -half,
                CELL_SIZE - half,
                CELL_SIZE + WALL_THICKNESS,
                WALL_THICKNESS,
            ),
        };
        Some(Aabb::from_rect(origin.x + x, origin.y + y, width, height))
    })
}

/// Wall boxes of the up to nine cells around `position`.
pub(crate) fn nearby_walls(grid: &MazeGrid, position: Vec2) -> Vec<Aabb> {
    let column = (position.x / CELL_SIZE).floor() as i64;
    let row = (position.y / CELL_SIZE).floor() as i64;
    let mut walls = Vec::new();

    for dy in -1..=1 {
        for dx in -1..=1 {
            let (Ok(column), Ok(row)) = (u32::try_from(column + dx), u32::try_from(row + dy)) else {
                continue;
            };
            let cell = CellCoord::new(column, row);
            if grid.index(cell).is_none() {
                continue;
            }
            walls.extend(cell_walls(grid, cell));
        }
    }

    walls
}

/// Invisible boundary walls sealing a locked room.
pub(crate) fn lock_walls(bounds: CellRect) -> [Aabb; 4] {
    let left = bounds.origin().column() as f32 * CELL_SIZE;
    let top = bounds.origin().row() as f32 * CELL_SIZE;
    let right = bounds.right() as f32 * CELL_SIZE;
    let bottom = bounds.bottom() as f32 * CELL_SIZE;
    let half = WALL_THICKNESS / 2.0;
    let width = right - left;
    let height = bottom - top;

    [
        Aabb::from_rect(left - half, top, WALL_THICKNESS, height),
        Aabb::from_rect(left - half, top - half, width + WALL_THICKNESS, WALL_THICKNESS),
        Aabb::from_rect(right - half, top, WALL_THICKNESS, height),
        Aabb::from_rect(left - half, bottom - half, width + WALL_THICKNESS, WALL_THICKNESS),
    ]
}

/// Resolves the body against nearby maze walls and optional lock walls.
pub(crate) fn collide_with_walls(body: &mut Body, grid: &MazeGrid, lock: Option<CellRect>) {
    for wall in nearby_walls(grid, body.position) {
        let _ = body.resolve_against(&wall);
    }
    if let Some(bounds) = lock {
        for wall in lock_walls(bounds) {
            let _ = body.resolve_against(&wall);
        }
    }
}

/// Whether the box overlaps any nearby maze wall.
pub(crate) fn touches_wall(aabb: &Aabb, grid: &MazeGrid) -> bool {
    let center = (aabb.min + aabb.max) / 2.0;
    nearby_walls(grid, center)
        .iter()
        .any(|wall| wall.overlaps(aabb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_dungeon_core::{CellRectSize, WallMask};

    fn closed_cell_grid() -> MazeGrid {
        let mut grid = MazeGrid::solid(3, 3);
        for cell in grid.iter_cells().collect::<Vec<_>>() {
            let _ = grid.set(cell, WallMask::OPEN, None);
        }
        let _ = grid.set(CellCoord::new(1, 1), WallMask::from_bits(0b0101), None);
        grid
    }

    #[test]
    fn push_out_uses_the_shallow_axis() {
        let mut body = Body::new(Vec2::new(0.0, 0.0), 20.0, 20.0);
        body.velocity = Vec2::new(30.0, 40.0);
        let wall = Aabb::from_rect(8.0, -50.0, 20.0, 100.0);

        assert!(body.resolve_against(&wall));
        assert!((body.position.x - (-2.0 * PUSH_OUT_SCALE)).abs() < 1e-4);
        assert_eq!(body.position.y, 0.0);
        assert_eq!(body.velocity.x, 0.0);
        assert_eq!(body.velocity.y, 40.0);
        assert_eq!(body.friction, CONTACT_FRICTION);
    }

    #[test]
    fn push_out_vertical_when_overlap_is_shallower_vertically() {
        let mut body = Body::new(Vec2::new(0.0, 0.0), 20.0, 20.0);
        body.velocity = Vec2::new(10.0, 10.0);
        let floor = Aabb::from_rect(-50.0, 7.0, 100.0, 20.0);

        assert!(body.resolve_against(&floor));
        assert!(body.position.y < -2.9);
        assert_eq!(body.position.x, 0.0);
        assert_eq!(body.velocity, Vec2::new(10.0, 0.0));
        assert!(!body.aabb().overlaps(&floor));
    }

    #[test]
    fn separated_boxes_do_not_collide() {
        let mut body = Body::new(Vec2::new(0.0, 0.0), 10.0, 10.0);
        let far = Aabb::from_rect(5.0, -5.0, 10.0, 10.0);
        assert!(!body.resolve_against(&far));
        body.settle_friction();
        assert_eq!(body.friction, 1.0);
    }

    #[test]
    fn steering_respects_the_acceleration_budget() {
        let mut body = Body::new(Vec2::ZERO, 10.0, 10.0);
        body.steer(Vec2::X, 400.0, 3500.0, 0.01);
        assert!((body.velocity.x - 35.0).abs() < 1e-3);

        let mut settled = Body::new(Vec2::ZERO, 10.0, 10.0);
        settled.velocity = Vec2::new(399.0, 0.0);
        settled.steer(Vec2::X, 400.0, 3500.0, 0.01);
        assert!((settled.velocity.x - 400.0).abs() < 1e-3);
    }

    #[test]
    fn walls_keep_bodies_inside_their_cell() {
        let grid = closed_cell_grid();
        let mut body = Body::new(Vec2::new(196.0, 150.0), 30.0, 25.0);
        body.velocity = Vec2::new(100.0, 0.0);

        collide_with_walls(&mut body, &grid, None);
        assert!(body.position.x < 195.0 - 15.0 + 0.5);
        assert_eq!(body.velocity.x, 0.0);
    }

    #[test]
    fn lock_walls_seal_the_room_edges() {
        let bounds = CellRect::from_origin_and_size(CellCoord::new(1, 1), CellRectSize::new(2, 2));
        let walls = lock_walls(bounds);
        let probe = Aabb::from_center(Vec2::new(100.0, 150.0), Vec2::splat(4.0));
        assert!(walls.iter().any(|wall| wall.overlaps(&probe)));
    }
}
