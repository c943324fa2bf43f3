//! Game state and input source for running the dungeon without a window.

use std::time::Duration;

use glam::Vec2;
use maze_dungeon_core::{Direction, EntityKind, EntitySnapshot};
use maze_dungeon_system_session::{GameState, Session};

/// Ticks spent walking one way before the autopilot picks a new heading.
const WANDER_TICKS: u32 = 240;

/// Offsets below this are treated as already aligned with a target.
const ALIGNED: f32 = 8.0;

/// Run-level state the session reports into.
#[derive(Debug)]
pub(crate) struct HeadlessGame {
    health: f32,
    kills: u32,
    damage_taken: f32,
    clock: Duration,
    frozen: bool,
}

impl HeadlessGame {
    pub(crate) fn new(health: f32) -> Self {
        Self {
            health,
            kills: 0,
            damage_taken: 0.0,
            clock: Duration::ZERO,
            frozen: false,
        }
    }

    /// Advances the run countdown unless a floor transition froze it.
    pub(crate) fn tick_clock(&mut self, dt: Duration) {
        if !self.frozen {
            self.clock += dt;
        }
    }

    pub(crate) fn health(&self) -> f32 {
        self.health
    }

    pub(crate) fn kills(&self) -> u32 {
        self.kills
    }

    pub(crate) fn damage_taken(&self) -> f32 {
        self.damage_taken
    }

    pub(crate) fn clock(&self) -> Duration {
        self.clock
    }
}

impl GameState for HeadlessGame {
    fn reduce_health(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
        self.damage_taken += amount;
    }

    fn increment_enemies_killed(&mut self) {
        self.kills += 1;
    }

    fn is_game_running(&self) -> bool {
        self.health > 0.0
    }

    fn is_paused(&self) -> bool {
        false
    }

    fn freeze_clock(&mut self) {
        self.frozen = true;
    }

    fn resume_clock(&mut self) {
        self.frozen = false;
    }
}

/// Scripted player: fights whatever is in the room, walks to an open door,
/// and otherwise wanders the corridors turning right whenever it gets stuck.
#[derive(Debug)]
pub(crate) struct Autopilot {
    heading: Direction,
    last_position: Option<Vec2>,
    walked: u32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            heading: Direction::East,
            last_position: None,
            walked: 0,
        }
    }
}

impl Autopilot {
    /// Chooses the movement and shoot intent for the next tick.
    pub(crate) fn steer(&mut self, session: &Session<HeadlessGame>) -> (Vec2, Option<Direction>) {
        let position = session.player().position;
        let enemies = session.dynamic_entities();
        if let Some(target) = nearest_enemy(&enemies, position) {
            return engage(target.position - position);
        }

        let door = session
            .static_entities()
            .into_iter()
            .find(|entity| entity.kind == EntityKind::Door && !entity.locked);
        if let Some(door) = door {
            return ((door.position - position).normalize_or_zero(), None);
        }

        self.wander(position)
    }

    fn wander(&mut self, position: Vec2) -> (Vec2, Option<Direction>) {
        let stuck = self
            .last_position
            .map_or(false, |last| last.distance_squared(position) < 0.25);
        self.walked += 1;
        if stuck || self.walked >= WANDER_TICKS {
            self.heading = turn_right(self.heading);
            self.walked = 0;
        }
        self.last_position = Some(position);
        (self.heading.unit_vector(), None)
    }
}

fn nearest_enemy(entities: &[EntitySnapshot], position: Vec2) -> Option<&EntitySnapshot> {
    entities
        .iter()
        .filter(|entity| matches!(entity.kind, EntityKind::Enemy(_)) && entity.fading.is_none())
        .min_by(|a, b| {
            a.position
                .distance_squared(position)
                .total_cmp(&b.position.distance_squared(position))
        })
}

/// Shoots along the dominant axis and sidesteps to line up on the other one.
fn engage(offset: Vec2) -> (Vec2, Option<Direction>) {
    let shoot = Direction::from_vector(offset);
    let movement = if offset.x.abs() >= offset.y.abs() {
        Vec2::new(0.0, aligned_sign(offset.y))
    } else {
        Vec2::new(aligned_sign(offset.x), 0.0)
    };
    (movement, shoot)
}

fn aligned_sign(value: f32) -> f32 {
    if value.abs() < ALIGNED {
        0.0
    } else {
        value.signum()
    }
}

fn turn_right(direction: Direction) -> Direction {
    match direction {
        Direction::North => Direction::East,
        Direction::East => Direction::South,
        Direction::South => Direction::West,
        Direction::West => Direction::North,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engagement_sidesteps_onto_the_firing_line() {
        let (movement, shoot) = engage(Vec2::new(200.0, -40.0));
        assert_eq!(shoot, Some(Direction::East));
        assert_eq!(movement, Vec2::new(0.0, -1.0));

        let (movement, shoot) = engage(Vec2::new(3.0, 120.0));
        assert_eq!(shoot, Some(Direction::South));
        assert_eq!(movement, Vec2::ZERO);
    }

    #[test]
    fn wandering_turns_when_blocked() {
        let mut autopilot = Autopilot::default();
        let spot = Vec2::new(50.0, 50.0);
        assert_eq!(autopilot.wander(spot).0, Direction::East.unit_vector());
        assert_eq!(autopilot.wander(spot).0, Direction::South.unit_vector());
        assert_eq!(
            autopilot.wander(spot + Vec2::new(0.0, 4.0)).0,
            Direction::South.unit_vector()
        );
    }

    #[test]
    fn headless_game_stops_at_zero_health_and_freezes_its_clock() {
        let mut game = HeadlessGame::new(2.0);
        game.tick_clock(Duration::from_millis(16));
        game.freeze_clock();
        game.tick_clock(Duration::from_millis(16));
        game.resume_clock();
        assert_eq!(game.clock(), Duration::from_millis(16));

        game.reduce_health(1.5);
        assert!(game.is_game_running());
        game.reduce_health(1.5);
        assert!(!game.is_game_running());
        assert_eq!(game.health(), 0.0);
        assert_eq!(game.damage_taken(), 3.0);
    }
}
