use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use glam::Vec2;
use maze_dungeon_core::{Direction, EntitySnapshot, Event, PlayerSnapshot};
use maze_dungeon_system_session::{GameState, Session, SessionConfig};

#[derive(Debug, Default)]
struct Headless {
    damage_taken: f32,
    kills: u32,
}

impl GameState for Headless {
    fn reduce_health(&mut self, amount: f32) {
        self.damage_taken += amount;
    }

    fn increment_enemies_killed(&mut self) {
        self.kills += 1;
    }

    fn is_game_running(&self) -> bool {
        true
    }

    fn is_paused(&self) -> bool {
        false
    }

    fn freeze_clock(&mut self) {}

    fn resume_clock(&mut self) {}
}

#[test]
fn deterministic_replay_produces_identical_outcomes() {
    let first = replay(2024);
    let second = replay(2024);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(!first.events.is_empty());
}

#[test]
fn different_seeds_build_different_dungeons() {
    let config = SessionConfig::default();
    let first = Session::new(config.clone(), Headless::default(), 1).expect("session");
    let second = Session::new(config, Headless::default(), 2).expect("session");
    assert_ne!(first.grid(), second.grid());
}

fn replay(seed: u64) -> ReplayOutcome {
    let mut session = Session::new(SessionConfig::default(), Headless::default(), seed)
        .expect("default config is valid");
    let mut events = Vec::new();

    for (tick, (movement, shoot)) in scripted_inputs().into_iter().enumerate() {
        session.advance_tick(movement, shoot, Duration::from_millis(16));
        events.extend(
            session
                .last_events()
                .iter()
                .filter(|event| !matches!(event, Event::TimeAdvanced { .. }))
                .map(|event| EventRecord {
                    tick,
                    description: format!("{event:?}"),
                }),
        );
    }

    ReplayOutcome {
        player: PlayerState::from(session.player()),
        entities: session
            .dynamic_entities()
            .into_iter()
            .chain(session.static_entities())
            .map(EntityState::from)
            .collect(),
        floor: session.floor(),
        kills: session.game().kills,
        damage_bits: session.game().damage_taken.to_bits(),
        events,
    }
}

fn scripted_inputs() -> Vec<(Vec2, Option<Direction>)> {
    let legs = [
        (Direction::East, Some(Direction::East)),
        (Direction::South, None),
        (Direction::West, Some(Direction::South)),
        (Direction::North, Some(Direction::West)),
    ];
    legs.iter()
        .cycle()
        .take(12)
        .flat_map(|(movement, shoot)| {
            std::iter::repeat((movement.unit_vector(), *shoot)).take(45)
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    player: PlayerState,
    entities: Vec<EntityState>,
    floor: u32,
    kills: u32,
    damage_bits: u32,
    events: Vec<EventRecord>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PlayerState {
    position: (u32, u32),
    health_bits: u32,
    facing: Direction,
}

impl From<PlayerSnapshot> for PlayerState {
    fn from(snapshot: PlayerSnapshot) -> Self {
        Self {
            position: (snapshot.position.x.to_bits(), snapshot.position.y.to_bits()),
            health_bits: snapshot.health.to_bits(),
            facing: snapshot.facing,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct EntityState {
    id: maze_dungeon_core::EntityId,
    kind: maze_dungeon_core::EntityKind,
    position: (u32, u32),
    locked: bool,
}

impl From<EntitySnapshot> for EntityState {
    fn from(snapshot: EntitySnapshot) -> Self {
        Self {
            id: snapshot.id,
            kind: snapshot.kind,
            position: (snapshot.position.x.to_bits(), snapshot.position.y.to_bits()),
            locked: snapshot.locked,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct EventRecord {
    tick: usize,
    description: String,
}
