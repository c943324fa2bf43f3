#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session orchestration for the Maze Dungeon experience.
//!
//! A [`Session`] owns the world and the systems that react to it, runs the
//! per-frame pipeline and reports gameplay outcomes to an embedding
//! [`GameState`].

use std::time::Duration;

use glam::Vec2;
use log::{debug, info};
use maze_dungeon_core::{
    Command, Direction, EffectSnapshot, EntityId, EntitySnapshot, Event, GeneratedFloor,
    MazeGrid, PlayerInput, PlayerSnapshot, ProjectileSnapshot, RoomId,
};
use maze_dungeon_system_enemy_ai::EnemyAi;
use maze_dungeon_system_generation::{GenerationConfig, GenerationError, MazeGenerator};
use maze_dungeon_system_progression::{DoorRitual, Progression, ProgressionSnapshot};
use maze_dungeon_world::{self as world, query, Config, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest frame the session simulates. Longer frames are dropped.
pub const MAX_TICK: Duration = Duration::from_millis(100);

/// Outer game state the session reports to.
pub trait GameState {
    /// Removes health from the player's persistent pool.
    fn reduce_health(&mut self, amount: f32);

    /// Counts one more defeated enemy.
    fn increment_enemies_killed(&mut self);

    /// Whether a run is in progress.
    fn is_game_running(&self) -> bool;

    /// Whether the run is paused.
    fn is_paused(&self) -> bool;

    /// Stops the run countdown while the next floor is prepared.
    fn freeze_clock(&mut self);

    /// Restarts the run countdown.
    fn resume_clock(&mut self);
}

/// Tuning for a dungeon session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maze generation settings shared by every floor.
    pub generation: GenerationConfig,
    /// Health the player starts with.
    pub player_max_health: f32,
    /// Seconds the player must hold an unlocked door.
    pub hold_duration: f32,
    /// Seconds the ready state is shown before the next floor appears.
    pub minimum_transition: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            player_max_health: 6.0,
            hold_duration: 1.5,
            minimum_transition: 0.5,
        }
    }
}

/// Errors raised while starting a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The generation settings were rejected.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// The player health is not a positive number.
    #[error("player max health must be positive, got {0}")]
    InvalidHealth(f32),
    /// A door timing is negative or not finite.
    #[error("door timings must be non-negative, got hold {hold} and transition {transition}")]
    InvalidDoorTiming {
        /// Configured hold duration.
        hold: f32,
        /// Configured minimum transition.
        transition: f32,
    },
}

/// A running dungeon together with the systems that drive it.
#[derive(Debug)]
pub struct Session<G: GameState> {
    game: G,
    config: SessionConfig,
    generator: MazeGenerator,
    world: World,
    enemy_ai: EnemyAi,
    progression: Progression,
    carried: Vec<Event>,
    last_events: Vec<Event>,
}

impl<G: GameState> Session<G> {
    /// Generates the first floor from `seed` and starts a session on it.
    pub fn new(config: SessionConfig, game: G, seed: u64) -> Result<Self, SessionError> {
        let generator = validate(&config)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let floor = generator.generate(&mut rng);
        info!(
            "starting dungeon with seed {seed}: {} rooms on a {}x{} grid",
            floor.rooms.len(),
            floor.grid.width(),
            floor.grid.height()
        );
        Ok(Self::assemble(config, game, generator, floor, &mut rng))
    }

    /// Starts a session on a prepared first floor. Later floors are generated.
    pub fn with_floor(
        config: SessionConfig,
        game: G,
        floor: GeneratedFloor,
        seed: u64,
    ) -> Result<Self, SessionError> {
        let generator = validate(&config)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Ok(Self::assemble(config, game, generator, floor, &mut rng))
    }

    fn assemble(
        config: SessionConfig,
        game: G,
        generator: MazeGenerator,
        floor: GeneratedFloor,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let world = World::new(floor, Config::new(config.player_max_health, rng.gen()));
        let ritual = DoorRitual::new(config.hold_duration, config.minimum_transition);
        let progression = Progression::new(generator.clone(), ritual, rng.gen());
        Self {
            game,
            config,
            generator,
            world,
            enemy_ai: EnemyAi::new(),
            progression,
            carried: Vec::new(),
            last_events: Vec::new(),
        }
    }

    /// Runs one frame of the simulation.
    ///
    /// Frames are skipped while the game is stopped or paused, and when `dt`
    /// exceeds [`MAX_TICK`].
    pub fn advance_tick(&mut self, movement: Vec2, shoot: Option<Direction>, dt: Duration) {
        self.last_events.clear();
        if !self.game.is_game_running() || self.game.is_paused() {
            return;
        }
        if dt > MAX_TICK {
            debug!("skipping {dt:?} frame");
            return;
        }

        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::Tick {
                dt,
                input: PlayerInput { movement, shoot },
            },
            &mut events,
        );

        let mut commands = Vec::new();
        {
            let player = query::player(&self.world);
            let enemies = query::enemy_view(&self.world);
            self.enemy_ai.handle(
                &events,
                &player,
                &enemies,
                query::active_room(&self.world),
                query::obstacle_view(&self.world),
                &mut commands,
            );
        }
        for command in commands.drain(..) {
            world::apply(&mut self.world, command, &mut events);
        }
        world::apply(&mut self.world, Command::ResolveCollisions, &mut events);

        let mut observed = std::mem::take(&mut self.carried);
        observed.extend(events.iter().cloned());
        self.progression.handle(&observed, &mut commands);
        let mut follow_up = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut follow_up);
        }
        self.carried.extend(follow_up.iter().cloned());
        events.extend(follow_up);

        self.report(&events);
        self.last_events = events;
    }

    fn report(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::PlayerDamaged { amount } => self.game.reduce_health(*amount),
                Event::EnemyKilled { .. } => self.game.increment_enemies_killed(),
                Event::FloorTransitionStarted => self.game.freeze_clock(),
                Event::FloorAdvanced { .. } => self.game.resume_clock(),
                _ => {}
            }
        }
    }

    /// Starts holding an unlocked door on the player's behalf.
    pub fn request_door_hold(&mut self, door: EntityId) {
        self.progression.request_hold(door);
    }

    /// Discards the dungeon and starts over from a fresh first floor.
    ///
    /// Any floor being prepared is cancelled.
    pub fn reset(&mut self, seed: u64) {
        let was_transitioning = query::is_transitioning(&self.world);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let floor = self.generator.generate(&mut rng);
        self.world = World::new(
            floor,
            Config::new(self.config.player_max_health, rng.gen()),
        );
        let ritual = DoorRitual::new(self.config.hold_duration, self.config.minimum_transition);
        self.progression = Progression::new(self.generator.clone(), ritual, rng.gen());
        self.carried.clear();
        self.last_events.clear();
        if was_transitioning {
            self.game.resume_clock();
        }
        info!("dungeon reset with seed {seed}");
    }

    /// Events produced by the most recent frame.
    #[must_use]
    pub fn last_events(&self) -> &[Event] {
        &self.last_events
    }

    /// Embedding game state.
    #[must_use]
    pub fn game(&self) -> &G {
        &self.game
    }

    /// Mutable access to the embedding game state.
    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    /// Configuration the session was started with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Read-only access to the underlying world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Maze grid of the active floor.
    #[must_use]
    pub fn grid(&self) -> &MazeGrid {
        query::grid(&self.world)
    }

    /// Room the player occupies.
    #[must_use]
    pub fn current_room(&self) -> Option<RoomId> {
        query::current_room(&self.world)
    }

    /// Static entities of the active room.
    #[must_use]
    pub fn static_entities(&self) -> Vec<EntitySnapshot> {
        query::static_entities(&self.world)
    }

    /// Dynamic entities of the active room.
    #[must_use]
    pub fn dynamic_entities(&self) -> Vec<EntitySnapshot> {
        query::dynamic_entities(&self.world)
    }

    /// Player state.
    #[must_use]
    pub fn player(&self) -> PlayerSnapshot {
        query::player(&self.world)
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> Vec<ProjectileSnapshot> {
        query::projectiles(&self.world)
    }

    /// Door ritual phase and progress.
    #[must_use]
    pub fn progression(&self) -> ProgressionSnapshot {
        self.progression.snapshot()
    }

    /// One-based index of the active floor.
    #[must_use]
    pub fn floor(&self) -> u32 {
        query::floor(&self.world)
    }

    /// Whether the room has been cleared on the active floor.
    #[must_use]
    pub fn is_room_cleared(&self, room: RoomId) -> bool {
        query::is_room_cleared(&self.world, room)
    }

    /// Timed effects running on the player.
    #[must_use]
    pub fn active_effects(&self) -> Vec<EffectSnapshot> {
        query::active_effects(&self.world)
    }
}

fn validate(config: &SessionConfig) -> Result<MazeGenerator, SessionError> {
    if !config.player_max_health.is_finite() || config.player_max_health <= 0.0 {
        return Err(SessionError::InvalidHealth(config.player_max_health));
    }
    let timing_ok = |value: f32| value.is_finite() && value >= 0.0;
    if !timing_ok(config.hold_duration) || !timing_ok(config.minimum_transition) {
        return Err(SessionError::InvalidDoorTiming {
            hold: config.hold_duration,
            transition: config.minimum_transition,
        });
    }
    Ok(MazeGenerator::new(config.generation.clone())?)
}
