#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Maze Dungeon experience.
//!
//! The world owns the active floor, the lazily built room layouts, the player
//! and every projectile in flight. It is mutated exclusively through [`apply`]
//! and observed through the read-only functions in [`query`].

mod arena;
mod effects;
mod entities;
mod layout;
mod physics;
mod spatial;

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use log::{debug, info};
use maze_dungeon_core::{
    CellCoord, CellRect, Command, Direction, EffectKind, EffectSource, EntityId, EntityKind, Event,
    Faction, GeneratedFloor, MazeGrid, PlayerInput, RoomId, CELL_SIZE, WELCOME_BANNER,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use entities::{Hit, Launch, Player, Projectile};
use layout::RoomLayout;
use physics::{collide_with_walls, touches_wall};
use spatial::{Occupant, SpatialGrid};

const INPUT_DEAD_ZONE: f32 = 0.1;
const PLAYER_ACCELERATION: f32 = 3500.0;
const PLAYER_MAX_SPEED: f32 = 400.0;
const SHOOT_COOLDOWN: f32 = 0.4;
const SHOT_SPACING: f32 = 15.0;
const PLAYER_MUZZLE_GAP: f32 = 5.0;
const PLAYER_INHERITED_VELOCITY: f32 = 0.3;

const PROJECTILE_SPEED: f32 = 450.0;
const PROJECTILE_DAMAGE: f32 = 0.5;
const PROJECTILE_FORCE: f32 = 400.0;
const PROJECTILE_DROP_DISTANCE: f32 = 100.0;

const ENEMY_MUZZLE_GAP: f32 = 6.0;
const ENEMY_DROP_DISTANCE: f32 = 160.0;
const ENEMY_INHERITED_VELOCITY: f32 = 0.25;

/// Configuration parameters required to construct the world.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    player_max_health: f32,
    seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided player health and seed.
    #[must_use]
    pub const fn new(player_max_health: f32, seed: u64) -> Self {
        Self {
            player_max_health,
            seed,
        }
    }

    /// Health the player starts with.
    #[must_use]
    pub const fn player_max_health(&self) -> f32 {
        self.player_max_health
    }

    /// Seed of the world's random number generator.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

/// Floor counter and cleared-room bookkeeping, reset on every floor advance.
#[derive(Clone, Debug)]
struct FloorLedger {
    floor: u32,
    cleared: BTreeSet<RoomId>,
}

/// Represents the authoritative Maze Dungeon world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    floor: GeneratedFloor,
    ledger: FloorLedger,
    layouts: BTreeMap<RoomId, RoomLayout>,
    current_room: Option<RoomId>,
    spatial: Option<SpatialGrid>,
    player: Player,
    projectiles: Vec<Projectile>,
    transitioning: bool,
    last_dt: f32,
    rng: ChaCha8Rng,
    tick_index: u64,
}

impl World {
    /// Creates a world on the provided floor with the player in its entry room.
    #[must_use]
    pub fn new(floor: GeneratedFloor, config: Config) -> Self {
        let mut world = Self {
            banner: WELCOME_BANNER,
            floor,
            ledger: FloorLedger {
                floor: 1,
                cleared: BTreeSet::new(),
            },
            layouts: BTreeMap::new(),
            current_room: None,
            spatial: None,
            player: Player::new(Vec2::ZERO, config.player_max_health),
            projectiles: Vec::new(),
            transitioning: false,
            last_dt: 0.0,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            tick_index: 0,
        };
        world.player.body.position = world.entry_spawn();
        world.enter_room(world.floor.grid.room_at_position(world.player.body.position));
        world
    }

    /// Spawn point inside the entry room, or the central corridor without rooms.
    fn entry_spawn(&mut self) -> Vec2 {
        let Some(entry) = self.floor.entry_room else {
            return corridor_spawn(&self.floor.grid).unwrap_or_else(|| grid_center(&self.floor.grid));
        };
        self.ensure_layout(entry);
        let Some(layout) = self.layouts.get(&entry) else {
            return grid_center(&self.floor.grid);
        };
        match layout.free_cell() {
            Some(cell) => cell.center(),
            None => {
                let bounds = layout.room().bounds();
                let origin = layout.room().origin();
                origin
                    + Vec2::new(
                        bounds.size().width() as f32 * CELL_SIZE / 2.0,
                        bounds.size().height() as f32 * CELL_SIZE / 2.0,
                    )
            }
        }
    }

    fn ensure_layout(&mut self, id: RoomId) {
        if self.layouts.contains_key(&id) {
            return;
        }
        let (Some(room), Some(plan)) = (self.floor.room(id).copied(), self.floor.plan(id)) else {
            return;
        };
        let layout = RoomLayout::build(room, plan, self.floor.level, &mut self.rng);
        let _ = self.layouts.insert(id, layout);
    }

    fn enter_room(&mut self, room: Option<RoomId>) {
        self.current_room = room;
        self.spatial = None;
        if let Some(id) = room {
            self.ensure_layout(id);
            self.spatial = self
                .layouts
                .get(&id)
                .map(|layout| SpatialGrid::new(layout.room()));
            debug!("player entered room {}", id.get());
        }
    }

    fn current_layout(&self) -> Option<&RoomLayout> {
        self.current_room.and_then(|id| self.layouts.get(&id))
    }

    /// Bounds sealed by lock walls while the active room holds enemies.
    fn lock_bounds(&self) -> Option<CellRect> {
        self.current_layout()
            .filter(|layout| layout.has_enemies())
            .map(|layout| layout.room().bounds())
    }

    fn move_player(&mut self, input: PlayerInput, dt: f32) {
        let mut movement = input.movement;
        if !movement.is_finite() || movement.length() < INPUT_DEAD_ZONE {
            movement = Vec2::ZERO;
        } else if movement.length() > 1.0 {
            movement = movement.normalize();
        }
        if let Some(facing) = Direction::from_vector(movement) {
            self.player.facing = facing;
        }

        let modifiers = self.player.effects.modifiers();
        self.player.body.steer(
            movement,
            PLAYER_MAX_SPEED * modifiers.move_speed,
            PLAYER_ACCELERATION,
            dt,
        );
    }

    fn fire_player(&mut self, shoot: Option<Direction>, dt: f32, out_events: &mut Vec<Event>) {
        let player = &mut self.player;
        player.shoot_cooldown = (player.shoot_cooldown - dt).max(0.0);
        let Some(direction) = shoot else {
            return;
        };
        if player.shoot_cooldown > 0.0 {
            return;
        }

        let modifiers = player.effects.modifiers();
        player.shoot_cooldown = SHOOT_COOLDOWN * modifiers.cooldown;
        player.facing = direction;

        let reach = if direction.is_horizontal() {
            player.body.half_extents.x
        } else {
            player.body.half_extents.y
        };
        let origin = player.body.position + direction.unit_vector() * (reach + PLAYER_MUZZLE_GAP);
        let lateral = if direction.is_horizontal() {
            Vec2::Y
        } else {
            Vec2::X
        };

        for shot in 0..modifiers.shots {
            let offset = if shot == 0 {
                0.0
            } else {
                let side = if shot % 2 == 1 { 1.0 } else { -1.0 };
                ((shot + 1) / 2) as f32 * SHOT_SPACING * side
            };
            let position = origin + lateral * offset;
            self.projectiles.push(Projectile::new(Launch {
                position,
                velocity: direction.unit_vector() * PROJECTILE_SPEED,
                inherited: player.body.velocity * PLAYER_INHERITED_VELOCITY,
                damage: PROJECTILE_DAMAGE * modifiers.damage,
                force: PROJECTILE_FORCE,
                drop_distance: PROJECTILE_DROP_DISTANCE * modifiers.range,
                faction: Faction::Player,
            }));
            out_events.push(Event::ProjectileFired {
                faction: Faction::Player,
                position,
            });
        }
    }

    fn track_room(&mut self, out_events: &mut Vec<Event>) {
        let room = self
            .floor
            .grid
            .room_at_position(self.player.body.position);
        if room == self.current_room {
            return;
        }
        out_events.push(Event::RoomChanged {
            from: self.current_room,
            to: room,
        });
        self.enter_room(room);
    }

    fn tick_room_timers(&mut self, dt: f32) {
        let Some(layout) = self.current_room.and_then(|id| self.layouts.get_mut(&id)) else {
            return;
        };
        for id in layout.entities.ids() {
            if let Some(entity) = layout.entities.get_mut(id) {
                entity.tick_timers(dt);
            }
        }
    }

    fn steer_enemy(&mut self, enemy: EntityId, direction: Vec2) {
        let dt = self.last_dt;
        let Some(layout) = self.current_room.and_then(|id| self.layouts.get_mut(&id)) else {
            return;
        };
        let Some(entity) = layout.entities.get_mut(enemy) else {
            return;
        };
        if !entity.is_alive_enemy() {
            return;
        }
        let Some(stats) = entity.enemy.map(|state| state.stats) else {
            return;
        };

        let direction = direction.normalize_or_zero();
        if let Some(facing) = Direction::from_vector(direction) {
            entity.facing = facing;
        }
        entity
            .body
            .steer(direction, stats.max_speed, stats.acceleration, dt);
    }

    fn fire_enemy(&mut self, enemy: EntityId, direction: Vec2, out_events: &mut Vec<Event>) {
        let Some(layout) = self.current_room.and_then(|id| self.layouts.get_mut(&id)) else {
            return;
        };
        let Some(entity) = layout.entities.get_mut(enemy) else {
            return;
        };
        let alive = entity.is_alive_enemy();
        let Some(state) = entity.enemy.as_mut() else {
            return;
        };
        let direction = direction.normalize_or_zero();
        if !alive || !state.archetype.is_ranged() || state.fire_cooldown > 0.0 || direction == Vec2::ZERO
        {
            return;
        }

        state.fire_cooldown = state.stats.fire_interval;
        let stats = state.stats;
        if let Some(facing) = Direction::from_vector(direction) {
            entity.facing = facing;
        }

        let position = entity.body.position
            + direction * (entity.body.half_extents.x + ENEMY_MUZZLE_GAP);
        self.projectiles.push(Projectile::new(Launch {
            position,
            velocity: direction * stats.projectile_speed,
            inherited: entity.body.velocity * ENEMY_INHERITED_VELOCITY,
            damage: (stats.damage * 2.0).floor() / 2.0,
            force: stats.knockback,
            drop_distance: ENEMY_DROP_DISTANCE,
            faction: Faction::Enemy,
        }));
        out_events.push(Event::ProjectileFired {
            faction: Faction::Enemy,
            position,
        });
    }

    fn resolve_collisions(&mut self, out_events: &mut Vec<Event>) {
        let lock = self.lock_bounds();

        collide_with_walls(&mut self.player.body, &self.floor.grid, lock);
        self.refresh_spatial();

        for projectile in &mut self.projectiles {
            if touches_wall(&projectile.body.aabb(), &self.floor.grid) {
                projectile.pending_removal = true;
            }
        }

        if let Some(layout) = self.current_room.and_then(|id| self.layouts.get_mut(&id)) {
            for id in layout.dynamic_ids().to_vec() {
                if let Some(entity) = layout.entities.get_mut(id) {
                    if entity.is_alive_enemy() {
                        collide_with_walls(&mut entity.body, &self.floor.grid, lock);
                    }
                }
            }
        }

        self.resolve_projectile_hits(out_events);
        self.resolve_pairs(out_events);
        self.settle_friction();
        self.compact();
        self.detect_cleared(out_events);
    }

    fn refresh_spatial(&mut self) {
        let Some(spatial) = self.spatial.as_mut() else {
            return;
        };
        spatial.clear();
        spatial.insert(Occupant::Player, self.player.body.position);
        if let Some(layout) = self.current_room.and_then(|id| self.layouts.get(&id)) {
            for (id, entity) in layout.entities.iter() {
                if !entity.pending_removal {
                    spatial.insert(Occupant::Entity(id), entity.body.position);
                }
            }
        }
    }

    fn resolve_projectile_hits(&mut self, out_events: &mut Vec<Event>) {
        let player = &mut self.player;
        let mut layout = self.current_room.and_then(|id| self.layouts.get_mut(&id));

        for projectile in self.projectiles.iter_mut().filter(|p| !p.pending_removal) {
            let aabb = projectile.body.aabb();

            if projectile.faction == Faction::Enemy && aabb.overlaps(&player.body.aabb()) {
                projectile.pending_removal = true;
                if player.take_damage(projectile.damage, projectile.impulse()) {
                    out_events.push(Event::PlayerDamaged {
                        amount: projectile.damage,
                    });
                }
                continue;
            }

            let Some(layout) = layout.as_mut() else {
                continue;
            };
            for id in layout.entities.ids() {
                let Some(entity) = layout.entities.get_mut(id) else {
                    continue;
                };
                if entity.pending_removal || !aabb.overlaps(&entity.body.aabb()) {
                    continue;
                }
                if entity.is_solid && entity.is_static {
                    projectile.pending_removal = true;
                    break;
                }
                if projectile.faction != Faction::Player || !entity.is_alive_enemy() {
                    continue;
                }

                projectile.pending_removal = true;
                match entity.take_hit(projectile.damage, projectile.impulse()) {
                    Some(Hit::Damaged(health)) => out_events.push(Event::EnemyDamaged {
                        enemy: id,
                        health,
                    }),
                    Some(Hit::Killed(archetype)) => {
                        out_events.push(Event::EnemyKilled {
                            enemy: id,
                            archetype,
                        });
                    }
                    None => {}
                }
                break;
            }
        }
    }

    fn resolve_pairs(&mut self, out_events: &mut Vec<Event>) {
        let Some(spatial) = self.spatial.as_ref() else {
            return;
        };
        let Some(layout) = self.current_room.and_then(|id| self.layouts.get(&id)) else {
            return;
        };

        let position_of = |occupant: Occupant| match occupant {
            Occupant::Player => Some(self.player.body.position),
            Occupant::Entity(id) => layout.entities.get(id).map(|entity| entity.body.position),
        };

        let mut pairs = BTreeSet::new();
        for occupant in spatial.occupants() {
            let Some(position) = position_of(occupant) else {
                continue;
            };
            for other in spatial.neighbours(position) {
                if occupant < other {
                    let _ = pairs.insert((occupant, other));
                }
            }
        }

        for pair in pairs {
            match pair {
                (Occupant::Player, Occupant::Entity(id)) | (Occupant::Entity(id), Occupant::Player) => {
                    self.player_contact(id, out_events);
                }
                (Occupant::Entity(a), Occupant::Entity(b)) => self.entity_contact(a, b),
                (Occupant::Player, Occupant::Player) => {}
            }
        }
    }

    fn player_contact(&mut self, id: EntityId, out_events: &mut Vec<Event>) {
        let Some(layout) = self.current_room.and_then(|room| self.layouts.get_mut(&room)) else {
            return;
        };
        let Some(entity) = layout.entities.get_mut(id) else {
            return;
        };
        let player = &mut self.player;
        if entity.pending_removal || !player.body.aabb().overlaps(&entity.body.aabb()) {
            return;
        }

        match entity.kind {
            EntityKind::Rock => {
                let _ = player.body.resolve_against(&entity.body.aabb());
            }
            EntityKind::Trap | EntityKind::Scroll => {
                entity.pending_removal = true;
                let source = if entity.kind == EntityKind::Trap {
                    EffectSource::Trap
                } else {
                    EffectSource::Scroll
                };
                let effect = effects::roll(source, &mut self.rng);
                if !player.effects.grant(effect) {
                    match effect {
                        EffectKind::Heal => player.heal(effects::HEAL_AMOUNT),
                        EffectKind::Spikes => {
                            if player.take_damage(effects::SPIKE_DAMAGE, Vec2::ZERO) {
                                out_events.push(Event::PlayerDamaged {
                                    amount: effects::SPIKE_DAMAGE,
                                });
                            }
                        }
                        _ => {}
                    }
                }
                out_events.push(Event::EffectGranted { effect });
            }
            EntityKind::Door => {
                if !entity.locked {
                    out_events.push(Event::DoorContact { door: id });
                }
            }
            EntityKind::Enemy(_) => {
                let Some(state) = entity.enemy else {
                    return;
                };
                if !entity.is_alive_enemy() {
                    return;
                }
                let _ = entity.body.resolve_against(&player.body.aabb());
                let away = (player.body.position - entity.body.position).normalize_or_zero();
                if player.take_damage(state.stats.damage, away * state.stats.knockback) {
                    out_events.push(Event::PlayerDamaged {
                        amount: state.stats.damage,
                    });
                }
            }
            EntityKind::Player | EntityKind::Projectile(_) => {}
        }
    }

    fn entity_contact(&mut self, a: EntityId, b: EntityId) {
        let Some(layout) = self.current_room.and_then(|room| self.layouts.get_mut(&room)) else {
            return;
        };
        let (Some(first), Some(second)) = (layout.entities.get(a), layout.entities.get(b)) else {
            return;
        };
        let first_moves = first.is_alive_enemy();
        let second_moves = second.is_alive_enemy();
        let first_box = first.body.aabb();
        let second_box = second.body.aabb();
        let second_blocks = second.is_solid && (second.is_static || second_moves);
        let first_blocks = first.is_solid && (first.is_static || first_moves);

        if first_moves && second_blocks {
            if let Some(entity) = layout.entities.get_mut(a) {
                let _ = entity.body.resolve_against(&second_box);
            }
        } else if second_moves && first_blocks {
            if let Some(entity) = layout.entities.get_mut(b) {
                let _ = entity.body.resolve_against(&first_box);
            }
        }
    }

    fn settle_friction(&mut self) {
        self.player.body.settle_friction();
        if let Some(layout) = self.current_room.and_then(|id| self.layouts.get_mut(&id)) {
            for id in layout.dynamic_ids().to_vec() {
                if let Some(entity) = layout.entities.get_mut(id) {
                    entity.body.settle_friction();
                }
            }
        }
    }

    fn compact(&mut self) {
        if let Some(layout) = self.current_room.and_then(|id| self.layouts.get_mut(&id)) {
            let _ = layout.compact();
        }
        self.projectiles.retain(|projectile| !projectile.pending_removal);
    }

    fn detect_cleared(&mut self, out_events: &mut Vec<Event>) {
        let Some(room) = self.current_room else {
            return;
        };
        if self.ledger.cleared.contains(&room) {
            return;
        }
        let Some(layout) = self.layouts.get_mut(&room) else {
            return;
        };
        if layout.has_enemies() {
            return;
        }

        let _ = self.ledger.cleared.insert(room);
        out_events.push(Event::RoomCleared { room });
        debug!("room {} cleared", room.get());

        if let Some(door) = layout.exit_door() {
            if let Some(entity) = layout.entities.get_mut(door) {
                entity.locked = false;
                out_events.push(Event::DoorUnlocked { door });
            }
        }
    }

    fn advance_floor(&mut self, floor: GeneratedFloor, out_events: &mut Vec<Event>) {
        self.ledger.floor = self.ledger.floor.saturating_add(1);
        self.ledger.cleared.clear();
        self.layouts.clear();
        self.projectiles.clear();
        self.floor = floor;
        self.transitioning = false;

        let position = match corridor_spawn(&self.floor.grid) {
            Some(position) => position,
            None => self.entry_spawn(),
        };
        self.player.body.position = position;
        self.player.body.velocity = Vec2::ZERO;
        self.enter_room(self.floor.grid.room_at_position(position));

        info!(
            "advanced to floor {} ({} rooms)",
            self.ledger.floor,
            self.floor.rooms.len()
        );
        out_events.push(Event::FloorAdvanced {
            floor: self.ledger.floor,
        });
    }
}

/// Open corridor cell nearest the middle of the grid.
fn corridor_spawn(grid: &MazeGrid) -> Option<Vec2> {
    let center = grid_center(grid);
    grid.iter_cells()
        .filter(|cell| !grid.is_solid(*cell) && grid.room_at(*cell).is_none())
        .map(CellCoord::center)
        .min_by(|a, b| {
            a.distance_squared(center)
                .total_cmp(&b.distance_squared(center))
        })
}

fn grid_center(grid: &MazeGrid) -> Vec2 {
    Vec2::new(
        grid.width() as f32 * CELL_SIZE / 2.0,
        grid.height() as f32 * CELL_SIZE / 2.0,
    )
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt, input } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            if world.transitioning {
                return;
            }

            let dt = dt.as_secs_f32();
            world.last_dt = dt;
            world.move_player(input, dt);
            world.fire_player(input.shoot, dt, out_events);
            world.player.tick_timers(dt);
            for projectile in &mut world.projectiles {
                projectile.fly(dt);
            }
            world.track_room(out_events);
            world.tick_room_timers(dt);
        }
        Command::SteerEnemy { enemy, direction } => {
            if !world.transitioning {
                world.steer_enemy(enemy, direction);
            }
        }
        Command::FireProjectile { enemy, direction } => {
            if !world.transitioning {
                world.fire_enemy(enemy, direction, out_events);
            }
        }
        Command::ResolveCollisions => {
            if !world.transitioning {
                world.resolve_collisions(out_events);
            }
        }
        Command::BeginFloorTransition => {
            if !world.transitioning {
                world.transitioning = true;
                world.player.body.velocity = Vec2::ZERO;
                out_events.push(Event::FloorTransitionStarted);
            }
        }
        Command::CompleteFloor { floor } => world.advance_floor(*floor, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use maze_dungeon_core::{
        EffectSnapshot, EnemyView, EntityId, EntitySnapshot, MazeGrid, ObstacleView,
        PlayerSnapshot, ProjectileSnapshot, Room, RoomId,
    };

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the active maze grid.
    #[must_use]
    pub fn grid(world: &World) -> &MazeGrid {
        &world.floor.grid
    }

    /// Rooms of the active floor in placement order.
    #[must_use]
    pub fn rooms(world: &World) -> &[Room] {
        &world.floor.rooms
    }

    /// One-based index of the active floor.
    #[must_use]
    pub fn floor(world: &World) -> u32 {
        world.ledger.floor
    }

    /// Difficulty level the active floor was generated for.
    #[must_use]
    pub fn level(world: &World) -> u32 {
        world.floor.level
    }

    /// Number of ticks applied since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Room the player currently occupies, if any.
    #[must_use]
    pub fn current_room(world: &World) -> Option<RoomId> {
        world.current_room
    }

    /// Rectangle of the room the player currently occupies.
    #[must_use]
    pub fn active_room(world: &World) -> Option<&Room> {
        world.current_layout().map(|layout| layout.room())
    }

    /// Reports whether the room has been cleared on the active floor.
    #[must_use]
    pub fn is_room_cleared(world: &World, room: RoomId) -> bool {
        world.ledger.cleared.contains(&room)
    }

    /// Reports whether the active room is sealed by its lock walls.
    #[must_use]
    pub fn is_room_locked(world: &World) -> bool {
        world.lock_bounds().is_some()
    }

    /// Reports whether the world is frozen awaiting the next floor.
    #[must_use]
    pub fn is_transitioning(world: &World) -> bool {
        world.transitioning
    }

    /// Exit door of the active room, if it hosts one.
    #[must_use]
    pub fn exit_door(world: &World) -> Option<EntityId> {
        world.current_layout().and_then(|layout| layout.exit_door())
    }

    /// Captures the player's current state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        world.player.snapshot()
    }

    /// Static entities of the active room ordered by handle.
    #[must_use]
    pub fn static_entities(world: &World) -> Vec<EntitySnapshot> {
        let Some(layout) = world.current_layout() else {
            return Vec::new();
        };
        let mut snapshots: Vec<EntitySnapshot> = layout
            .static_ids()
            .into_iter()
            .filter_map(|id| layout.entities.get(id).map(|entity| entity.snapshot(id)))
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Dynamic entities of the active room ordered by handle.
    #[must_use]
    pub fn dynamic_entities(world: &World) -> Vec<EntitySnapshot> {
        let Some(layout) = world.current_layout() else {
            return Vec::new();
        };
        let mut snapshots: Vec<EntitySnapshot> = layout
            .dynamic_ids()
            .iter()
            .filter_map(|id| layout.entities.get(*id).map(|entity| entity.snapshot(*id)))
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Captures a read-only view of the enemies in the active room.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let Some(layout) = world.current_layout() else {
            return EnemyView::default();
        };
        EnemyView::from_snapshots(
            layout
                .dynamic_ids()
                .iter()
                .filter_map(|id| layout.entities.get(*id)?.enemy_snapshot(*id))
                .collect(),
        )
    }

    /// Exposes the static obstacle grid of the active room.
    #[must_use]
    pub fn obstacle_view(world: &World) -> Option<ObstacleView<'_>> {
        world.current_layout().map(|layout| layout.obstacle_view())
    }

    /// Captures every projectile in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| projectile.snapshot())
            .collect()
    }

    /// Timed effects currently running on the player.
    #[must_use]
    pub fn active_effects(world: &World) -> Vec<EffectSnapshot> {
        world.player.effects.snapshots()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use maze_dungeon_core::{
        CellRectSize, ObstacleTemplate, Room, RoomPlan, WallMask,
    };

    #[rustfmt::skip]
    const DOOR_IN_CORNER: [u8; 16] = [
        0, 0, 0, 0,
        0, 0, 0, 0,
        0, 0, 0, 0,
        0, 0, 0, 5,
    ];

    /// Corridor row of three cells above a 2x2 room in the left columns.
    fn small_floor(codes: &[u8]) -> GeneratedFloor {
        let mut grid = MazeGrid::solid(3, 3);
        let room_id = RoomId::new(1);
        let bounds =
            CellRect::from_origin_and_size(CellCoord::new(0, 1), CellRectSize::new(2, 2));
        let _ = grid.set(CellCoord::new(0, 0), WallMask::from_bits(0b1011), None);
        let _ = grid.set(CellCoord::new(1, 0), WallMask::from_bits(0b0010), None);
        let _ = grid.set(CellCoord::new(2, 0), WallMask::from_bits(0b1110), None);
        let _ = grid.set(CellCoord::new(0, 1), WallMask::from_bits(0b0011), Some(room_id));
        let _ = grid.set(CellCoord::new(1, 1), WallMask::from_bits(0b0100), Some(room_id));
        let _ = grid.set(CellCoord::new(0, 2), WallMask::from_bits(0b1001), Some(room_id));
        let _ = grid.set(CellCoord::new(1, 2), WallMask::from_bits(0b1100), Some(room_id));

        GeneratedFloor {
            level: 1,
            grid,
            rooms: vec![Room::new(room_id, bounds)],
            plans: vec![RoomPlan {
                room: room_id,
                template: ObstacleTemplate::from_codes(4, 4, codes).expect("valid template"),
                needs_exit_door: true,
            }],
            entry_room: Some(room_id),
            exit_room: Some(room_id),
        }
    }

    fn tick(world: &mut World, input: PlayerInput) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(16),
                input,
            },
            &mut events,
        );
        apply(world, Command::ResolveCollisions, &mut events);
        events
    }

    #[test]
    fn player_spawns_in_the_entry_room() {
        let world = World::new(small_floor(&DOOR_IN_CORNER), Config::new(6.0, 1));
        assert_eq!(query::current_room(&world), Some(RoomId::new(1)));
        assert_eq!(query::player(&world).position, Vec2::new(50.0, 150.0));
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
    }

    #[test]
    fn empty_entry_room_unlocks_its_door() {
        let mut world = World::new(small_floor(&DOOR_IN_CORNER), Config::new(6.0, 1));
        let events = tick(&mut world, PlayerInput::default());

        assert!(events.contains(&Event::RoomCleared {
            room: RoomId::new(1)
        }));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::DoorUnlocked { .. })));
        assert!(query::is_room_cleared(&world, RoomId::new(1)));
        assert!(!query::is_room_locked(&world));
    }

    #[test]
    fn shooting_spawns_projectiles_and_respects_cooldown() {
        let mut world = World::new(small_floor(&DOOR_IN_CORNER), Config::new(6.0, 1));
        let input = PlayerInput {
            movement: Vec2::ZERO,
            shoot: Some(Direction::East),
        };
        let first = tick(&mut world, input);
        let second = tick(&mut world, input);

        let fired = |events: &[Event]| {
            events
                .iter()
                .filter(|event| matches!(event, Event::ProjectileFired { .. }))
                .count()
        };
        assert_eq!(fired(&first), 1);
        assert_eq!(fired(&second), 0);
        assert_eq!(query::player(&world).facing, Direction::East);
    }

    #[test]
    fn transition_freezes_the_simulation() {
        let mut world = World::new(small_floor(&DOOR_IN_CORNER), Config::new(6.0, 1));
        let mut events = Vec::new();
        apply(&mut world, Command::BeginFloorTransition, &mut events);
        apply(&mut world, Command::BeginFloorTransition, &mut events);
        assert_eq!(events, vec![Event::FloorTransitionStarted]);

        let before = query::player(&world).position;
        let events = tick(
            &mut world,
            PlayerInput {
                movement: Vec2::X,
                shoot: None,
            },
        );
        assert!(matches!(events.as_slice(), [Event::TimeAdvanced { .. }]));
        assert_eq!(query::player(&world).position, before);
    }

    #[test]
    fn completing_a_floor_moves_the_player_to_the_central_corridor() {
        let mut world = World::new(small_floor(&DOOR_IN_CORNER), Config::new(6.0, 1));
        let _ = tick(&mut world, PlayerInput::default());
        let mut events = Vec::new();
        apply(&mut world, Command::BeginFloorTransition, &mut events);

        let mut next = small_floor(&DOOR_IN_CORNER);
        next.level = 2;
        apply(
            &mut world,
            Command::CompleteFloor {
                floor: Box::new(next),
            },
            &mut events,
        );

        assert!(events.contains(&Event::FloorAdvanced { floor: 2 }));
        assert_eq!(query::floor(&world), 2);
        assert_eq!(query::level(&world), 2);
        assert!(!query::is_transitioning(&world));
        assert!(!query::is_room_cleared(&world, RoomId::new(1)));
        assert_eq!(query::player(&world).position, Vec2::new(150.0, 50.0));
        assert_eq!(query::current_room(&world), None);
    }

    #[test]
    fn corridor_spawn_prefers_the_center() {
        let floor = small_floor(&DOOR_IN_CORNER);
        assert_eq!(corridor_spawn(&floor.grid), Some(Vec2::new(150.0, 50.0)));
    }
}
