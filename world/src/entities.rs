//! Room entities, the player and projectiles.

use glam::Vec2;
use maze_dungeon_core::{
    Archetype, Direction, EnemySnapshot, EnemyStats, EntityId, EntityKind, EntitySnapshot, Faction,
    PlayerSnapshot, ProjectileSnapshot,
};

use crate::{effects::Effects, physics::Body};

const STATIC_SIZE: f32 = 40.0;
const ENEMY_SIZE: f32 = 25.0;
const DEATH_FADE: f32 = 0.5;
const HURT_FLASH: f32 = 0.2;

const PLAYER_WIDTH: f32 = 30.0;
const PLAYER_HEIGHT: f32 = 25.0;
const PLAYER_INVULNERABILITY: f32 = 1.0;

const PROJECTILE_SIZE: f32 = 8.0;
const PROJECTILE_HEIGHT: f32 = 15.0;
const PROJECTILE_GRAVITY: f32 = 250.0;

#[derive(Clone, Copy, Debug)]
pub(crate) struct EnemyState {
    pub(crate) archetype: Archetype,
    pub(crate) stats: EnemyStats,
    pub(crate) fire_cooldown: f32,
}

/// Outcome of a projectile landing on an enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Hit {
    Damaged(f32),
    Killed(Archetype),
}

/// Entity owned by a room layout.
#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) kind: EntityKind,
    pub(crate) body: Body,
    pub(crate) is_static: bool,
    pub(crate) is_solid: bool,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) hurt: f32,
    pub(crate) facing: Direction,
    pub(crate) fading: Option<f32>,
    pub(crate) locked: bool,
    pub(crate) pending_removal: bool,
    pub(crate) enemy: Option<EnemyState>,
}

impl Entity {
    fn fixture(kind: EntityKind, position: Vec2, is_solid: bool) -> Self {
        Self {
            kind,
            body: Body::new(position, STATIC_SIZE, STATIC_SIZE),
            is_static: true,
            is_solid,
            health: 0.0,
            max_health: 0.0,
            hurt: 0.0,
            facing: Direction::South,
            fading: None,
            locked: false,
            pending_removal: false,
            enemy: None,
        }
    }

    pub(crate) fn rock(position: Vec2) -> Self {
        Self::fixture(EntityKind::Rock, position, true)
    }

    pub(crate) fn trap(position: Vec2) -> Self {
        Self::fixture(EntityKind::Trap, position, false)
    }

    pub(crate) fn scroll(position: Vec2) -> Self {
        Self::fixture(EntityKind::Scroll, position, false)
    }

    /// Exit doors start locked until their room is cleared.
    pub(crate) fn door(position: Vec2) -> Self {
        Self {
            locked: true,
            ..Self::fixture(EntityKind::Door, position, false)
        }
    }

    pub(crate) fn enemy(archetype: Archetype, level: u32, position: Vec2) -> Self {
        let stats = archetype.stats(level);
        Self {
            kind: EntityKind::Enemy(archetype),
            body: Body::new(position, ENEMY_SIZE, ENEMY_SIZE),
            is_static: false,
            is_solid: true,
            health: stats.max_health,
            max_health: stats.max_health,
            hurt: 0.0,
            facing: Direction::South,
            fading: None,
            locked: false,
            pending_removal: false,
            enemy: Some(EnemyState {
                archetype,
                stats,
                fire_cooldown: stats.fire_interval,
            }),
        }
    }

    /// Enemy that still takes part in combat.
    pub(crate) fn is_alive_enemy(&self) -> bool {
        self.enemy.is_some() && self.fading.is_none() && !self.pending_removal
    }

    pub(crate) fn tick_timers(&mut self, dt: f32) {
        self.hurt = (self.hurt - dt).max(0.0);
        if let Some(enemy) = self.enemy.as_mut() {
            enemy.fire_cooldown = (enemy.fire_cooldown - dt).max(0.0);
        }
        if let Some(fade) = self.fading.as_mut() {
            *fade -= dt;
            if *fade <= 0.0 {
                self.pending_removal = true;
            }
        }
    }

    /// Applies damage and knockback. Dying enemies ignore further hits.
    pub(crate) fn take_hit(&mut self, amount: f32, impulse: Vec2) -> Option<Hit> {
        if !self.is_alive_enemy() {
            return None;
        }
        let archetype = self.enemy.as_ref()?.archetype;

        self.health = (self.health - amount).max(0.0);
        self.hurt = HURT_FLASH;
        self.body.apply_impulse(impulse);

        if self.health <= 0.0 {
            self.fading = Some(DEATH_FADE);
            self.body.velocity = Vec2::ZERO;
            Some(Hit::Killed(archetype))
        } else {
            Some(Hit::Damaged(self.health))
        }
    }

    pub(crate) fn snapshot(&self, id: EntityId) -> EntitySnapshot {
        EntitySnapshot {
            id,
            kind: self.kind,
            position: self.body.position,
            velocity: self.body.velocity,
            half_extents: self.body.half_extents,
            health: self.health,
            max_health: self.max_health,
            facing: self.facing,
            hurt: self.hurt > 0.0,
            fading: self.fading.map(|fade| (fade / DEATH_FADE).clamp(0.0, 1.0)),
            locked: self.locked,
        }
    }

    pub(crate) fn enemy_snapshot(&self, id: EntityId) -> Option<EnemySnapshot> {
        let enemy = self.enemy.as_ref()?;
        Some(EnemySnapshot {
            id,
            archetype: enemy.archetype,
            position: self.body.position,
            velocity: self.body.velocity,
            half_extents: self.body.half_extents,
            alive: self.is_alive_enemy(),
            ready_to_fire: enemy.fire_cooldown <= 0.0,
        })
    }
}

/// The player character, owned by the world rather than a room.
#[derive(Clone, Debug)]
pub(crate) struct Player {
    pub(crate) body: Body,
    pub(crate) facing: Direction,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) invulnerable: f32,
    pub(crate) hurt: f32,
    pub(crate) shoot_cooldown: f32,
    pub(crate) effects: Effects,
}

impl Player {
    pub(crate) fn new(position: Vec2, max_health: f32) -> Self {
        Self {
            body: Body::new(position, PLAYER_WIDTH, PLAYER_HEIGHT),
            facing: Direction::South,
            health: max_health,
            max_health,
            invulnerable: 0.0,
            hurt: 0.0,
            shoot_cooldown: 0.0,
            effects: Effects::default(),
        }
    }

    pub(crate) fn tick_timers(&mut self, dt: f32) {
        self.invulnerable = (self.invulnerable - dt).max(0.0);
        self.hurt = (self.hurt - dt).max(0.0);
        self.effects.tick(dt);
    }

    /// Applies damage unless shielded or inside the immunity window.
    ///
    /// Returns `true` when the hit landed.
    pub(crate) fn take_damage(&mut self, amount: f32, impulse: Vec2) -> bool {
        if self.invulnerable > 0.0 || self.effects.modifiers().shield {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.invulnerable = PLAYER_INVULNERABILITY;
        self.hurt = HURT_FLASH;
        self.body.apply_impulse(impulse);
        true
    }

    pub(crate) fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }

    pub(crate) fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.body.position,
            velocity: self.body.velocity,
            half_extents: self.body.half_extents,
            facing: self.facing,
            health: self.health,
            max_health: self.max_health,
            invulnerable: self.invulnerable > 0.0,
            hurt: self.hurt > 0.0,
        }
    }
}

/// Launch parameters of a projectile.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Launch {
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) inherited: Vec2,
    pub(crate) damage: f32,
    pub(crate) force: f32,
    pub(crate) drop_distance: f32,
    pub(crate) faction: Faction,
}

/// Projectile in flight, owned by the world.
#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) body: Body,
    pub(crate) velocity: Vec2,
    pub(crate) inherited: Vec2,
    pub(crate) damage: f32,
    pub(crate) force: f32,
    pub(crate) faction: Faction,
    pub(crate) pending_removal: bool,
    drop_distance: f32,
    travelled: f32,
    height: f32,
    vertical_velocity: f32,
}

impl Projectile {
    pub(crate) fn new(launch: Launch) -> Self {
        Self {
            body: Body::new(launch.position, PROJECTILE_SIZE, PROJECTILE_SIZE),
            velocity: launch.velocity,
            inherited: launch.inherited,
            damage: launch.damage,
            force: launch.force,
            faction: launch.faction,
            pending_removal: false,
            drop_distance: launch.drop_distance,
            travelled: 0.0,
            height: PROJECTILE_HEIGHT,
            vertical_velocity: 0.0,
        }
    }

    /// Moves the projectile. It flies level until the drop distance, then falls.
    pub(crate) fn fly(&mut self, dt: f32) {
        let own = self.velocity * dt;
        self.body.position += own + self.inherited * dt;
        self.travelled += own.length();

        if self.travelled < self.drop_distance {
            self.height = PROJECTILE_HEIGHT;
            self.vertical_velocity = 0.0;
        } else {
            self.vertical_velocity -= PROJECTILE_GRAVITY * dt;
            self.height += self.vertical_velocity * dt;
        }

        if self.height <= 0.0 {
            self.height = 0.0;
            self.pending_removal = true;
        }
    }

    /// Knockback direction for whatever the projectile hits.
    pub(crate) fn impulse(&self) -> Vec2 {
        self.velocity.normalize_or_zero() * self.force
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            position: self.body.position,
            velocity: self.velocity + self.inherited,
            height: self.height,
            faction: self.faction,
        }
    }
}
