//! Pickup effects granted by scrolls and traps.

use maze_dungeon_core::{EffectKind, EffectSnapshot, EffectSource};
use rand::Rng;

const SCROLL_EFFECTS: [EffectKind; 5] = [
    EffectKind::DoubleShot,
    EffectKind::RapidFire,
    EffectKind::Heal,
    EffectKind::SpeedBoost,
    EffectKind::Shield,
];

const TRAP_EFFECTS: [EffectKind; 4] = [
    EffectKind::SlowMovement,
    EffectKind::SlowShooting,
    EffectKind::Weakened,
    EffectKind::Spikes,
];

/// Health restored by a healing scroll.
pub(crate) const HEAL_AMOUNT: f32 = 1.0;
/// Damage dealt by a spike trap.
pub(crate) const SPIKE_DAMAGE: f32 = 0.5;

/// Duration in seconds and stacking rule. Instant effects have no duration.
fn definition(kind: EffectKind) -> (Option<f32>, bool) {
    match kind {
        EffectKind::DoubleShot => (Some(18.0), false),
        EffectKind::RapidFire => (Some(12.0), false),
        EffectKind::Heal => (None, false),
        EffectKind::SpeedBoost => (Some(10.0), true),
        EffectKind::Shield => (Some(8.0), false),
        EffectKind::SlowMovement => (Some(15.0), true),
        EffectKind::SlowShooting => (Some(12.0), false),
        EffectKind::Weakened => (Some(8.0), false),
        EffectKind::Spikes => (None, false),
    }
}

/// Draws an effect uniformly from the pool of the pickup source.
pub(crate) fn roll<R: Rng + ?Sized>(source: EffectSource, rng: &mut R) -> EffectKind {
    let pool: &[EffectKind] = match source {
        EffectSource::Scroll => &SCROLL_EFFECTS,
        EffectSource::Trap => &TRAP_EFFECTS,
    };
    pool[rng.gen_range(0..pool.len())]
}

/// Multipliers the active effects apply to the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PlayerModifiers {
    pub(crate) move_speed: f32,
    pub(crate) cooldown: f32,
    pub(crate) damage: f32,
    pub(crate) range: f32,
    pub(crate) shield: bool,
    pub(crate) shots: u32,
}

impl Default for PlayerModifiers {
    fn default() -> Self {
        Self {
            move_speed: 1.0,
            cooldown: 1.0,
            damage: 1.0,
            range: 1.0,
            shield: false,
            shots: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActiveEffect {
    kind: EffectKind,
    remaining: f32,
    duration: f32,
    stacks: u32,
}

/// Timed effects currently running on the player.
#[derive(Clone, Debug, Default)]
pub(crate) struct Effects {
    active: Vec<ActiveEffect>,
}

impl Effects {
    /// Starts or refreshes a timed effect. Returns `false` for instant effects,
    /// which the caller resolves immediately.
    pub(crate) fn grant(&mut self, kind: EffectKind) -> bool {
        let (Some(duration), stacks) = definition(kind) else {
            return false;
        };

        match self.active.iter_mut().find(|effect| effect.kind == kind) {
            Some(effect) => {
                effect.remaining = duration;
                effect.duration = duration;
                if stacks {
                    effect.stacks += 1;
                }
            }
            None => self.active.push(ActiveEffect {
                kind,
                remaining: duration,
                duration,
                stacks: 1,
            }),
        }
        true
    }

    pub(crate) fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        for effect in &mut self.active {
            effect.remaining = (effect.remaining - dt).max(0.0);
        }
        self.active.retain(|effect| effect.remaining > 0.0);
    }

    fn stacks(&self, kind: EffectKind) -> u32 {
        self.active
            .iter()
            .find(|effect| effect.kind == kind)
            .map_or(0, |effect| effect.stacks)
    }

    pub(crate) fn modifiers(&self) -> PlayerModifiers {
        let mut modifiers = PlayerModifiers::default();

        let haste = self.stacks(EffectKind::SpeedBoost);
        let burden = self.stacks(EffectKind::SlowMovement);
        modifiers.move_speed = (1.0 + 0.25 * haste as f32) * 0.6f32.powi(burden as i32).max(0.3);

        if self.stacks(EffectKind::RapidFire) > 0 {
            modifiers.cooldown *= 0.5;
        }
        if self.stacks(EffectKind::SlowShooting) > 0 {
            modifiers.cooldown *= 1.75;
        }
        if self.stacks(EffectKind::Weakened) > 0 {
            modifiers.damage = 0.5;
            modifiers.range = 0.75;
        }
        modifiers.shield = self.stacks(EffectKind::Shield) > 0;
        if self.stacks(EffectKind::DoubleShot) > 0 {
            modifiers.shots = 2;
        }

        modifiers
    }

    pub(crate) fn snapshots(&self) -> Vec<EffectSnapshot> {
        self.active
            .iter()
            .map(|effect| EffectSnapshot {
                kind: effect.kind,
                remaining: effect.remaining,
                duration: effect.duration,
                stacks: effect.stacks,
            })
            .collect()
    }
}
