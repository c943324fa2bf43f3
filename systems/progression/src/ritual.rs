//! Hold-the-door timer that gates floor transitions.

use maze_dungeon_core::EntityId;

/// Seconds the player must remain in a doorway before the transition starts.
pub const HOLD_DURATION: f32 = 1.5;
/// Seconds the ready state is shown before a transition completes.
pub const MINIMUM_READY_DURATION: f32 = 0.5;

/// Phase of the door ritual.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RitualPhase {
    /// Nobody is holding a door.
    Idle,
    /// The player stands in an unlocked doorway.
    Holding,
    /// The next floor is being prepared.
    Transitioning,
}

/// State machine tracking a door hold and the transition that follows it.
#[derive(Clone, Debug)]
pub struct DoorRitual {
    phase: RitualPhase,
    door: Option<EntityId>,
    hold_duration: f32,
    minimum_ready: f32,
    hold_timer: f32,
    transition_timer: f32,
    ready_timer: f32,
    ready: bool,
}

impl Default for DoorRitual {
    fn default() -> Self {
        Self::new(HOLD_DURATION, MINIMUM_READY_DURATION)
    }
}

impl DoorRitual {
    /// Creates an idle ritual with the provided timings in seconds.
    #[must_use]
    pub fn new(hold_duration: f32, minimum_ready: f32) -> Self {
        Self {
            phase: RitualPhase::Idle,
            door: None,
            hold_duration: hold_duration.max(0.0),
            minimum_ready: minimum_ready.max(0.0),
            hold_timer: 0.0,
            transition_timer: 0.0,
            ready_timer: 0.0,
            ready: false,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> RitualPhase {
        self.phase
    }

    /// Door being held or passed through.
    #[must_use]
    pub const fn door(&self) -> Option<EntityId> {
        self.door
    }

    /// Begins holding `door`. Ignored while transitioning or when the same door
    /// is already held.
    pub fn start_hold(&mut self, door: EntityId) {
        if self.phase == RitualPhase::Transitioning {
            return;
        }
        if self.phase == RitualPhase::Holding && self.door == Some(door) {
            return;
        }

        self.phase = RitualPhase::Holding;
        self.door = Some(door);
        self.hold_timer = 0.0;
        self.transition_timer = 0.0;
        self.ready_timer = 0.0;
        self.ready = false;
    }

    /// Abandons the current hold.
    pub fn cancel_hold(&mut self) {
        if self.phase != RitualPhase::Holding {
            return;
        }
        self.reset();
    }

    /// Advances the hold timer.
    ///
    /// Returns `true` exactly once, on the update that enters
    /// [`RitualPhase::Transitioning`].
    pub fn update_hold(&mut self, dt: f32, still_inside: bool) -> bool {
        if self.phase != RitualPhase::Holding {
            return false;
        }
        if !still_inside {
            self.cancel_hold();
            return false;
        }

        self.hold_timer = (self.hold_timer + dt).min(self.hold_duration);
        if self.hold_timer < self.hold_duration {
            return false;
        }

        self.phase = RitualPhase::Transitioning;
        self.transition_timer = 0.0;
        self.ready_timer = 0.0;
        self.ready = false;
        true
    }

    /// Advances the transition once the next floor may or may not be ready.
    ///
    /// Returns `true` when the transition completes. The ritual is idle again
    /// afterwards.
    pub fn tick_transition(&mut self, dt: f32, ready: bool) -> bool {
        if self.phase != RitualPhase::Transitioning {
            return false;
        }

        self.transition_timer += dt;
        if ready && !self.ready {
            self.ready = true;
            self.ready_timer = 0.0;
        }
        if self.ready {
            self.ready_timer += dt;
        }

        if self.ready && self.ready_timer >= self.minimum_ready {
            self.reset();
            return true;
        }
        false
    }

    /// Seconds spent in the current transition.
    #[must_use]
    pub fn transition_elapsed(&self) -> f32 {
        match self.phase {
            RitualPhase::Transitioning => self.transition_timer,
            RitualPhase::Idle | RitualPhase::Holding => 0.0,
        }
    }

    /// Fraction of the hold completed, within `[0, 1]`.
    #[must_use]
    pub fn hold_progress(&self) -> f32 {
        if self.phase != RitualPhase::Holding {
            return 0.0;
        }
        if self.hold_duration <= 0.0 {
            return 1.0;
        }
        (self.hold_timer / self.hold_duration).min(1.0)
    }

    /// Fraction of the ready display completed, within `[0, 1]`.
    #[must_use]
    pub fn transition_progress(&self) -> f32 {
        if self.phase != RitualPhase::Transitioning || !self.ready {
            return 0.0;
        }
        if self.minimum_ready <= 0.0 {
            return 1.0;
        }
        (self.ready_timer / self.minimum_ready).min(1.0)
    }

    fn reset(&mut self) {
        self.phase = RitualPhase::Idle;
        self.door = None;
        self.hold_timer = 0.0;
        self.transition_timer = 0.0;
        self.ready_timer = 0.0;
        self.ready = false;
    }
}
