#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Door ritual and next-floor preparation.
//!
//! The progression system watches door contacts reported by the world, runs
//! the hold timer, freezes the world while the next floor is generated in the
//! background of the tick loop and finally hands the floor back to the world.

mod ritual;
mod task;

use log::debug;
use maze_dungeon_core::{Command, EntityId, Event};
use maze_dungeon_system_generation::MazeGenerator;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use ritual::{DoorRitual, RitualPhase, HOLD_DURATION, MINIMUM_READY_DURATION};
pub use task::{FloorScheduler, FloorTask};

/// Read-only description of the ritual used by adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressionSnapshot {
    /// Current phase.
    pub phase: RitualPhase,
    /// Door being held or passed through.
    pub door: Option<EntityId>,
    /// Fraction of the hold completed.
    pub hold_progress: f32,
    /// Fraction of the ready display completed.
    pub transition_progress: f32,
}

/// System that advances floors once the player holds an unlocked door.
#[derive(Debug)]
pub struct Progression {
    ritual: DoorRitual,
    scheduler: FloorScheduler,
    task: Option<FloorTask>,
    generator: MazeGenerator,
    rng: ChaCha8Rng,
    floor: u32,
}

impl Progression {
    /// Creates the system for a dungeon whose first floor is already live.
    ///
    /// `seed` drives the seeds of every floor generated from here on.
    #[must_use]
    pub fn new(generator: MazeGenerator, ritual: DoorRitual, seed: u64) -> Self {
        Self {
            ritual,
            scheduler: FloorScheduler::new(),
            task: None,
            generator,
            rng: ChaCha8Rng::seed_from_u64(seed),
            floor: 1,
        }
    }

    /// Starts holding `door` on behalf of the player.
    pub fn request_hold(&mut self, door: EntityId) {
        self.ritual.start_hold(door);
    }

    /// Snapshot of the ritual state.
    #[must_use]
    pub fn snapshot(&self) -> ProgressionSnapshot {
        ProgressionSnapshot {
            phase: self.ritual.phase(),
            door: self.ritual.door(),
            hold_progress: self.ritual.hold_progress(),
            transition_progress: self.ritual.transition_progress(),
        }
    }

    /// Floor the system believes is live.
    #[must_use]
    pub const fn floor(&self) -> u32 {
        self.floor
    }

    /// Whether a next floor is being prepared.
    #[must_use]
    pub fn has_pending_floor(&self) -> bool {
        self.task.is_some()
    }

    /// Consumes one tick worth of world events and emits progression commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let _ = self.scheduler.run_pending();

        let mut dt = 0.0;
        let mut contact = None;
        for event in events {
            match event {
                Event::TimeAdvanced { dt: elapsed } => dt += elapsed.as_secs_f32(),
                Event::DoorContact { door } => contact = contact.or(Some(*door)),
                Event::FloorAdvanced { floor } => self.floor = *floor,
                _ => {}
            }
        }

        match self.ritual.phase() {
            RitualPhase::Idle | RitualPhase::Holding => {
                if let Some(door) = contact {
                    self.ritual.start_hold(door);
                }
                let still_inside = contact.is_some() && contact == self.ritual.door();
                if self.ritual.update_hold(dt, still_inside) {
                    out.push(Command::BeginFloorTransition);
                    self.schedule_next_floor();
                }
            }
            RitualPhase::Transitioning => {
                let ready = self.task.as_mut().map_or(false, FloorTask::poll);
                if self.ritual.tick_transition(dt, ready) {
                    self.complete(out);
                }
            }
        }
    }

    fn schedule_next_floor(&mut self) {
        let level = self.floor.saturating_add(1);
        let seed: u64 = self.rng.gen();
        let generator = self.generator.clone();
        self.task = Some(self.scheduler.schedule(level, move || {
            generator.generate_level(level, &mut ChaCha8Rng::seed_from_u64(seed))
        }));
    }

    fn complete(&mut self, out: &mut Vec<Command>) {
        let Some(mut task) = self.task.take() else {
            return;
        };
        let Some(floor) = task.take() else {
            return;
        };
        if task.floor() != self.floor.saturating_add(1) {
            debug!(
                "dropping floor {} prepared while floor {} is live",
                task.floor(),
                self.floor
            );
            return;
        }
        out.push(Command::CompleteFloor {
            floor: Box::new(floor),
        });
    }
}
