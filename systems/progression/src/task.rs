//! Deferred next-floor generation with cancel-on-drop handles.

use std::{
    collections::VecDeque,
    fmt,
    sync::mpsc::{self, Receiver, Sender, TryRecvError},
};

use log::debug;
use maze_dungeon_core::GeneratedFloor;

type Job = Box<dyn FnOnce() -> GeneratedFloor>;

struct Pending {
    floor: u32,
    job: Job,
    sender: Sender<GeneratedFloor>,
}

/// Queue of floor generations executed at the start of the following tick.
#[derive(Default)]
pub struct FloorScheduler {
    queue: VecDeque<Pending>,
}

impl fmt::Debug for FloorScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloorScheduler")
            .field("pending", &self.queue.len())
            .finish()
    }
}

impl FloorScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `job` and returns the handle that will receive its floor.
    pub fn schedule<F>(&mut self, floor: u32, job: F) -> FloorTask
    where
        F: FnOnce() -> GeneratedFloor + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        self.queue.push_back(Pending {
            floor,
            job: Box::new(job),
            sender,
        });
        debug!("scheduled generation of floor {floor}");
        FloorTask {
            floor,
            receiver,
            result: None,
        }
    }

    /// Runs every queued job, returning how many results were delivered.
    ///
    /// Results whose task has been dropped are discarded.
    pub fn run_pending(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(pending) = self.queue.pop_front() {
            let floor = (pending.job)();
            if pending.sender.send(floor).is_ok() {
                delivered += 1;
            } else {
                debug!(
                    "discarding floor {} generated after its task was dropped",
                    pending.floor
                );
            }
        }
        delivered
    }

    /// Number of jobs waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Handle to a scheduled floor. Dropping it cancels delivery.
#[derive(Debug)]
pub struct FloorTask {
    floor: u32,
    receiver: Receiver<GeneratedFloor>,
    result: Option<GeneratedFloor>,
}

impl FloorTask {
    /// Floor number the task was requested for.
    #[must_use]
    pub const fn floor(&self) -> u32 {
        self.floor
    }

    /// Reports whether the generated floor has arrived.
    pub fn poll(&mut self) -> bool {
        if self.result.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(floor) => {
                self.result = Some(floor);
                true
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => false,
        }
    }

    /// Takes the generated floor once it has arrived.
    pub fn take(&mut self) -> Option<GeneratedFloor> {
        let _ = self.poll();
        self.result.take()
    }
}
