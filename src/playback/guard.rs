use std::sync::{Mutex, MutexGuard};

/// The two drag latches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latches {
    pub seeking_progress: bool,
    pub seeking_volume: bool,
}

/// Latches set by the presentation surface while the user drags a control.
///
/// The synchronizer commits snapshots while holding [`lock`](Self::lock), and
/// gestures flip latches through the same lock, so "is anyone dragging?" and
/// "write the snapshot" happen as one step.
#[derive(Debug, Default)]
pub struct InteractionGuard {
    latches: Mutex<Latches>,
}

impl InteractionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, Latches> {
        match self.latches.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn latches(&self) -> Latches {
        *self.lock()
    }

    pub fn set_seeking_progress(&self, on: bool) {
        self.lock().seeking_progress = on;
    }

    pub fn set_seeking_volume(&self, on: bool) {
        self.lock().seeking_volume = on;
    }

    pub fn seeking_progress(&self) -> bool {
        self.lock().seeking_progress
    }

    pub fn seeking_volume(&self) -> bool {
        self.lock().seeking_volume
    }
}
