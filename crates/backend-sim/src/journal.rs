// Ordered record of every call made into the simulated backend

use parking_lot::Mutex;
use std::sync::Arc;

/// A backend call as seen by the simulator
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    EngineCreated { args: Vec<String>, debug_logs: bool },
    PlayerCreated { player: u64 },
    MediaOpened { location: String },
    Play { player: u64, location: String },
    SetVolume { player: u64, volume: i32, applied: bool },
    ToggleMute { player: u64 },
    PlayerReleased { player: u64 },
    EngineReleased { live_players: usize },
}

#[derive(Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: Call) {
        log::trace!("[sim] {:?}", call);
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| matches(call)).count()
    }

    /// Index of the first call matching the predicate
    pub fn position(&self, matches: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.lock().iter().position(|call| matches(call))
    }
}
