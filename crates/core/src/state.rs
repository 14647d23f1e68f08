// Controller lifecycle state

use crate::error::{Result, SampleError};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No engine or player yet
    Uninitialized,
    /// Engine and player built, playback requested
    Initialized,
    /// Handles released; terminal
    Disposed,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Uninitialized => "uninitialized",
            ControllerState::Initialized => "initialized",
            ControllerState::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// Thread-safe lifecycle state container
#[derive(Clone)]
pub struct StateContainer {
    state: Arc<RwLock<ControllerState>>,
}

impl StateContainer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ControllerState::Uninitialized)),
        }
    }

    pub fn get(&self) -> ControllerState {
        *self.state.read()
    }

    /// Move to `to`, failing if the transition is not allowed from the current state
    pub fn transition(&self, to: ControllerState) -> Result<ControllerState> {
        let mut state = self.state.write();
        let from = *state;
        Self::validate_transition(from, to)?;
        *state = to;
        log::debug!("Controller state changed: {} -> {}", from, to);
        Ok(from)
    }

    pub fn validate_transition(from: ControllerState, to: ControllerState) -> Result<()> {
        match (from, to) {
            (ControllerState::Uninitialized, ControllerState::Initialized) => Ok(()),
            (ControllerState::Uninitialized, ControllerState::Disposed) => Ok(()),

            // Rebuild after the surface is recreated
            (ControllerState::Initialized, ControllerState::Initialized) => Ok(()),
            (ControllerState::Initialized, ControllerState::Disposed) => Ok(()),

            _ => Err(SampleError::InvalidState(format!(
                "Invalid state transition from {} to {}",
                from, to
            ))),
        }
    }
}

impl Default for StateContainer {
    fn default() -> Self {
        Self::new()
    }
}
