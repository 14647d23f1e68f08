// Player event delivery
// Backends raise events on their own threads; listeners must not block.

use parking_lot::Mutex;
use std::sync::Arc;

/// Player event types
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Media is being opened
    Opening,

    /// Playback started
    Playing,

    /// Playback paused
    Paused,

    /// Playback stopped
    Stopped,

    /// Media played to the end
    EndReached,

    /// Volume changed (0.0 - 1.0, may exceed 1.0 when amplified)
    VolumeChanged { volume: f32 },

    /// Audio output muted
    Muted,

    /// Audio output unmuted
    Unmuted,

    /// Backend reported a playback error
    EncounteredError { message: String },
}

impl PlayerEvent {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::Opening => "opening",
            PlayerEvent::Playing => "playing",
            PlayerEvent::Paused => "paused",
            PlayerEvent::Stopped => "stopped",
            PlayerEvent::EndReached => "end-reached",
            PlayerEvent::VolumeChanged { .. } => "volume-changed",
            PlayerEvent::Muted => "muted",
            PlayerEvent::Unmuted => "unmuted",
            PlayerEvent::EncounteredError { .. } => "error",
        }
    }
}

/// Player event listener
/// Implementations should be lightweight and non-blocking
pub trait PlayerListener: Send + Sync {
    /// Called when an event occurs, possibly on a backend-owned thread
    fn on_event(&self, event: &PlayerEvent);
}

impl<F> PlayerListener for F
where
    F: Fn(&PlayerEvent) + Send + Sync,
{
    fn on_event(&self, event: &PlayerEvent) {
        self(event)
    }
}

/// Fan-out of player events to every registered listener
#[derive(Clone, Default)]
pub struct EventHub {
    listeners: Arc<Mutex<Vec<Arc<dyn PlayerListener>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn PlayerListener>) {
        self.listeners.lock().push(listener);
    }

    pub fn clear_listeners(&self) {
        self.listeners.lock().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn dispatch(&self, event: &PlayerEvent) {
        // Snapshot so a listener may subscribe or clear without deadlocking.
        let listeners = self.listeners.lock().clone();
        log::trace!("Dispatching {} to {} listener(s)", event.name(), listeners.len());
        for listener in listeners.iter() {
            listener.on_event(event);
        }
    }
}
