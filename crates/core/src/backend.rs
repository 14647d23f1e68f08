// Media backend traits
// The playback engine is a black box; controllers only talk to it through these.

use crate::error::{Result, SampleError};
use crate::events::PlayerListener;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Weak};

/// Options used to build an engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Ask the backend for its own verbose logging
    pub enable_debug_logs: bool,
    /// Backend-specific arguments (render/window options first, in host order)
    pub args: Vec<String>,
}

/// Entry point into a media backend
pub trait MediaBackend: Send + Sync {
    /// Human readable backend name
    fn name(&self) -> &str;

    /// Build a new engine context
    fn create_engine(&self, options: &EngineOptions) -> Result<Box<dyn Engine>>;
}

/// Engine context owning the native decode/render resources
/// Must outlive every player created from it
pub trait Engine: Send + Sync {
    /// Create a player bound to this engine
    fn create_player(&self) -> Result<PlayerHandle>;

    /// Open a media resource for later playback
    fn open_media(&self, location: &str) -> Result<Media>;

    /// Release native resources. Calling it again is a no-op.
    fn release(&self);

    fn is_released(&self) -> bool;
}

/// Stateful player driving one media resource at a time
pub trait MediaPlayer: Send + Sync {
    /// Register a listener for player events
    fn add_listener(&self, listener: Arc<dyn PlayerListener>);

    /// Start playback of the given media
    fn play(&self, media: &Media) -> Result<()>;

    /// Current volume in percent, read from the live player (0 - 200, -1 without audio output)
    fn volume(&self) -> i32;

    /// Set volume in percent
    fn set_volume(&self, volume: i32) -> Result<()>;

    fn is_muted(&self) -> bool;

    /// Toggle the mute state of the audio output
    fn toggle_mute(&self) -> Result<()>;

    /// Release native resources. Calling it again is a no-op.
    fn release(&self);

    fn is_released(&self) -> bool;
}

/// An openable media resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    location: String,
}

impl Media {
    /// Accepts http, https and file locations
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        let supported = ["http://", "https://", "file://"]
            .iter()
            .any(|scheme| location.len() > scheme.len() && location.starts_with(scheme));
        if !supported {
            return Err(SampleError::Media(format!(
                "Unsupported media location: '{}'",
                location
            )));
        }
        Ok(Self {
            location: location.to_string(),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// Shared reference to a player; equality is identity
#[derive(Clone)]
pub struct PlayerHandle(Arc<dyn MediaPlayer>);

impl PlayerHandle {
    pub fn new(player: Arc<dyn MediaPlayer>) -> Self {
        Self(player)
    }

    pub fn downgrade(&self) -> WeakPlayerHandle {
        WeakPlayerHandle(Arc::downgrade(&self.0))
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl Deref for PlayerHandle {
    type Target = dyn MediaPlayer;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for PlayerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for PlayerHandle {}

impl fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("addr", &self.addr())
            .field("released", &self.0.is_released())
            .finish()
    }
}

/// Non-owning player reference, used by listeners registered on the player itself
#[derive(Clone)]
pub struct WeakPlayerHandle(Weak<dyn MediaPlayer>);

impl WeakPlayerHandle {
    pub fn upgrade(&self) -> Option<PlayerHandle> {
        self.0.upgrade().map(PlayerHandle)
    }
}
