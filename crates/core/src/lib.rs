// Core types and traits for the playback sample

pub mod backend;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod property;
pub mod state;

// Re-export commonly used types
pub use backend::{
    Engine, EngineOptions, Media, MediaBackend, MediaPlayer, PlayerHandle, WeakPlayerHandle,
};
pub use diagnostics::{Diagnostic, DiagnosticLog, DiagnosticSink, RecordingSink};
pub use error::{Result, SampleError};
pub use events::{EventHub, PlayerEvent, PlayerListener};
pub use property::{Observable, PropertyObserver};
pub use state::{ControllerState, StateContainer};
