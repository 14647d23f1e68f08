// Error handling for the playback sample

use thiserror::Error;

/// Playback sample error types
#[derive(Debug, Error)]
pub enum SampleError {
    /// Failed to create the backend engine
    #[error("Engine initialization error: {0}")]
    EngineInit(String),

    /// Failed to create a player bound to the engine
    #[error("Player initialization error: {0}")]
    PlayerInit(String),

    /// Failed to open a media resource
    #[error("Media error: {0}")]
    Media(String),

    /// Playback error
    #[error("Playback error: {0}")]
    Playback(String),

    /// Operation not valid in the current controller or handle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Operation belongs to a feature that is switched off
    #[error("Feature disabled: {0}")]
    FeatureDisabled(&'static str),

    /// Configuration could not be read or is invalid
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for sample operations
pub type Result<T> = std::result::Result<T, SampleError>;
