// Playback sample controller and its host-facing pieces

pub mod command;
pub mod config;
pub mod controller;
mod forwarder;
pub mod probe;

pub use command::RelayCommand;
pub use config::{
    ControllerConfig, EngineConfig, FeatureConfig, ProbeConfig, ReinitializePolicy,
    DEFAULT_MEDIA_URL,
};
pub use controller::{PlaybackSampleController, SurfaceReady, MEDIA_PLAYER_PROPERTY};
pub use probe::{ProbeOutcome, ProbeSettings, ProbeWatcher, VolumeLatencyProbe};
