use std::time::Duration;

/// Audio output startup delay observed on real hardware
pub const DEFAULT_OUTPUT_READY_AFTER: Duration = Duration::from_millis(650);

/// Behaviour knobs for the simulated backend
#[derive(Debug, Clone)]
pub struct SimSettings {
    /// Time after player construction before the audio output accepts volume writes
    pub output_ready_after: Duration,
    /// Volume the output reports once registered
    pub default_volume: i32,
    /// Register the default volume on the first read after the output is ready,
    /// instead of waiting for a write or a mute toggle
    pub auto_register_volume: bool,
    /// Emit `Playing` on the event thread after `startup_delay`
    pub auto_playing: bool,
    pub startup_delay: Duration,
    pub fail_engine: bool,
    pub fail_player: bool,
    pub fail_media: bool,
    pub fail_play: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            output_ready_after: DEFAULT_OUTPUT_READY_AFTER,
            default_volume: 100,
            auto_register_volume: false,
            auto_playing: true,
            startup_delay: Duration::from_millis(50),
            fail_engine: false,
            fail_player: false,
            fail_media: false,
            fail_play: false,
        }
    }
}

impl SimSettings {
    /// Output ready immediately, no automatic events
    pub fn immediate() -> Self {
        Self {
            output_ready_after: Duration::ZERO,
            auto_playing: false,
            startup_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
