// Diagnostic output: every line goes to the `log` facade and to registered sinks

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Log target used for diagnostic lines
pub const DIAGNOSTICS_TARGET: &str = "playsample::diagnostics";

/// A single diagnostic observation
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Volume read right after the player was built
    VolumeAfterConstruction { volume: i32 },
    /// Player started playing; volume read from the live player
    Playing { volume: Option<i32> },
    Paused,
    Stopped,
    EndReached,
    VolumeChanged { volume: f32 },
    Muted,
    Unmuted,
    PlayerError { message: String },
    /// Volume was first observed non-zero this long after player construction
    VolumeRegistered { elapsed: Duration, volume: i32 },
    /// Volume stayed zero for the whole probe window
    VolumeProbeTimedOut { elapsed: Duration },
    VolumeProbeCancelled { elapsed: Duration },
}

impl Diagnostic {
    fn level(&self) -> log::Level {
        match self {
            Diagnostic::PlayerError { .. } | Diagnostic::VolumeProbeTimedOut { .. } => {
                log::Level::Warn
            }
            _ => log::Level::Debug,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::VolumeAfterConstruction { volume } => {
                write!(f, "Volume after creating media player: {}", volume)
            }
            Diagnostic::Playing { volume: Some(volume) } => {
                write!(f, "Playing event! Volume: {}", volume)
            }
            Diagnostic::Playing { volume: None } => {
                write!(f, "Playing event! Volume: unavailable (player released)")
            }
            Diagnostic::Paused => write!(f, "Paused"),
            Diagnostic::Stopped => write!(f, "Stopped"),
            Diagnostic::EndReached => write!(f, "End reached"),
            Diagnostic::VolumeChanged { volume } => {
                write!(f, "Volume changed! New volume: {}", volume)
            }
            Diagnostic::Muted => write!(f, "Muted!"),
            Diagnostic::Unmuted => write!(f, "Unmuted!"),
            Diagnostic::PlayerError { message } => write!(f, "Player error: {}", message),
            Diagnostic::VolumeRegistered { elapsed, volume } => write!(
                f,
                "Volume took {:.3} seconds since creating media player to register as non-zero ({})",
                elapsed.as_secs_f64(),
                volume
            ),
            Diagnostic::VolumeProbeTimedOut { elapsed } => write!(
                f,
                "Volume still zero {:.3} seconds after creating media player, giving up",
                elapsed.as_secs_f64()
            ),
            Diagnostic::VolumeProbeCancelled { elapsed } => write!(
                f,
                "Volume probe cancelled after {:.3} seconds",
                elapsed.as_secs_f64()
            ),
        }
    }
}

/// Receiver of diagnostic observations
/// Called from whichever thread produced the observation; must not block
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, diagnostic: &Diagnostic);
}

/// Writes diagnostics to the log and fans them out to sinks
#[derive(Clone, Default)]
pub struct DiagnosticLog {
    sinks: Arc<Mutex<Vec<Arc<dyn DiagnosticSink>>>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&self, sink: Arc<dyn DiagnosticSink>) {
        self.sinks.lock().push(sink);
    }

    pub fn emit(&self, diagnostic: Diagnostic) {
        log::log!(target: DIAGNOSTICS_TARGET, diagnostic.level(), "{}", diagnostic);
        let sinks = self.sinks.lock().clone();
        for sink in sinks.iter() {
            sink.record(&diagnostic);
        }
    }
}

/// Sink that keeps every diagnostic in memory
#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&Diagnostic) -> bool) -> usize {
        self.entries.lock().iter().filter(|d| matches(d)).count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, diagnostic: &Diagnostic) {
        self.entries.lock().push(diagnostic.clone());
    }
}
