// Volume latency probe
//
// Measures how long after construction a player's volume first reads non-zero.
// The probe thread sleeps on a condition variable that volume-changed events
// signal, re-polls with exponential backoff, and gives up at the deadline.

use crate::config::ProbeConfig;
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use playsample_core::{
    Diagnostic, DiagnosticLog, PlayerEvent, PlayerHandle, Result, WeakPlayerHandle,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How a probe run ended
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Volume read non-zero this long after player construction
    Registered { elapsed: Duration, volume: i32 },
    TimedOut { elapsed: Duration },
    /// Stopped by the owner or the player went away
    Cancelled { elapsed: Duration },
}

impl ProbeOutcome {
    pub fn elapsed(&self) -> Duration {
        match self {
            ProbeOutcome::Registered { elapsed, .. }
            | ProbeOutcome::TimedOut { elapsed }
            | ProbeOutcome::Cancelled { elapsed } => *elapsed,
        }
    }

    fn to_diagnostic(&self) -> Diagnostic {
        match *self {
            ProbeOutcome::Registered { elapsed, volume } => {
                Diagnostic::VolumeRegistered { elapsed, volume }
            }
            ProbeOutcome::TimedOut { elapsed } => Diagnostic::VolumeProbeTimedOut { elapsed },
            ProbeOutcome::Cancelled { elapsed } => Diagnostic::VolumeProbeCancelled { elapsed },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub poll_interval: Duration,
    pub max_poll_interval: Duration,
    pub timeout: Duration,
    pub write_volume: Option<i32>,
}

impl From<&ProbeConfig> for ProbeSettings {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_poll_interval: config.max_poll_interval(),
            timeout: config.timeout(),
            write_volume: config.write_volume,
        }
    }
}

struct ProbeShared {
    outcome: OnceCell<ProbeOutcome>,
    woken: Mutex<bool>,
    signal: Condvar,
    cancelled: AtomicBool,
}

impl ProbeShared {
    fn new() -> Self {
        Self {
            outcome: OnceCell::new(),
            woken: Mutex::new(false),
            signal: Condvar::new(),
            cancelled: AtomicBool::new(false),
        }
    }

    fn wake(&self) {
        *self.woken.lock() = true;
        self.signal.notify_all();
    }

    /// Sleep until woken or `timeout` passes, consuming the wake flag
    fn sleep(&self, timeout: Duration) {
        let mut woken = self.woken.lock();
        if !*woken {
            self.signal.wait_for(&mut woken, timeout);
        }
        *woken = false;
    }

    fn wait_outcome(&self, timeout: Duration) -> Option<ProbeOutcome> {
        let deadline = Instant::now() + timeout;
        let mut woken = self.woken.lock();
        loop {
            if let Some(outcome) = self.outcome.get() {
                return Some(outcome.clone());
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            self.signal.wait_for(&mut woken, deadline - now);
        }
    }
}

/// Cloneable view of a running probe's result
#[derive(Clone)]
pub struct ProbeWatcher {
    shared: Arc<ProbeShared>,
}

impl ProbeWatcher {
    pub fn outcome(&self) -> Option<ProbeOutcome> {
        self.shared.outcome.get().cloned()
    }

    /// Block up to `timeout` for the probe to finish
    pub fn wait(&self, timeout: Duration) -> Option<ProbeOutcome> {
        self.shared.wait_outcome(timeout)
    }
}

pub struct VolumeLatencyProbe {
    shared: Arc<ProbeShared>,
    handle: Option<thread::JoinHandle<()>>,
}

impl VolumeLatencyProbe {
    /// Start probing `player`, measuring from `created_at`
    pub fn start(
        player: &PlayerHandle,
        created_at: Instant,
        settings: ProbeSettings,
        diagnostics: DiagnosticLog,
    ) -> Result<Self> {
        let shared = Arc::new(ProbeShared::new());

        let waker = Arc::downgrade(&shared);
        player.add_listener(Arc::new(move |event: &PlayerEvent| {
            if let PlayerEvent::VolumeChanged { .. } = event {
                if let Some(shared) = waker.upgrade() {
                    shared.wake();
                }
            }
        }));

        let target = player.downgrade();
        let thread_shared = shared.clone();
        let handle = thread::Builder::new()
            .name("volume-probe".to_string())
            .spawn(move || {
                let outcome = Self::run(&target, created_at, &settings, &thread_shared);
                diagnostics.emit(outcome.to_diagnostic());
                let _ = thread_shared.outcome.set(outcome);
                thread_shared.wake();
            })?;

        log::debug!("Volume latency probe started");
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    fn run(
        target: &WeakPlayerHandle,
        created_at: Instant,
        settings: &ProbeSettings,
        shared: &ProbeShared,
    ) -> ProbeOutcome {
        let deadline = created_at + settings.timeout;
        let mut interval = settings.poll_interval;

        loop {
            if shared.cancelled.load(Ordering::SeqCst) {
                return ProbeOutcome::Cancelled {
                    elapsed: created_at.elapsed(),
                };
            }

            let player = match target.upgrade() {
                Some(player) if !player.is_released() => player,
                _ => {
                    return ProbeOutcome::Cancelled {
                        elapsed: created_at.elapsed(),
                    }
                }
            };

            let volume = player.volume();
            if volume > 0 {
                return ProbeOutcome::Registered {
                    elapsed: created_at.elapsed(),
                    volume,
                };
            }
            if let Some(write_volume) = settings.write_volume {
                if let Err(e) = player.set_volume(write_volume) {
                    log::debug!("Probe volume write failed: {}", e);
                }
            }
            drop(player);

            let now = Instant::now();
            if now >= deadline {
                return ProbeOutcome::TimedOut {
                    elapsed: created_at.elapsed(),
                };
            }
            shared.sleep(interval.min(deadline - now));
            interval = (interval * 2).min(settings.max_poll_interval);
        }
    }

    pub fn watcher(&self) -> ProbeWatcher {
        ProbeWatcher {
            shared: self.shared.clone(),
        }
    }

    pub fn outcome(&self) -> Option<ProbeOutcome> {
        self.shared.outcome.get().cloned()
    }

    /// Ask the probe thread to stop at its next wakeup
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        self.shared.wake();
    }

    /// Cancel, join the probe thread, and return how it ended
    pub fn shutdown(&mut self) -> Option<ProbeOutcome> {
        if let Some(handle) = self.handle.take() {
            self.cancel();
            if handle.join().is_err() {
                log::error!("Volume latency probe thread panicked");
            }
        }
        self.outcome()
    }
}

impl Drop for VolumeLatencyProbe {
    fn drop(&mut self) {
        self.shutdown();
    }
}
