// Playback sample controller
//
// Builds an engine and a player when the host surface is ready, starts the
// configured media, forwards player events to diagnostics, and releases the
// player before the engine on dispose.

use crate::command::RelayCommand;
use crate::config::{ControllerConfig, ReinitializePolicy};
use crate::forwarder::DiagnosticForwarder;
use crate::probe::{ProbeOutcome, ProbeSettings, VolumeLatencyProbe};
use parking_lot::Mutex;
use playsample_core::{
    ControllerState, Diagnostic, DiagnosticLog, DiagnosticSink, Engine, EngineOptions,
    MediaBackend, Observable, PlayerHandle, PropertyObserver, Result, SampleError, StateContainer,
};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// Name reported to observers when the player property changes
pub const MEDIA_PLAYER_PROPERTY: &str = "MediaPlayer";

/// Host signal that the render surface exists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceReady {
    /// Backend render/window options, in host order
    pub render_options: Vec<String>,
}

impl SurfaceReady {
    pub fn new<I, S>(render_options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            render_options: render_options.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Default)]
struct Handles {
    engine: Option<Box<dyn Engine>>,
    probe: Option<VolumeLatencyProbe>,
}

pub struct PlaybackSampleController {
    backend: Arc<dyn MediaBackend>,
    config: ControllerConfig,
    state: StateContainer,
    // Serializes initialize/dispose; `handles` is only held briefly
    lifecycle: Mutex<()>,
    handles: Mutex<Handles>,
    media_player: Observable<Option<PlayerHandle>>,
    diagnostics: DiagnosticLog,
    last_probe: Mutex<Option<ProbeOutcome>>,
    initialized_command: RelayCommand<SurfaceReady>,
    mute_command: Option<RelayCommand<()>>,
}

impl PlaybackSampleController {
    pub fn new(backend: Arc<dyn MediaBackend>, config: ControllerConfig) -> Arc<Self> {
        log::info!(
            "Creating playback controller (backend: {}, mute command: {}, volume probe: {})",
            backend.name(),
            config.features.mute_command,
            config.features.volume_latency_probe
        );

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let mute_command = config
                .features
                .mute_command
                .then(|| Self::build_mute_command(weak.clone()));

            Self {
                backend,
                config,
                state: StateContainer::new(),
                lifecycle: Mutex::new(()),
                handles: Mutex::new(Handles::default()),
                media_player: Observable::new(MEDIA_PLAYER_PROPERTY, None),
                diagnostics: DiagnosticLog::new(),
                last_probe: Mutex::new(None),
                initialized_command: Self::build_initialized_command(weak.clone()),
                mute_command,
            }
        })
    }

    fn build_initialized_command(weak: Weak<Self>) -> RelayCommand<SurfaceReady> {
        let gate = weak.clone();
        RelayCommand::new("initialized", move |event: SurfaceReady| {
            match weak.upgrade() {
                Some(controller) => controller.initialize(event),
                None => Ok(()),
            }
        })
        .with_can_execute(move || gate.upgrade().is_some())
    }

    fn build_mute_command(weak: Weak<Self>) -> RelayCommand<()> {
        let gate = weak.clone();
        RelayCommand::new("mute-unmute", move |_: ()| match weak.upgrade() {
            Some(controller) => controller.toggle_mute(),
            None => Ok(()),
        })
        .with_can_execute(move || {
            gate.upgrade()
                .map(|controller| controller.media_player().is_some())
                .unwrap_or(false)
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        self.state.get()
    }

    /// Command bound to the host's surface-ready signal
    pub fn initialized_command(&self) -> &RelayCommand<SurfaceReady> {
        &self.initialized_command
    }

    /// Mute toggle command, absent when the feature is off
    pub fn mute_command(&self) -> Option<&RelayCommand<()>> {
        self.mute_command.as_ref()
    }

    /// Current player, if initialized
    pub fn media_player(&self) -> Option<PlayerHandle> {
        self.media_player.get()
    }

    pub fn has_engine(&self) -> bool {
        self.handles.lock().engine.is_some()
    }

    /// Observers are notified after the lifecycle lock is released, so they
    /// may call back into the controller. They read the value current at
    /// notification time.
    pub fn subscribe_property_changed(&self, observer: Arc<dyn PropertyObserver>) {
        self.media_player.subscribe(observer);
    }

    pub fn add_diagnostic_sink(&self, sink: Arc<dyn DiagnosticSink>) {
        self.diagnostics.add_sink(sink);
    }

    /// Build engine and player, then start playback of the configured media
    pub fn initialize(&self, event: SurfaceReady) -> Result<()> {
        let mut changes = 0;
        let result = {
            let _lifecycle = self.lifecycle.lock();
            self.initialize_locked(event, &mut changes)
        };
        self.notify_player_changed(changes);
        result
    }

    fn initialize_locked(&self, event: SurfaceReady, changes: &mut usize) -> Result<()> {
        match self.state.get() {
            ControllerState::Disposed => {
                log::warn!("Initialize ignored, controller already disposed");
                return Ok(());
            }
            ControllerState::Initialized => match self.config.reinitialize {
                ReinitializePolicy::Reject => {
                    return Err(SampleError::InvalidState(
                        "Controller already initialized".to_string(),
                    ));
                }
                ReinitializePolicy::Rebuild => {
                    log::info!("Surface recreated, rebuilding engine and player");
                    *changes += self.release_handles();
                }
            },
            ControllerState::Uninitialized => {}
        }

        let mut args = event.render_options;
        args.extend(self.config.engine.extra_options.iter().cloned());
        let options = EngineOptions {
            enable_debug_logs: self.config.engine.enable_debug_logs,
            args,
        };

        let engine = self.backend.create_engine(&options)?;
        let player = match engine.create_player() {
            Ok(player) => player,
            Err(e) => {
                log::error!("Failed to create player: {}", e);
                engine.release();
                return Err(e);
            }
        };
        let created_at = Instant::now();

        player.add_listener(Arc::new(DiagnosticForwarder::new(
            player.downgrade(),
            self.diagnostics.clone(),
        )));
        self.diagnostics.emit(Diagnostic::VolumeAfterConstruction {
            volume: player.volume(),
        });

        let mut probe = if self.config.features.volume_latency_probe {
            let settings = ProbeSettings::from(&self.config.probe);
            match VolumeLatencyProbe::start(&player, created_at, settings, self.diagnostics.clone())
            {
                Ok(probe) => Some(probe),
                Err(e) => {
                    log::warn!("Volume latency probe not started: {}", e);
                    None
                }
            }
        } else {
            None
        };

        if let Err(e) = self.start_playback(engine.as_ref(), &player) {
            log::error!("Failed to start playback: {}", e);
            if let Some(probe) = probe.as_mut() {
                probe.shutdown();
            }
            player.release();
            engine.release();
            return Err(e);
        }

        {
            let mut handles = self.handles.lock();
            handles.engine = Some(engine);
            handles.probe = probe;
        }
        // A finished outcome from a previous player no longer applies
        self.last_probe.lock().take();
        self.state.transition(ControllerState::Initialized)?;
        if self.media_player.swap(Some(player)).1 {
            *changes += 1;
        }

        log::info!("Playback controller initialized");
        Ok(())
    }

    fn start_playback(&self, engine: &dyn Engine, player: &PlayerHandle) -> Result<()> {
        let media = engine.open_media(&self.config.media_url)?;
        log::info!("Playing {}", media.location());
        player.play(&media)
    }

    /// Toggle mute on the live player
    pub fn toggle_mute(&self) -> Result<()> {
        if !self.config.features.mute_command {
            return Err(SampleError::FeatureDisabled("mute command"));
        }
        let player = self.media_player.get().ok_or_else(|| {
            SampleError::InvalidState("Mute toggled before the player was created".to_string())
        })?;
        player.toggle_mute()
    }

    /// Outcome of the volume latency probe, if it has finished
    pub fn probe_outcome(&self) -> Option<ProbeOutcome> {
        let live = self
            .handles
            .lock()
            .probe
            .as_ref()
            .and_then(VolumeLatencyProbe::outcome);
        live.or_else(|| self.last_probe.lock().clone())
    }

    /// Block up to `timeout` for the running probe to finish
    pub fn wait_for_probe(&self, timeout: Duration) -> Option<ProbeOutcome> {
        let watcher = self.handles.lock().probe.as_ref().map(VolumeLatencyProbe::watcher);
        match watcher {
            Some(watcher) => watcher.wait(timeout),
            None => self.last_probe.lock().clone(),
        }
    }

    /// Release player then engine. Safe to call repeatedly and before initialize.
    pub fn dispose(&self) {
        let changes = {
            let _lifecycle = self.lifecycle.lock();
            let changes = self.release_handles();

            if self.state.get() != ControllerState::Disposed {
                if let Err(e) = self.state.transition(ControllerState::Disposed) {
                    log::error!("Dispose: {}", e);
                } else {
                    log::info!("Playback controller disposed");
                }
            }
            changes
        };
        self.notify_player_changed(changes);
    }

    fn notify_player_changed(&self, changes: usize) {
        for _ in 0..changes {
            self.media_player.notify();
        }
    }

    /// Returns how many player property notifications are owed
    fn release_handles(&self) -> usize {
        let (probe, engine) = {
            let mut handles = self.handles.lock();
            (handles.probe.take(), handles.engine.take())
        };

        if let Some(mut probe) = probe {
            if let Some(outcome) = probe.shutdown() {
                *self.last_probe.lock() = Some(outcome);
            }
        }
        let (player, changed) = self.media_player.swap(None);
        if let Some(player) = player {
            log::debug!("Releasing player");
            player.release();
        }
        if let Some(engine) = engine {
            log::debug!("Releasing engine");
            engine.release();
        }
        usize::from(changed)
    }
}

impl Drop for PlaybackSampleController {
    fn drop(&mut self) {
        let leaked = self.media_player.get().is_some() || self.handles.lock().engine.is_some();
        if leaked {
            log::warn!("Controller dropped without dispose, releasing player and engine");
        }
        self.dispose();
    }
}
