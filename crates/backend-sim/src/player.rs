// Simulated player
// Models the audio output startup quirk: volume reads 0 until the output is
// ready, writes before that are dropped, and after that a write or a mute
// toggle registers the volume.

use crate::engine::EngineShared;
use crate::journal::Call;
use parking_lot::Mutex;
use playsample_core::{
    EventHub, Media, MediaPlayer, PlayerEvent, PlayerListener, Result, SampleError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const MAX_VOLUME: i32 = 200;

enum PumpMessage {
    Now(PlayerEvent),
    At(Instant, PlayerEvent),
}

/// Backend-owned thread delivering player events
struct EventPump {
    tx: mpsc::Sender<PumpMessage>,
    handle: thread::JoinHandle<()>,
}

impl EventPump {
    fn spawn(player: u64, hub: EventHub) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(format!("sim-player-{}", player))
            .spawn(move || Self::run(rx, hub))?;
        Ok(Self { tx, handle })
    }

    fn run(rx: mpsc::Receiver<PumpMessage>, hub: EventHub) {
        let mut delayed: Vec<(Instant, PlayerEvent)> = Vec::new();
        loop {
            let now = Instant::now();
            let (due, pending): (Vec<_>, Vec<_>) =
                delayed.into_iter().partition(|(at, _)| *at <= now);
            delayed = pending;
            for (_, event) in due {
                hub.dispatch(&event);
            }

            let next_due = delayed.iter().map(|(at, _)| *at).min();
            let message = match next_due {
                Some(at) => match rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                    Ok(message) => message,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match rx.recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };

            match message {
                PumpMessage::Now(event) => hub.dispatch(&event),
                PumpMessage::At(at, event) => delayed.push((at, event)),
            }
        }
        log::debug!("[sim] event thread exiting, {} event(s) dropped", delayed.len());
    }

    fn send(&self, message: PumpMessage) {
        // The receiver only goes away during shutdown
        let _ = self.tx.send(message);
    }

    fn shutdown(self) {
        let EventPump { tx, handle } = self;
        drop(tx);
        if handle.thread().id() != thread::current().id() {
            let _ = handle.join();
        }
    }
}

struct AudioState {
    volume: i32,
    registered: bool,
    muted: bool,
}

/// In-process player with a real event thread
pub struct SimPlayer {
    id: u64,
    engine: Arc<EngineShared>,
    hub: EventHub,
    created_at: Instant,
    audio: Mutex<AudioState>,
    media: Mutex<Option<Media>>,
    released: AtomicBool,
    pump: Mutex<Option<EventPump>>,
}

impl SimPlayer {
    pub(crate) fn new(id: u64, engine: Arc<EngineShared>) -> Result<Arc<Self>> {
        let hub = EventHub::new();
        let pump = EventPump::spawn(id, hub.clone())?;
        log::debug!("[sim] player {} created on engine {}", id, engine.id);
        Ok(Arc::new(Self {
            id,
            engine,
            hub,
            created_at: Instant::now(),
            audio: Mutex::new(AudioState {
                volume: 0,
                registered: false,
                muted: false,
            }),
            media: Mutex::new(None),
            released: AtomicBool::new(false),
            pump: Mutex::new(Some(pump)),
        }))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the audio output accepts volume writes yet
    pub fn output_ready(&self) -> bool {
        self.created_at.elapsed() >= self.engine.settings.output_ready_after
    }

    pub fn current_media(&self) -> Option<Media> {
        self.media.lock().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.hub.listener_count()
    }

    /// Deliver an event synchronously on the calling thread
    pub fn emit_now(&self, event: PlayerEvent) {
        self.hub.dispatch(&event);
    }

    fn queue(&self, message: PumpMessage) {
        if let Some(pump) = self.pump.lock().as_ref() {
            pump.send(message);
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_released() {
            Err(SampleError::InvalidState(format!(
                "Player {} already released",
                self.id
            )))
        } else {
            Ok(())
        }
    }

    fn register_volume(&self, audio: &mut AudioState) {
        audio.registered = true;
        audio.volume = self.engine.settings.default_volume;
        log::debug!(
            "[sim] player {} volume registered at {} after {:?}",
            self.id,
            audio.volume,
            self.created_at.elapsed()
        );
        self.queue(PumpMessage::Now(PlayerEvent::VolumeChanged {
            volume: audio.volume as f32 / 100.0,
        }));
    }
}

impl MediaPlayer for SimPlayer {
    fn add_listener(&self, listener: Arc<dyn PlayerListener>) {
        self.hub.add_listener(listener);
    }

    fn play(&self, media: &Media) -> Result<()> {
        self.ensure_live()?;
        if self.engine.settings.fail_play {
            return Err(SampleError::Playback(
                "Simulated playback failure".to_string(),
            ));
        }
        self.engine.journal.record(Call::Play {
            player: self.id,
            location: media.location().to_string(),
        });
        *self.media.lock() = Some(media.clone());

        self.queue(PumpMessage::Now(PlayerEvent::Opening));
        if self.engine.settings.auto_playing {
            let at = Instant::now() + self.engine.settings.startup_delay;
            self.queue(PumpMessage::At(at, PlayerEvent::Playing));
        }
        Ok(())
    }

    fn volume(&self) -> i32 {
        if self.is_released() {
            return -1;
        }
        let mut audio = self.audio.lock();
        if !audio.registered && self.engine.settings.auto_register_volume && self.output_ready() {
            self.register_volume(&mut audio);
        }
        audio.volume
    }

    fn set_volume(&self, volume: i32) -> Result<()> {
        self.ensure_live()?;
        if !(0..=MAX_VOLUME).contains(&volume) {
            return Err(SampleError::Playback(format!(
                "Volume out of range: {}",
                volume
            )));
        }

        let applied = self.output_ready();
        self.engine.journal.record(Call::SetVolume {
            player: self.id,
            volume,
            applied,
        });
        if !applied {
            log::trace!("[sim] player {} dropped volume write, output not ready", self.id);
            return Ok(());
        }

        let mut audio = self.audio.lock();
        audio.registered = true;
        if audio.volume != volume {
            audio.volume = volume;
            self.queue(PumpMessage::Now(PlayerEvent::VolumeChanged {
                volume: volume as f32 / 100.0,
            }));
        }
        Ok(())
    }

    fn is_muted(&self) -> bool {
        self.audio.lock().muted
    }

    fn toggle_mute(&self) -> Result<()> {
        self.ensure_live()?;
        self.engine.journal.record(Call::ToggleMute { player: self.id });

        let mut audio = self.audio.lock();
        if !audio.registered && self.output_ready() {
            self.register_volume(&mut audio);
        }
        audio.muted = !audio.muted;
        let event = if audio.muted {
            PlayerEvent::Muted
        } else {
            PlayerEvent::Unmuted
        };
        self.queue(PumpMessage::Now(event));
        Ok(())
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.engine.journal.record(Call::PlayerReleased { player: self.id });
        self.media.lock().take();
        self.hub.clear_listeners();

        let pump = self.pump.lock().take();
        if let Some(pump) = pump {
            pump.shutdown();
        }
        self.engine.player_released();
        log::debug!("[sim] player {} released", self.id);
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl Drop for SimPlayer {
    fn drop(&mut self) {
        if !self.is_released() {
            log::warn!("[sim] player {} dropped without release", self.id);
            self.release();
        }
    }
}
