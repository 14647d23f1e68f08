// Simulated media backend
// Stands in for the native playback engine in the host binary and in tests.

mod engine;
mod journal;
mod player;
mod settings;

pub use engine::SimEngine;
pub use journal::{Call, Journal};
pub use player::SimPlayer;
pub use settings::{SimSettings, DEFAULT_OUTPUT_READY_AFTER};

use engine::Registry;
use playsample_core::{Engine, EngineOptions, MediaBackend, Result, SampleError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct SimBackend {
    settings: SimSettings,
    journal: Journal,
    registry: Arc<Registry>,
    next_engine_id: AtomicU64,
}

impl SimBackend {
    pub fn new(settings: SimSettings) -> Self {
        Self {
            settings,
            journal: Journal::new(),
            registry: Arc::new(Registry::default()),
            next_engine_id: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> &SimSettings {
        &self.settings
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Players still referenced by someone
    pub fn players(&self) -> Vec<Arc<SimPlayer>> {
        self.registry.live()
    }

    pub fn last_player(&self) -> Option<Arc<SimPlayer>> {
        self.players().into_iter().max_by_key(|p| p.id())
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new(SimSettings::default())
    }
}

impl MediaBackend for SimBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    fn create_engine(&self, options: &EngineOptions) -> Result<Box<dyn Engine>> {
        if self.settings.fail_engine {
            return Err(SampleError::EngineInit(
                "Simulated engine construction failure".to_string(),
            ));
        }
        let id = self.next_engine_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.journal.record(Call::EngineCreated {
            args: options.args.clone(),
            debug_logs: options.enable_debug_logs,
        });
        Ok(Box::new(SimEngine::new(
            id,
            self.settings.clone(),
            self.journal.clone(),
            options,
            self.registry.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use playsample_core::{MediaPlayer, PlayerEvent};
    use std::thread;
    use std::time::{Duration, Instant};

    const URL: &str = "http://example.com/video.mp4";

    fn build(settings: SimSettings) -> (SimBackend, Box<dyn Engine>) {
        let backend = SimBackend::new(settings);
        let engine = backend
            .create_engine(&EngineOptions::default())
            .unwrap();
        (backend, engine)
    }

    fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_journal_order() {
        let (backend, engine) = build(SimSettings::immediate());
        let player = engine.create_player().unwrap();
        let media = engine.open_media(URL).unwrap();
        player.play(&media).unwrap();

        let sim = backend.last_player().unwrap();
        assert_eq!(sim.current_media(), Some(media));
        player.release();
        assert_eq!(sim.current_media(), None);
        engine.release();

        let calls = backend.journal().calls();
        assert_eq!(
            calls,
            vec![
                Call::EngineCreated { args: vec![], debug_logs: false },
                Call::PlayerCreated { player: 1 },
                Call::MediaOpened { location: URL.to_string() },
                Call::Play { player: 1, location: URL.to_string() },
                Call::PlayerReleased { player: 1 },
                Call::EngineReleased { live_players: 0 },
            ]
        );
    }

    #[test]
    fn test_volume_writes_dropped_until_output_ready() {
        let settings = SimSettings {
            output_ready_after: Duration::from_millis(80),
            ..SimSettings::immediate()
        };
        let (backend, engine) = build(settings);
        let player = engine.create_player().unwrap();

        player.set_volume(20).unwrap();
        assert_eq!(player.volume(), 0);

        thread::sleep(Duration::from_millis(100));
        player.set_volume(20).unwrap();
        assert_eq!(player.volume(), 20);

        assert_eq!(
            backend.journal().count(|c| matches!(c, Call::SetVolume { applied: false, .. })),
            1
        );
        player.release();
    }

    #[test]
    fn test_toggle_mute_registers_volume() {
        let (_backend, engine) = build(SimSettings::immediate());
        let player = engine.create_player().unwrap();
        assert_eq!(player.volume(), 0);

        player.toggle_mute().unwrap();
        assert!(player.is_muted());
        assert_eq!(player.volume(), 100);

        player.toggle_mute().unwrap();
        assert!(!player.is_muted());
        player.release();
    }

    #[test]
    fn test_events_arrive_on_backend_thread() {
        let settings = SimSettings {
            auto_playing: true,
            ..SimSettings::immediate()
        };
        let (_backend, engine) = build(settings);
        let player = engine.create_player().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let caller = thread::current().id();
        player.add_listener(Arc::new(move |event: &PlayerEvent| {
            sink.lock().push((event.clone(), thread::current().id() != caller));
        }));

        let media = engine.open_media(URL).unwrap();
        player.play(&media).unwrap();

        assert!(wait_until(Duration::from_secs(2), || seen.lock().len() >= 2));
        let events = seen.lock().clone();
        assert_eq!(events[0], (PlayerEvent::Opening, true));
        assert_eq!(events[1], (PlayerEvent::Playing, true));
        player.release();
    }

    #[test]
    fn test_released_handles_reject_calls() {
        let (backend, engine) = build(SimSettings::immediate());
        let player = engine.create_player().unwrap();
        player.release();
        player.release();

        assert_eq!(player.volume(), -1);
        assert!(player.toggle_mute().is_err());
        assert_eq!(
            backend.journal().count(|c| matches!(c, Call::PlayerReleased { .. })),
            1
        );

        engine.release();
        engine.release();
        assert!(engine.create_player().is_err());
        assert!(engine.open_media(URL).is_err());
        assert_eq!(
            backend.journal().count(|c| matches!(c, Call::EngineReleased { .. })),
            1
        );
    }

    #[test]
    fn test_engine_release_reports_live_players() {
        let (backend, engine) = build(SimSettings::immediate());
        let player = engine.create_player().unwrap();
        engine.release();

        assert!(backend
            .journal()
            .calls()
            .contains(&Call::EngineReleased { live_players: 1 }));
        player.release();
    }

    #[test]
    fn test_failure_injection() {
        let backend = SimBackend::new(SimSettings {
            fail_engine: true,
            ..SimSettings::immediate()
        });
        assert!(matches!(
            backend.create_engine(&EngineOptions::default()),
            Err(SampleError::EngineInit(_))
        ));

        let (_backend, engine) = build(SimSettings {
            fail_media: true,
            ..SimSettings::immediate()
        });
        assert!(matches!(engine.open_media(URL), Err(SampleError::Media(_))));

        let (backend, engine) = build(SimSettings {
            fail_play: true,
            ..SimSettings::immediate()
        });
        let player = engine.create_player().unwrap();
        let media = engine.open_media(URL).unwrap();
        assert!(matches!(player.play(&media), Err(SampleError::Playback(_))));
        assert_eq!(backend.journal().count(|c| matches!(c, Call::Play { .. })), 0);
        player.release();
    }

    #[test]
    fn test_registry_tracks_live_players() {
        let (backend, engine) = build(SimSettings::immediate());
        let first = engine.create_player().unwrap();
        let second = engine.create_player().unwrap();

        assert_eq!(backend.players().len(), 2);
        assert_eq!(backend.last_player().map(|p| p.id()), Some(2));

        first.release();
        drop(first);
        assert_eq!(backend.players().len(), 1);
        second.release();
    }
}
