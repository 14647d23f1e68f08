// Simulated engine context

use crate::journal::{Call, Journal};
use crate::player::SimPlayer;
use crate::settings::SimSettings;
use parking_lot::Mutex;
use playsample_core::{Engine, EngineOptions, Media, PlayerHandle, Result, SampleError};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Players created by a backend, tracked weakly so tests can reach them
#[derive(Default)]
pub(crate) struct Registry {
    players: Mutex<Vec<Weak<SimPlayer>>>,
    next_player_id: AtomicU64,
}

impl Registry {
    fn next_id(&self) -> u64 {
        self.next_player_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn track(&self, player: &Arc<SimPlayer>) {
        let mut players = self.players.lock();
        players.retain(|p| p.strong_count() > 0);
        players.push(Arc::downgrade(player));
    }

    pub(crate) fn live(&self) -> Vec<Arc<SimPlayer>> {
        self.players.lock().iter().filter_map(Weak::upgrade).collect()
    }
}

/// State shared between an engine and the players built from it
pub(crate) struct EngineShared {
    pub(crate) id: u64,
    pub(crate) settings: SimSettings,
    pub(crate) journal: Journal,
    registry: Arc<Registry>,
    live_players: AtomicUsize,
    released: AtomicBool,
}

impl EngineShared {
    pub(crate) fn player_released(&self) {
        self.live_players.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct SimEngine {
    shared: Arc<EngineShared>,
}

impl SimEngine {
    pub(crate) fn new(
        id: u64,
        settings: SimSettings,
        journal: Journal,
        options: &EngineOptions,
        registry: Arc<Registry>,
    ) -> Self {
        log::debug!("[sim] engine {} created with {} arg(s)", id, options.args.len());
        Self {
            shared: Arc::new(EngineShared {
                id,
                settings,
                journal,
                registry,
                live_players: AtomicUsize::new(0),
                released: AtomicBool::new(false),
            }),
        }
    }

    pub fn live_players(&self) -> usize {
        self.shared.live_players.load(Ordering::SeqCst)
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_released() {
            Err(SampleError::InvalidState(format!(
                "Engine {} already released",
                self.shared.id
            )))
        } else {
            Ok(())
        }
    }
}

impl Engine for SimEngine {
    fn create_player(&self) -> Result<PlayerHandle> {
        self.ensure_live()?;
        if self.shared.settings.fail_player {
            return Err(SampleError::PlayerInit(
                "Simulated player construction failure".to_string(),
            ));
        }

        let id = self.shared.registry.next_id();
        let player = SimPlayer::new(id, self.shared.clone())?;
        self.shared.live_players.fetch_add(1, Ordering::SeqCst);
        self.shared.journal.record(Call::PlayerCreated { player: id });
        self.shared.registry.track(&player);
        Ok(PlayerHandle::new(player))
    }

    fn open_media(&self, location: &str) -> Result<Media> {
        self.ensure_live()?;
        if self.shared.settings.fail_media {
            return Err(SampleError::Media(format!(
                "Simulated failure opening '{}'",
                location
            )));
        }
        let media = Media::parse(location)?;
        self.shared.journal.record(Call::MediaOpened {
            location: media.location().to_string(),
        });
        Ok(media)
    }

    fn release(&self) {
        if self.shared.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let live_players = self.live_players();
        self.shared
            .journal
            .record(Call::EngineReleased { live_players });
        if live_players > 0 {
            log::error!(
                "[sim] engine {} released while {} player(s) still alive",
                self.shared.id,
                live_players
            );
        }
        log::debug!("[sim] engine {} released", self.shared.id);
    }

    fn is_released(&self) -> bool {
        self.shared.released.load(Ordering::SeqCst)
    }
}

impl Drop for SimEngine {
    fn drop(&mut self) {
        if !self.is_released() {
            log::warn!("[sim] engine {} dropped without release", self.shared.id);
            self.release();
        }
    }
}
