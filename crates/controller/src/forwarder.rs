// Forwards player events to the diagnostic log

use playsample_core::{
    Diagnostic, DiagnosticLog, PlayerEvent, PlayerListener, WeakPlayerHandle,
};

/// Registered on the player it observes, so it only holds a weak reference back
pub(crate) struct DiagnosticForwarder {
    player: WeakPlayerHandle,
    diagnostics: DiagnosticLog,
}

impl DiagnosticForwarder {
    pub(crate) fn new(player: WeakPlayerHandle, diagnostics: DiagnosticLog) -> Self {
        Self {
            player,
            diagnostics,
        }
    }
}

impl PlayerListener for DiagnosticForwarder {
    fn on_event(&self, event: &PlayerEvent) {
        let diagnostic = match event {
            PlayerEvent::Playing => Diagnostic::Playing {
                volume: self.player.upgrade().map(|player| player.volume()),
            },
            PlayerEvent::VolumeChanged { volume } => Diagnostic::VolumeChanged { volume: *volume },
            PlayerEvent::Muted => Diagnostic::Muted,
            PlayerEvent::Unmuted => Diagnostic::Unmuted,
            PlayerEvent::Paused => Diagnostic::Paused,
            PlayerEvent::Stopped => Diagnostic::Stopped,
            PlayerEvent::EndReached => Diagnostic::EndReached,
            PlayerEvent::EncounteredError { message } => Diagnostic::PlayerError {
                message: message.clone(),
            },
            PlayerEvent::Opening => {
                log::trace!("Player opening media");
                return;
            }
        };
        self.diagnostics.emit(diagnostic);
    }
}
