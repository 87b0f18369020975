use cadenza_abr::AbrReason;

use crate::classifier::PlayerError;

/// Notifications published by the playback core.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum PlayerEvent {
    QualityChanged {
        from: usize,
        to: usize,
        reason: AbrReason,
    },
    /// A quality pin was released after repeated stalls.
    AutoModeRestored {
        stalls: u32,
    },
    Error(PlayerError),
    AudioTrackChanged {
        id: String,
    },
    SubtitleTrackChanged {
        id: Option<String>,
    },
    SessionStarted {
        session_id: String,
        media_id: String,
    },
    SessionEnded {
        session_id: String,
    },
}

impl From<PlayerError> for PlayerEvent {
    fn from(error: PlayerError) -> Self {
        Self::Error(error)
    }
}
