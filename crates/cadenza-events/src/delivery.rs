#![forbid(unsafe_code)]

use cadenza_abr::QualityLevel;

use crate::AudioTrack;

/// Error categories reported by the delivery client.
pub mod kinds {
    pub const NETWORK_ERROR: &str = "networkError";
    pub const MEDIA_ERROR: &str = "mediaError";
    pub const MUX_ERROR: &str = "muxError";
    pub const OTHER_ERROR: &str = "otherError";
}

/// Error sub-details reported by the delivery client.
pub mod details {
    pub const MANIFEST_LOAD_ERROR: &str = "manifestLoadError";
    pub const FRAG_LOAD_ERROR: &str = "fragLoadError";
    pub const FRAG_LOAD_TIMEOUT: &str = "fragLoadTimeOut";
    pub const BUFFER_STALLED_ERROR: &str = "bufferStalledError";
    pub const BUFFER_APPEND_ERROR: &str = "bufferAppendError";
    pub const BUFFER_ADD_CODEC_ERROR: &str = "bufferAddCodecError";
    pub const FRAG_PARSING_ERROR: &str = "fragParsingError";
    pub const REMUX_ALLOC_ERROR: &str = "remuxAllocError";
}

/// Raw error signal as emitted by the delivery client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorRecord {
    pub kind: String,
    pub details: String,
    pub fatal: bool,
}

impl ErrorRecord {
    #[must_use]
    pub fn new<K: Into<String>, D: Into<String>>(kind: K, details: D, fatal: bool) -> Self {
        Self {
            kind: kind.into(),
            details: details.into(),
            fatal,
        }
    }

    /// The media element ran out of buffered data during playback.
    #[must_use]
    pub fn stall() -> Self {
        Self::new(kinds::MEDIA_ERROR, details::BUFFER_STALLED_ERROR, false)
    }

    #[must_use]
    pub fn is_stall(&self) -> bool {
        self.details == details::BUFFER_STALLED_ERROR
    }
}

/// Manifest metadata available once the master playlist is parsed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManifestParsed {
    pub levels: Vec<QualityLevel>,
    pub audio_tracks: Vec<AudioTrack>,
}

/// Events emitted by the delivery client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryEvent {
    Error(ErrorRecord),
    ManifestParsed(ManifestParsed),
    /// Playback switched to a new quality level.
    LevelSwitched { level: usize },
    /// The client's audio track list changed (e.g. alternate renditions loaded).
    AudioTracksUpdated { tracks: Vec<AudioTrack> },
}

impl From<ErrorRecord> for DeliveryEvent {
    fn from(record: ErrorRecord) -> Self {
        Self::Error(record)
    }
}

impl From<ManifestParsed> for DeliveryEvent {
    fn from(manifest: ManifestParsed) -> Self {
        Self::ManifestParsed(manifest)
    }
}
