#![forbid(unsafe_code)]

//! # Cadenza
//!
//! Facade crate for the adaptive playback control engine.
//!
//! ## Quick start
//!
//! ```
//! use std::time::Duration;
//!
//! use cadenza::prelude::*;
//!
//! let engine = PlaybackEngine::new(
//!     PlayerConfig::default()
//!         .with_locale("fr-CA")
//!         .with_abr(Bba2Options::default().with_min_dwell(Duration::from_secs(5))),
//! );
//! let mut events = engine.subscribe();
//! // attach a DeliveryClient and MediaSurface, then call `engine.tick()`
//! // from the host's buffer polling loop.
//! # let _ = &mut events;
//! ```

// ── Re-export sub-crates ────────────────────────────────────────────────

pub mod abr {
    pub use cadenza_abr::*;
}

pub mod events {
    pub use cadenza_events::*;
}

pub mod net {
    pub use cadenza_net::*;
}

pub mod play {
    pub use cadenza_play::*;
}

// ── Prelude ─────────────────────────────────────────────────────────────

pub mod prelude {
    pub use cadenza_abr::{AbrDecision, AbrMode, AbrReason, Bba2Options, QualityLevel, Zone};
    pub use cadenza_events::{
        AudioTrack, DeliveryEvent, ErrorRecord, ManifestParsed, SubtitleFormat, SubtitleTrack,
    };
    pub use cadenza_net::{HttpClient, Net, NetOptions};
    pub use cadenza_play::{
        AdmissionDenial, AdmissionRequest, DeliveryClient, LevelSelection, MediaSurface,
        PlaybackEngine, PlaybackSession, PlayerConfig, PlayerError, PlayerEvent, RetryOptions,
        SessionError, SessionManager, SessionOptions, Severity, format_bitrate, format_time,
    };
}
