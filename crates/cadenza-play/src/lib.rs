#![forbid(unsafe_code)]

//! Adaptive playback control.
//!
//! [`PlaybackEngine`] ties together delivery error classification,
//! buffer-based quality selection with a manual override, and audio and
//! subtitle track sync for one player instance. [`SessionManager`] runs
//! the admission, heartbeat and teardown lifecycle of a playback session.
//!
//! ```
//! use cadenza_play::{PlaybackEngine, PlayerConfig, format_time};
//!
//! let engine = PlaybackEngine::new(PlayerConfig::default());
//! assert!(engine.is_auto_mode());
//! assert_eq!(format_time(3661.0), "1:01:01");
//! ```

mod classifier;
mod config;
mod engine;
mod error;
mod events;
mod quality;
mod session;
mod time;
mod tracks;

pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use classifier::{ErrorClassifier, PlayerError, RetryOptions, Severity};
pub use config::PlayerConfig;
pub use engine::PlaybackEngine;
pub use error::{AdmissionDenial, SessionError, TrackError};
pub use events::PlayerEvent;
pub use quality::QualityController;
pub use session::{
    AdmissionRequest, HeartbeatHandle, MIN_HEARTBEAT_INTERVAL, PlaybackSession, SessionManager,
    SessionOptions, SessionPhase,
};
pub use time::{format_bitrate, format_time, parse_time, time_to_percent};
pub use tracks::{AudioTrackSync, SubtitleSync};
pub use traits::{
    delivery::{DeliveryClient, LevelSelection},
    surface::{MediaSurface, TextTrackInfo, TextTrackMode},
};
