use cadenza_abr::{Bba2Options, DEFAULT_STALL_THRESHOLD};

use crate::classifier::RetryOptions;

/// Construction-time settings for a [`PlaybackEngine`](crate::PlaybackEngine).
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub abr: Bba2Options,
    pub retry: RetryOptions,
    /// Stalls tolerated at a pinned quality before reverting to auto.
    pub stall_threshold: u32,
    /// Viewer language tag used for subtitle auto-selection.
    pub locale: String,
    pub event_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            abr: Bba2Options::default(),
            retry: RetryOptions::default(),
            stall_threshold: DEFAULT_STALL_THRESHOLD,
            locale: "en-US".to_string(),
            event_capacity: 64,
        }
    }
}

impl PlayerConfig {
    #[must_use]
    pub fn with_abr(mut self, abr: Bba2Options) -> Self {
        self.abr = abr;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_stall_threshold(mut self, threshold: u32) -> Self {
        self.stall_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_locale<S: Into<String>>(mut self, locale: S) -> Self {
        self.locale = locale.into();
        self
    }

    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}
