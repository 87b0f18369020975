//! Delivery error classification and per-source retry bookkeeping.

use std::collections::HashMap;

use cadenza_events::{ErrorRecord, details, kinds};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Playback can continue after the retry succeeds.
    Recoverable,
    /// Playback of the current source cannot continue.
    Fatal,
}

/// Classified delivery error, ready for display and retry decisions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerError {
    pub kind: String,
    pub severity: Severity,
    pub message: String,
    pub retryable: bool,
    pub details: String,
}

impl PlayerError {
    /// Counter key: `kind:details`.
    #[must_use]
    pub fn retry_key(&self) -> String {
        format!("{}:{}", self.kind, self.details)
    }

    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

#[derive(Clone, Debug)]
pub struct RetryOptions {
    /// Attempts allowed per error key before `should_retry` answers false.
    pub max_retries: u32,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

impl RetryOptions {
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Maps raw delivery error records to [`PlayerError`]s and tracks retry
/// attempts per `kind:details` key.
///
/// Counters are scoped to one source: call [`reset_retries`] on recovery or
/// when a new source is loaded.
///
/// [`reset_retries`]: ErrorClassifier::reset_retries
#[derive(Debug, Default)]
pub struct ErrorClassifier {
    options: RetryOptions,
    attempts: HashMap<String, u32>,
}

impl ErrorClassifier {
    #[must_use]
    pub fn new(options: RetryOptions) -> Self {
        Self {
            options,
            attempts: HashMap::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    #[must_use]
    pub fn classify(&self, record: &ErrorRecord) -> PlayerError {
        let (severity, retryable, message) =
            match (record.kind.as_str(), record.details.as_str()) {
                (kinds::NETWORK_ERROR, details::MANIFEST_LOAD_ERROR) => (
                    Severity::Fatal,
                    true,
                    "Failed to load the stream manifest",
                ),
                (kinds::NETWORK_ERROR, details::FRAG_LOAD_ERROR) => (
                    Severity::Recoverable,
                    true,
                    "Failed to load a media segment",
                ),
                (kinds::MEDIA_ERROR, details::BUFFER_STALLED_ERROR) => (
                    Severity::Recoverable,
                    true,
                    "Playback stalled while buffering",
                ),
                (
                    kinds::MEDIA_ERROR,
                    details::BUFFER_APPEND_ERROR | details::BUFFER_ADD_CODEC_ERROR,
                ) => (
                    Severity::Fatal,
                    false,
                    "This stream uses a format the player cannot decode",
                ),
                (kinds::MEDIA_ERROR, details::FRAG_PARSING_ERROR) | (kinds::MUX_ERROR, _) => (
                    Severity::Fatal,
                    false,
                    "The media stream is corrupted",
                ),
                _ => {
                    let severity = if record.fatal {
                        Severity::Fatal
                    } else {
                        Severity::Recoverable
                    };
                    (severity, true, "A playback error occurred")
                }
            };

        let error = PlayerError {
            kind: record.kind.clone(),
            severity,
            message: message.to_string(),
            retryable,
            details: record.details.clone(),
        };
        debug!(
            kind = %error.kind,
            details = %error.details,
            ?severity,
            retryable,
            "delivery error classified"
        );
        error
    }

    /// `false` for non-retryable errors and once the key's attempts reach
    /// the ceiling.
    #[must_use]
    pub fn should_retry(&self, error: &PlayerError) -> bool {
        if !error.retryable {
            return false;
        }
        let attempts = self.attempts(error);
        let verdict = attempts < self.options.max_retries;
        debug!(
            key = %error.retry_key(),
            attempts,
            max = self.options.max_retries,
            verdict,
            "retry verdict"
        );
        verdict
    }

    pub fn record_retry(&mut self, error: &PlayerError) {
        *self.attempts.entry(error.retry_key()).or_insert(0) += 1;
    }

    #[must_use]
    pub fn attempts(&self, error: &PlayerError) -> u32 {
        self.attempts.get(&error.retry_key()).copied().unwrap_or(0)
    }

    pub fn reset_retries(&mut self) {
        if !self.attempts.is_empty() {
            debug!(keys = self.attempts.len(), "retry counters reset");
        }
        self.attempts.clear();
    }
}
