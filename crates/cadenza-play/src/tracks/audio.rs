use std::sync::Arc;

use cadenza_events::AudioTrack;
use tracing::{debug, warn};

use crate::{error::TrackError, traits::delivery::DeliveryClient};

/// Alternate audio renditions of the current source.
///
/// A switch requested before a client is attached is remembered and
/// applied on [`AudioTrackSync::attach`].
#[derive(Default)]
pub struct AudioTrackSync {
    tracks: Vec<AudioTrack>,
    active: Option<String>,
    /// Set once the viewer picked a track; suppresses client defaults.
    explicit: bool,
    pending: Option<usize>,
    client: Option<Arc<dyn DeliveryClient>>,
}

impl std::fmt::Debug for AudioTrackSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioTrackSync")
            .field("tracks", &self.tracks.len())
            .field("active", &self.active)
            .field("pending", &self.pending)
            .field("attached", &self.client.is_some())
            .finish_non_exhaustive()
    }
}

impl AudioTrackSync {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, client: Arc<dyn DeliveryClient>) {
        if let Some(native) = self.pending.take() {
            debug!(native, "applying buffered audio track");
            client.set_audio_track(native);
        }
        self.client = Some(client);
        if !self.explicit {
            self.active = self.default_id();
        }
    }

    pub fn detach(&mut self) {
        self.client = None;
    }

    /// Replace the track list. The active track defaults to what the client
    /// reports as playing, or the first track.
    ///
    /// Returns `true` when the active id changed.
    pub fn load_tracks(&mut self, tracks: Vec<AudioTrack>) -> bool {
        let previous = self.active.take();
        self.tracks = tracks;
        self.explicit = false;
        self.pending = None;
        self.active = self.default_id();
        debug!(
            tracks = self.tracks.len(),
            active = ?self.active,
            "audio tracks loaded"
        );
        previous != self.active
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.active = None;
        self.explicit = false;
        self.pending = None;
    }

    /// Returns `Ok(false)` when `id` is already active.
    ///
    /// # Errors
    ///
    /// [`TrackError::UnknownTrack`] if no loaded track carries `id`.
    pub fn switch_track(&mut self, id: &str) -> Result<bool, TrackError> {
        let Some(track) = self.tracks.iter().find(|t| t.id == id) else {
            warn!(id, "audio track switch to unknown id");
            return Err(TrackError::UnknownTrack(id.to_string()));
        };
        if self.active.as_deref() == Some(id) {
            return Ok(false);
        }

        let native = track.native_index;
        match &self.client {
            Some(client) => client.set_audio_track(native),
            None => self.pending = Some(native),
        }
        debug!(id, native, "audio track switched");
        self.active = Some(id.to_string());
        self.explicit = true;
        Ok(true)
    }

    #[must_use]
    pub fn tracks(&self) -> &[AudioTrack] {
        &self.tracks
    }

    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    #[must_use]
    pub fn active_track(&self) -> Option<&AudioTrack> {
        let id = self.active.as_deref()?;
        self.tracks.iter().find(|t| t.id == id)
    }

    fn default_id(&self) -> Option<String> {
        let current = self.client.as_ref().and_then(|c| c.current_audio_track());
        current
            .and_then(|native| self.tracks.iter().find(|t| t.native_index == native))
            .or_else(|| self.tracks.first())
            .map(|t| t.id.clone())
    }
}
