//! Mock APIs and in-memory fakes for the delivery client and media surface.

use cadenza_events::{DeliveryEvent, ListenerRegistry, SubtitleTrack};
use parking_lot::Mutex;

pub use crate::traits::{delivery::DeliveryClientMock, surface::MediaSurfaceMock};
use crate::traits::{
    delivery::{DeliveryClient, LevelSelection},
    surface::{MediaSurface, TextTrackInfo, TextTrackMode},
};

#[derive(Debug, Default)]
struct ClientState {
    buffer_length: f64,
    seeking: bool,
    applied_levels: Vec<LevelSelection>,
    audio_track: Option<usize>,
    applied_audio: Vec<usize>,
    switch_events: bool,
}

/// Scriptable delivery client.
///
/// Tests set the buffer/seek readings and push [`DeliveryEvent`]s; every
/// level and audio track request is recorded.
#[derive(Debug, Default)]
pub struct FakeDeliveryClient {
    state: Mutex<ClientState>,
    events: ListenerRegistry<DeliveryEvent>,
}

impl FakeDeliveryClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `LevelSwitched` from inside `set_current_level`, like a real
    /// client that switches synchronously.
    #[must_use]
    pub fn with_switch_events(self) -> Self {
        self.state.lock().switch_events = true;
        self
    }

    #[must_use]
    pub fn with_audio_track(self, native_index: usize) -> Self {
        self.state.lock().audio_track = Some(native_index);
        self
    }

    pub fn set_buffer_length(&self, secs: f64) {
        self.state.lock().buffer_length = secs;
    }

    pub fn set_seeking(&self, seeking: bool) {
        self.state.lock().seeking = seeking;
    }

    pub fn emit<E: Into<DeliveryEvent>>(&self, event: E) {
        self.events.emit(&event.into());
    }

    #[must_use]
    pub fn applied_levels(&self) -> Vec<LevelSelection> {
        self.state.lock().applied_levels.clone()
    }

    #[must_use]
    pub fn applied_audio_tracks(&self) -> Vec<usize> {
        self.state.lock().applied_audio.clone()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.events.len()
    }
}

impl DeliveryClient for FakeDeliveryClient {
    fn buffer_length(&self) -> f64 {
        self.state.lock().buffer_length
    }

    fn is_seeking(&self) -> bool {
        self.state.lock().seeking
    }

    fn set_current_level(&self, level: LevelSelection) {
        let emit = {
            let mut state = self.state.lock();
            state.applied_levels.push(level);
            state.switch_events
        };
        if let (true, LevelSelection::Fixed(level)) = (emit, level) {
            self.events.emit(&DeliveryEvent::LevelSwitched { level });
        }
    }

    fn current_audio_track(&self) -> Option<usize> {
        self.state.lock().audio_track
    }

    fn set_audio_track(&self, native_index: usize) {
        let mut state = self.state.lock();
        state.audio_track = Some(native_index);
        state.applied_audio.push(native_index);
    }

    fn events(&self) -> ListenerRegistry<DeliveryEvent> {
        self.events.clone()
    }
}

#[derive(Clone, Debug)]
struct SurfaceTrack {
    info: TextTrackInfo,
    injected: bool,
}

/// In-memory media surface with an ordered text track list.
#[derive(Debug, Default)]
pub struct FakeMediaSurface {
    tracks: Mutex<Vec<SurfaceTrack>>,
    appended: Mutex<usize>,
}

impl FakeMediaSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track that came with the media itself and is never removed.
    #[must_use]
    pub fn with_native_track(self, label: &str, language: &str, mode: TextTrackMode) -> Self {
        self.tracks.lock().push(SurfaceTrack {
            info: TextTrackInfo {
                label: label.to_string(),
                language: language.to_string(),
                mode,
            },
            injected: false,
        });
        self
    }

    /// `(label, language)` of every track currently showing.
    #[must_use]
    pub fn showing(&self) -> Vec<(String, String)> {
        self.tracks
            .lock()
            .iter()
            .filter(|t| t.info.mode == TextTrackMode::Showing)
            .map(|t| (t.info.label.clone(), t.info.language.clone()))
            .collect()
    }

    #[must_use]
    pub fn injected_count(&self) -> usize {
        self.tracks.lock().iter().filter(|t| t.injected).count()
    }

    /// Total `append_track` calls over the surface's lifetime.
    #[must_use]
    pub fn append_calls(&self) -> usize {
        *self.appended.lock()
    }
}

impl MediaSurface for FakeMediaSurface {
    fn text_tracks(&self) -> Vec<TextTrackInfo> {
        self.tracks.lock().iter().map(|t| t.info.clone()).collect()
    }

    fn set_text_track_mode(&self, index: usize, mode: TextTrackMode) {
        if let Some(track) = self.tracks.lock().get_mut(index) {
            track.info.mode = mode;
        }
    }

    fn append_track(&self, track: &SubtitleTrack) {
        *self.appended.lock() += 1;
        self.tracks.lock().push(SurfaceTrack {
            info: TextTrackInfo {
                label: track.label.clone(),
                language: track.language.clone(),
                mode: TextTrackMode::Disabled,
            },
            injected: true,
        });
    }

    fn remove_injected_tracks(&self) {
        self.tracks.lock().retain(|t| !t.injected);
    }
}
