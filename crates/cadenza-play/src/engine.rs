//! Composition of classifier, quality control and track sync for one player.

use std::{collections::VecDeque, sync::Arc};

use cadenza_abr::{AbrDecision, AbrMode, AbrReason, QualityLevel, StallVerdict};
use cadenza_events::{
    AudioTrack, DeliveryEvent, ErrorRecord, EventBus, ManifestParsed, SubtitleTrack, Subscription,
};
use cadenza_net::Net;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, trace};
use web_time::Instant;

use crate::{
    classifier::{ErrorClassifier, PlayerError},
    config::PlayerConfig,
    error::TrackError,
    events::PlayerEvent,
    quality::QualityController,
    session::{SessionManager, SessionOptions},
    tracks::{AudioTrackSync, SubtitleSync},
    traits::{delivery::DeliveryClient, surface::MediaSurface},
};

struct Attached {
    _subscription: Subscription,
}

struct EngineState {
    classifier: ErrorClassifier,
    quality: QualityController,
    audio: AudioTrackSync,
    subtitles: SubtitleSync,
    stall_threshold: u32,
    online: bool,
    playing_level: Option<usize>,
    client: Option<Attached>,
}

impl EngineState {
    fn handle(&mut self, event: DeliveryEvent, bus: &EventBus<PlayerEvent>) {
        match event {
            DeliveryEvent::Error(record) => self.on_error(&record, bus),
            DeliveryEvent::ManifestParsed(manifest) => self.on_manifest(manifest, bus),
            DeliveryEvent::LevelSwitched { level } => {
                trace!(level, "delivery client switched level");
                self.playing_level = Some(level);
            }
            DeliveryEvent::AudioTracksUpdated { tracks } => self.load_audio(tracks, bus),
        }
    }

    fn on_error(&mut self, record: &ErrorRecord, bus: &EventBus<PlayerEvent>) {
        let error = self.classifier.classify(record);
        if self.quality.on_error(record) == StallVerdict::Reverted {
            bus.publish(PlayerEvent::AutoModeRestored {
                stalls: self.stall_threshold,
            });
        }
        bus.publish(error);
    }

    fn on_manifest(&mut self, manifest: ManifestParsed, bus: &EventBus<PlayerEvent>) {
        info!(
            levels = manifest.levels.len(),
            audio_tracks = manifest.audio_tracks.len(),
            "manifest parsed"
        );
        self.classifier.reset_retries();
        self.playing_level = None;
        self.quality.load_levels(manifest.levels, Instant::now());
        self.load_audio(manifest.audio_tracks, bus);
    }

    fn load_audio(&mut self, tracks: Vec<AudioTrack>, bus: &EventBus<PlayerEvent>) {
        if self.audio.load_tracks(tracks) {
            if let Some(id) = self.audio.active_id() {
                bus.publish(PlayerEvent::AudioTrackChanged { id: id.to_string() });
            }
        }
    }
}

struct Core {
    state: Mutex<EngineState>,
    /// Delivery events waiting for the state lock.
    pending: Mutex<VecDeque<DeliveryEvent>>,
    bus: EventBus<PlayerEvent>,
}

impl Core {
    fn enqueue(&self, event: DeliveryEvent) {
        self.pending.lock().push_back(event);
        self.drain();
    }

    /// Process queued events unless another caller holds the state; that
    /// caller drains after releasing it. Clients may emit from inside a
    /// setter we invoked, so this must never block on the state lock.
    fn drain(&self) {
        loop {
            {
                let Some(mut state) = self.state.try_lock() else {
                    return;
                };
                loop {
                    let Some(event) = self.pending.lock().pop_front() else {
                        break;
                    };
                    state.handle(event, &self.bus);
                }
            }
            if self.pending.lock().is_empty() {
                return;
            }
        }
    }
}

/// Playback control for one player instance.
///
/// Delivery client and media surface are attached explicitly; everything
/// that needs them is absorbed or buffered until then.
pub struct PlaybackEngine {
    core: Arc<Core>,
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine").finish_non_exhaustive()
    }
}

impl PlaybackEngine {
    #[must_use]
    pub fn new(config: PlayerConfig) -> Self {
        let state = EngineState {
            classifier: ErrorClassifier::new(config.retry),
            quality: QualityController::new(config.abr, config.stall_threshold),
            audio: AudioTrackSync::new(),
            subtitles: SubtitleSync::new(config.locale),
            stall_threshold: config.stall_threshold.max(1),
            online: true,
            playing_level: None,
            client: None,
        };
        Self {
            core: Arc::new(Core {
                state: Mutex::new(state),
                pending: Mutex::new(VecDeque::new()),
                bus: EventBus::new(config.event_capacity),
            }),
        }
    }

    #[must_use]
    pub fn events(&self) -> &EventBus<PlayerEvent> {
        &self.core.bus
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.core.bus.subscribe()
    }

    /// Session manager publishing on this engine's event bus.
    #[must_use]
    pub fn session_manager(&self, net: Arc<dyn Net>, options: SessionOptions) -> SessionManager {
        SessionManager::new(net, options).with_events(self.core.bus.clone())
    }

    /// Every state access goes through here so events queued while the
    /// lock was held are handled once it is released.
    fn with_state<R>(&self, f: impl FnOnce(&mut EngineState, &EventBus<PlayerEvent>) -> R) -> R {
        let result = {
            let mut state = self.core.state.lock();
            f(&mut state, &self.core.bus)
        };
        self.core.drain();
        result
    }

    fn read<R>(&self, f: impl FnOnce(&EngineState) -> R) -> R {
        self.with_state(|state, _| f(state))
    }

    // -- attachment --

    /// Start listening to `client` and route quality/audio requests to it.
    /// Replaces any previously attached client.
    pub fn attach_client(&self, client: Arc<dyn DeliveryClient>) {
        let core = Arc::downgrade(&self.core);
        let subscription = client.events().subscribe(move |event: &DeliveryEvent| {
            if let Some(core) = core.upgrade() {
                core.enqueue(event.clone());
            }
        });

        self.with_state(|state, _| {
            state.quality.attach(Arc::clone(&client));
            state.audio.attach(client);
            state.client = Some(Attached {
                _subscription: subscription,
            });
        });
        debug!("delivery client attached");
    }

    pub fn detach_client(&self) {
        self.with_state(|state, _| {
            state.client = None;
            state.quality.detach();
            state.audio.detach();
        });
        self.core.pending.lock().clear();
        debug!("delivery client detached");
    }

    pub fn attach_surface(&self, surface: Arc<dyn MediaSurface>) {
        self.with_state(|state, _| state.subtitles.attach(surface));
    }

    pub fn detach_surface(&self) {
        self.with_state(|state, _| state.subtitles.detach());
    }

    // -- quality --

    /// One BBA-2 step, normally driven by the host's buffer polling.
    pub fn tick(&self) -> Option<AbrDecision> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&self, now: Instant) -> Option<AbrDecision> {
        self.with_state(|state, bus| {
            let from = state.quality.current_level();
            let decision = state.quality.tick(now)?;
            if decision.changed {
                bus.publish(PlayerEvent::QualityChanged {
                    from,
                    to: decision.target_level,
                    reason: decision.reason,
                });
            }
            Some(decision)
        })
    }

    /// Pin a quality level or return to automatic selection.
    ///
    /// Absorbed (returns `false`) while no delivery client is attached.
    pub fn select_quality(&self, mode: AbrMode) -> bool {
        self.with_state(|state, bus| {
            let from = state.quality.current_level();
            if !state.quality.select_quality(mode, Instant::now()) {
                return false;
            }
            let to = state.quality.current_level();
            if to != from {
                bus.publish(PlayerEvent::QualityChanged {
                    from,
                    to,
                    reason: AbrReason::Manual,
                });
            }
            true
        })
    }

    #[must_use]
    pub fn is_auto_mode(&self) -> bool {
        self.read(|state| state.quality.is_auto_mode())
    }

    #[must_use]
    pub fn quality_mode(&self) -> AbrMode {
        self.read(|state| state.quality.mode())
    }

    #[must_use]
    pub fn current_level(&self) -> usize {
        self.read(|state| state.quality.current_level())
    }

    /// Level the delivery client last reported switching to.
    #[must_use]
    pub fn playing_level(&self) -> Option<usize> {
        self.read(|state| state.playing_level)
    }

    #[must_use]
    pub fn levels(&self) -> Vec<QualityLevel> {
        self.read(|state| state.quality.levels().to_vec())
    }

    // -- tracks --

    #[must_use]
    pub fn audio_tracks(&self) -> Vec<AudioTrack> {
        self.read(|state| state.audio.tracks().to_vec())
    }

    #[must_use]
    pub fn active_audio_track(&self) -> Option<String> {
        self.read(|state| state.audio.active_id().map(str::to_string))
    }

    /// # Errors
    ///
    /// [`TrackError::UnknownTrack`] if `id` is not in the current list.
    pub fn switch_audio_track(&self, id: &str) -> Result<(), TrackError> {
        self.with_state(|state, bus| {
            if state.audio.switch_track(id)? {
                bus.publish(PlayerEvent::AudioTrackChanged { id: id.to_string() });
            }
            Ok(())
        })
    }

    /// Register side-loaded subtitles; returns the locale-matched selection.
    pub fn load_subtitles(&self, tracks: Vec<SubtitleTrack>) -> Option<String> {
        self.with_state(|state, bus| {
            let previous = state.subtitles.active_id().map(str::to_string);
            let active = state.subtitles.load_tracks(tracks).map(str::to_string);
            if active != previous {
                bus.publish(PlayerEvent::SubtitleTrackChanged { id: active.clone() });
            }
            active
        })
    }

    #[must_use]
    pub fn subtitle_tracks(&self) -> Vec<SubtitleTrack> {
        self.read(|state| state.subtitles.tracks().to_vec())
    }

    #[must_use]
    pub fn active_subtitle(&self) -> Option<String> {
        self.read(|state| state.subtitles.active_id().map(str::to_string))
    }

    /// # Errors
    ///
    /// [`TrackError::UnknownTrack`] if `id` is not in the current list.
    pub fn switch_subtitle(&self, id: Option<&str>) -> Result<(), TrackError> {
        self.with_state(|state, bus| {
            let changed = state.subtitles.active_id() != id;
            state.subtitles.switch_track(id)?;
            if changed {
                bus.publish(PlayerEvent::SubtitleTrackChanged {
                    id: id.map(str::to_string),
                });
            }
            Ok(())
        })
    }

    /// Applies to the next subtitle load.
    pub fn set_locale<S: Into<String>>(&self, locale: S) {
        let locale = locale.into();
        self.with_state(|state, _| state.subtitles.set_locale(locale));
    }

    // -- errors and retries --

    #[must_use]
    pub fn classify(&self, record: &ErrorRecord) -> PlayerError {
        self.read(|state| state.classifier.classify(record))
    }

    /// Counter-gated retry verdict; always `false` while offline.
    #[must_use]
    pub fn should_retry(&self, error: &PlayerError) -> bool {
        self.read(|state| {
            if !state.online {
                debug!(key = %error.retry_key(), "retry suppressed while offline");
                return false;
            }
            state.classifier.should_retry(error)
        })
    }

    pub fn record_retry(&self, error: &PlayerError) {
        self.with_state(|state, _| state.classifier.record_retry(error));
    }

    #[must_use]
    pub fn retry_attempts(&self, error: &PlayerError) -> u32 {
        self.read(|state| state.classifier.attempts(error))
    }

    /// Call once playback has fully recovered.
    pub fn reset_retries(&self) {
        self.with_state(|state, _| state.classifier.reset_retries());
    }

    pub fn set_online(&self, online: bool) {
        self.with_state(|state, _| {
            if state.online != online {
                info!(online, "network state changed");
            }
            state.online = online;
        });
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.read(|state| state.online)
    }
}
