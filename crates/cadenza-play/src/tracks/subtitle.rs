use std::sync::Arc;

use cadenza_events::SubtitleTrack;
use tracing::{debug, warn};

use crate::{
    error::TrackError,
    traits::surface::{MediaSurface, TextTrackMode},
};

/// Side-loaded subtitle tracks and the viewer's selection.
///
/// Safe to drive before a surface exists: tracks and the selection are
/// pushed to the surface on [`SubtitleSync::attach`].
pub struct SubtitleSync {
    locale: String,
    tracks: Vec<SubtitleTrack>,
    active: Option<String>,
    surface: Option<Arc<dyn MediaSurface>>,
}

impl std::fmt::Debug for SubtitleSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubtitleSync")
            .field("locale", &self.locale)
            .field("tracks", &self.tracks.len())
            .field("active", &self.active)
            .field("attached", &self.surface.is_some())
            .finish()
    }
}

impl SubtitleSync {
    /// `locale` is the viewer's language tag, e.g. `"fr-CA"`.
    #[must_use]
    pub fn new<S: Into<String>>(locale: S) -> Self {
        Self {
            locale: locale.into(),
            tracks: Vec::new(),
            active: None,
            surface: None,
        }
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Takes effect on the next [`SubtitleSync::load_tracks`].
    pub fn set_locale<S: Into<String>>(&mut self, locale: S) {
        self.locale = locale.into();
    }

    pub fn attach(&mut self, surface: Arc<dyn MediaSurface>) {
        self.surface = Some(surface);
        if !self.tracks.is_empty() {
            self.inject();
            self.apply();
        }
    }

    pub fn detach(&mut self) {
        if let Some(surface) = self.surface.take() {
            surface.remove_injected_tracks();
        }
    }

    /// Register `tracks` and auto-select the one matching the locale's
    /// language, leaving subtitles off when nothing matches.
    ///
    /// Returns the auto-selected id.
    pub fn load_tracks(&mut self, tracks: Vec<SubtitleTrack>) -> Option<&str> {
        self.tracks = tracks;
        let wanted = self.locale_language();
        self.active = self
            .tracks
            .iter()
            .find(|t| !wanted.is_empty() && t.primary_language() == wanted)
            .map(|t| t.id.clone());
        debug!(
            tracks = self.tracks.len(),
            locale = %self.locale,
            active = ?self.active,
            "subtitle tracks loaded"
        );

        if self.surface.is_some() {
            self.inject();
            self.apply();
        }
        self.active.as_deref()
    }

    /// Show the track with `id`, or turn subtitles off with `None`.
    ///
    /// # Errors
    ///
    /// [`TrackError::UnknownTrack`] if no loaded track carries `id`; the
    /// current selection is left untouched.
    pub fn switch_track(&mut self, id: Option<&str>) -> Result<(), TrackError> {
        if let Some(id) = id {
            if !self.tracks.iter().any(|t| t.id == id) {
                warn!(id, "subtitle switch to unknown id");
                return Err(TrackError::UnknownTrack(id.to_string()));
            }
        }
        self.active = id.map(str::to_string);
        debug!(active = ?self.active, "subtitle track switched");
        self.apply();
        Ok(())
    }

    #[must_use]
    pub fn tracks(&self) -> &[SubtitleTrack] {
        &self.tracks
    }

    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.active = None;
        if let Some(surface) = &self.surface {
            surface.remove_injected_tracks();
        }
    }

    fn locale_language(&self) -> String {
        self.locale
            .chars()
            .take(2)
            .collect::<String>()
            .to_ascii_lowercase()
    }

    fn inject(&self) {
        let Some(surface) = &self.surface else {
            return;
        };
        surface.remove_injected_tracks();
        for track in &self.tracks {
            surface.append_track(track);
        }
    }

    /// Disable every text track, then show the active one. Surface tracks
    /// are matched by label and language since they do not keep our ids.
    fn apply(&self) {
        let Some(surface) = &self.surface else {
            return;
        };

        let text_tracks = surface.text_tracks();
        for (index, info) in text_tracks.iter().enumerate() {
            if info.mode != TextTrackMode::Disabled {
                surface.set_text_track_mode(index, TextTrackMode::Disabled);
            }
        }

        let Some(active) = self
            .active
            .as_deref()
            .and_then(|id| self.tracks.iter().find(|t| t.id == id))
        else {
            return;
        };
        match text_tracks
            .iter()
            .position(|info| info.label == active.label && info.language == active.language)
        {
            Some(index) => surface.set_text_track_mode(index, TextTrackMode::Showing),
            None => warn!(id = %active.id, "active subtitle not present on surface"),
        }
    }
}

#[cfg(test)]
mod tests {
    use cadenza_events::SubtitleFormat;
    use rstest::rstest;

    use super::*;
    use crate::mock::FakeMediaSurface;

    fn track(id: &str, language: &str, label: &str) -> SubtitleTrack {
        SubtitleTrack {
            id: id.into(),
            language: language.into(),
            label: label.into(),
            url: format!("https://cdn.example/subs/{id}.vtt"),
            format: SubtitleFormat::WebVtt,
        }
    }

    fn tracks() -> Vec<SubtitleTrack> {
        vec![
            track("s-en", "en-US", "English"),
            track("s-fr", "fr-FR", "Français"),
            track("s-es", "es", "Español"),
        ]
    }

    fn showing(surface: &FakeMediaSurface) -> Vec<String> {
        surface.showing().into_iter().map(|(label, _)| label).collect()
    }

    #[rstest]
    #[case("fr-CA", Some("s-fr"))]
    #[case("en", Some("s-en"))]
    #[case("ES-mx", Some("s-es"))]
    #[case("ja-JP", None)]
    #[case("", None)]
    fn auto_selects_by_locale(#[case] locale: &str, #[case] expected: Option<&str>) {
        let mut sync = SubtitleSync::new(locale);
        assert_eq!(sync.load_tracks(tracks()), expected);
    }

    #[test]
    fn load_injects_and_shows_match() {
        let surface = Arc::new(FakeMediaSurface::new());
        let mut sync = SubtitleSync::new("fr-FR");
        sync.attach(surface.clone());
        sync.load_tracks(tracks());

        assert_eq!(surface.injected_count(), 3);
        assert_eq!(showing(&surface), vec!["Français".to_string()]);
    }

    #[test]
    fn reload_does_not_duplicate_tracks() {
        let surface = Arc::new(FakeMediaSurface::new());
        let mut sync = SubtitleSync::new("en-US");
        sync.attach(surface.clone());
        sync.load_tracks(tracks());
        sync.load_tracks(tracks());

        assert_eq!(surface.injected_count(), 3);
        assert_eq!(surface.append_calls(), 6);
    }

    #[test]
    fn switch_disables_others_and_matches_label_language() {
        let surface = Arc::new(
            FakeMediaSurface::new().with_native_track("Captions", "en", TextTrackMode::Showing),
        );
        let mut sync = SubtitleSync::new("en-US");
        sync.attach(surface.clone());
        sync.load_tracks(tracks());
        assert_eq!(showing(&surface), vec!["English".to_string()]);

        sync.switch_track(Some("s-es")).unwrap();
        assert_eq!(showing(&surface), vec!["Español".to_string()]);
        assert_eq!(sync.active_id(), Some("s-es"));
    }

    #[test]
    fn switch_to_none_turns_everything_off() {
        let surface = Arc::new(FakeMediaSurface::new());
        let mut sync = SubtitleSync::new("en-US");
        sync.attach(surface.clone());
        sync.load_tracks(tracks());

        sync.switch_track(None).unwrap();
        assert!(surface.showing().is_empty());
        assert!(sync.active_id().is_none());
    }

    #[test]
    fn unknown_id_leaves_selection() {
        let mut sync = SubtitleSync::new("en-US");
        sync.load_tracks(tracks());
        assert_eq!(
            sync.switch_track(Some("s-xx")),
            Err(TrackError::UnknownTrack("s-xx".into()))
        );
        assert_eq!(sync.active_id(), Some("s-en"));
    }

    #[test]
    fn state_is_buffered_until_surface_attaches() {
        let mut sync = SubtitleSync::new("en-US");
        sync.load_tracks(tracks());
        sync.switch_track(Some("s-fr")).unwrap();

        let surface = Arc::new(FakeMediaSurface::new());
        sync.attach(surface.clone());
        assert_eq!(surface.injected_count(), 3);
        assert_eq!(showing(&surface), vec!["Français".to_string()]);
    }

    #[test]
    fn detach_removes_injected_tracks() {
        let surface = Arc::new(FakeMediaSurface::new());
        let mut sync = SubtitleSync::new("en-US");
        sync.attach(surface.clone());
        sync.load_tracks(tracks());
        sync.detach();
        assert_eq!(surface.injected_count(), 0);
    }
}
