use cadenza_events::SubtitleTrack;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextTrackMode {
    Showing,
    Hidden,
    #[default]
    Disabled,
}

/// Snapshot of one text track registered on the media surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextTrackInfo {
    pub label: String,
    pub language: String,
    pub mode: TextTrackMode,
}

/// Media element the subtitles are rendered on.
///
/// Text tracks are addressed by position in [`MediaSurface::text_tracks`];
/// the surface does not preserve the ids of appended descriptors.
#[cfg_attr(
    any(test, feature = "test-utils"),
    unimock::unimock(api = MediaSurfaceMock)
)]
pub trait MediaSurface: Send + Sync + 'static {
    fn text_tracks(&self) -> Vec<TextTrackInfo>;

    fn set_text_track_mode(&self, index: usize, mode: TextTrackMode);

    /// Register a side-loaded track. Appended tracks start disabled.
    fn append_track(&self, track: &SubtitleTrack);

    /// Drop every track previously added through `append_track`.
    fn remove_injected_tracks(&self);
}
