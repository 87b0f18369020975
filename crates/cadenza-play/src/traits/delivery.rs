use cadenza_events::{DeliveryEvent, ListenerRegistry};

/// Level request understood by the delivery client.
///
/// Natively encoded as an index where `-1` means automatic selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LevelSelection {
    #[default]
    Auto,
    Fixed(usize),
}

/// Segmented-media delivery client driven by the playback core.
///
/// Calls are synchronous. Implementations may emit events from inside a
/// setter; listeners must not assume they run outside of one.
#[cfg_attr(
    any(test, feature = "test-utils"),
    unimock::unimock(api = DeliveryClientMock)
)]
pub trait DeliveryClient: Send + Sync + 'static {
    /// Seconds of media buffered ahead of the playhead.
    fn buffer_length(&self) -> f64;

    fn is_seeking(&self) -> bool;

    fn set_current_level(&self, level: LevelSelection);

    /// Native index of the playing audio rendition, if the client knows it.
    fn current_audio_track(&self) -> Option<usize>;

    fn set_audio_track(&self, native_index: usize);

    /// Registry the client emits [`DeliveryEvent`]s on.
    fn events(&self) -> ListenerRegistry<DeliveryEvent>;
}
