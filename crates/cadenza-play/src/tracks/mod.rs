mod audio;
mod subtitle;

pub use audio::AudioTrackSync;
pub use subtitle::SubtitleSync;
