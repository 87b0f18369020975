#![forbid(unsafe_code)]

/// Alternate audio rendition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioTrack {
    pub id: String,
    /// Position in the delivery client's own track list.
    pub native_index: usize,
    /// BCP-47 tag, e.g. `en-US`.
    pub language: String,
    pub label: String,
    pub codec: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubtitleFormat {
    #[default]
    WebVtt,
    Srt,
}

/// Side-loaded text track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub id: String,
    /// BCP-47 tag, e.g. `fr-CA`.
    pub language: String,
    pub label: String,
    pub url: String,
    pub format: SubtitleFormat,
}

impl SubtitleTrack {
    /// Primary language subtag in lowercase (`"pt"` for `"pt-BR"`).
    #[must_use]
    pub fn primary_language(&self) -> String {
        primary_subtag(&self.language)
    }
}

fn primary_subtag(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}
