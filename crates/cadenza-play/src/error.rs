use cadenza_net::NetError;

/// Why the admission service refused a playback session.
///
/// `Display` renders text meant to be shown to the viewer as-is.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum AdmissionDenial {
    #[error("Your sign-in has expired. Please sign in again.")]
    Unauthorized,

    #[error("{message}")]
    PolicyDenied { message: String },

    #[error("Too many streams are playing at once. Stop playback on another device and try again.")]
    ConcurrencyLimit,

    #[error("Too many devices are registered to this account. Remove a device and try again.")]
    DeviceLimit,

    #[error("The playback service is temporarily unavailable. Please try again shortly.")]
    ServerError,

    #[error("Playback could not be started: {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Denied(#[from] AdmissionDenial),

    #[error("session request failed: {0}")]
    Net(#[from] NetError),

    #[error("invalid admission response: {0}")]
    InvalidResponse(String),

    /// The session was ended or torn down while the request was in flight.
    #[error("session request cancelled")]
    Cancelled,

    #[error("no active session")]
    NoActiveSession,
}

impl SessionError {
    #[must_use]
    pub fn denial(&self) -> Option<&AdmissionDenial> {
        match self {
            Self::Denied(denial) => Some(denial),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum TrackError {
    #[error("unknown track: {0}")]
    UnknownTrack(String),
}
