//! Admission, heartbeat and teardown of a playback session.

mod admission;
mod heartbeat;

use std::{sync::Arc, time::Duration};

pub use admission::AdmissionRequest;
use admission::{GrantEnvelope, denial_for};
use cadenza_events::EventBus;
use cadenza_net::{Headers, Net, NetError};
use chrono::{DateTime, Utc};
pub use heartbeat::{HeartbeatHandle, MIN_HEARTBEAT_INTERVAL};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    error::SessionError,
    events::PlayerEvent,
};

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub admission_url: Url,
    /// Session-scoped endpoints live under `{session_base_url}/{session_id}`.
    pub session_base_url: Url,
    /// Base for playback URLs built from a grant token.
    pub media_base_url: Url,
    pub heartbeat_interval: Duration,
    /// Sent as a bearer token on every session request.
    pub auth_token: Option<String>,
}

impl SessionOptions {
    #[must_use]
    pub fn new(admission_url: Url, session_base_url: Url, media_base_url: Url) -> Self {
        Self {
            admission_url,
            session_base_url,
            media_base_url,
            heartbeat_interval: Duration::from_secs(60),
            auth_token: None,
        }
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    #[must_use]
    pub fn with_auth_token<S: Into<String>>(mut self, token: S) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Granted playback session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackSession {
    pub session_id: String,
    pub media_id: String,
    pub playback_url: Url,
    pub expires_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
}

impl PlaybackSession {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, zero once expired.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Idle,
    Requesting,
    Active,
    Ending,
}

#[derive(Debug, Default)]
struct SessionState {
    phase: SessionPhase,
    /// Bumped on every end/teardown; requests started under an older
    /// generation are discarded when they complete.
    generation: u64,
    session: Option<PlaybackSession>,
    heartbeat: Option<HeartbeatHandle>,
}

impl SessionState {
    /// Drop the session and its heartbeat, invalidating in-flight requests.
    fn clear(&mut self) -> Option<PlaybackSession> {
        self.generation += 1;
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.cancel();
        }
        self.session.take()
    }
}

/// Owns at most one playback session for a player instance.
///
/// Callers serialize `start_session`/`end_session`; the manager only
/// guarantees that a torn-down session never comes back to life.
pub struct SessionManager {
    net: Arc<dyn Net>,
    options: SessionOptions,
    state: Mutex<SessionState>,
    events: Option<EventBus<PlayerEvent>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("options", &self.options)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    #[must_use]
    pub fn new(net: Arc<dyn Net>, options: SessionOptions) -> Self {
        Self {
            net,
            options,
            state: Mutex::new(SessionState::default()),
            events: None,
        }
    }

    /// Publish `SessionStarted` / `SessionEnded` on `bus`.
    #[must_use]
    pub fn with_events(mut self, bus: EventBus<PlayerEvent>) -> Self {
        self.events = Some(bus);
        self
    }

    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    #[must_use]
    pub fn session(&self) -> Option<PlaybackSession> {
        self.state.lock().session.clone()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.lock().session.is_some()
    }

    /// Whether a heartbeat schedule is currently running.
    #[must_use]
    pub fn heartbeat_scheduled(&self) -> bool {
        self.state
            .lock()
            .heartbeat
            .as_ref()
            .is_some_and(|h| !h.is_cancelled())
    }

    /// Request admission and, when granted, start heart-beating.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Denied`] when the service refuses the session.
    /// - [`SessionError::Net`] on transport failure.
    /// - [`SessionError::InvalidResponse`] for an unusable grant.
    /// - [`SessionError::Cancelled`] if the session was ended or torn down
    ///   while the request was in flight.
    pub async fn start_session(
        &self,
        request: &AdmissionRequest,
    ) -> Result<PlaybackSession, SessionError> {
        let generation = {
            let mut state = self.state.lock();
            // A live session stays `Active` until its replacement is granted.
            if state.session.is_none() {
                state.phase = SessionPhase::Requesting;
            }
            state.generation
        };
        debug!(media_id = %request.media_id, "requesting admission");

        let body = serde_json::to_value(request).map_err(NetError::from)?;
        let result = self
            .net
            .post_json(self.options.admission_url.clone(), body, self.headers())
            .await;

        let outcome = result.map_err(SessionError::from).and_then(|resp| {
            if !resp.is_success() {
                let denial = denial_for(resp.status, &resp.body);
                info!(status = resp.status, %denial, "admission denied");
                return Err(SessionError::from(denial));
            }
            let envelope: GrantEnvelope = resp
                .json()
                .map_err(|e| SessionError::InvalidResponse(e.to_string()))?;
            let grant = envelope.data;
            let playback_url =
                grant.playback_url(&self.options.media_base_url, &request.media_id)?;
            let heartbeat_url = self.heartbeat_url(&grant.session_id)?;
            Ok((grant, playback_url, heartbeat_url))
        });

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(media_id = %request.media_id, "admission response discarded after teardown");
            return Err(SessionError::Cancelled);
        }

        let (grant, playback_url, heartbeat_url) = match outcome {
            Ok(granted) => granted,
            Err(e) => {
                state.phase = if state.session.is_some() {
                    SessionPhase::Active
                } else {
                    SessionPhase::Idle
                };
                return Err(e);
            }
        };

        let session = PlaybackSession {
            session_id: grant.session_id,
            media_id: request.media_id.clone(),
            playback_url,
            expires_at: grant.expires_at,
            started_at: Utc::now(),
        };

        if let Some(previous) = state.session.take() {
            warn!(session_id = %previous.session_id, "replacing a session that was never ended");
        }
        state.heartbeat = Some(HeartbeatHandle::spawn(
            Arc::clone(&self.net),
            heartbeat_url,
            self.headers(),
            self.options.heartbeat_interval,
        ));
        state.session = Some(session.clone());
        state.phase = SessionPhase::Active;
        drop(state);

        info!(
            session_id = %session.session_id,
            media_id = %session.media_id,
            expires_at = %session.expires_at,
            "session started"
        );
        self.publish(PlayerEvent::SessionStarted {
            session_id: session.session_id.clone(),
            media_id: session.media_id.clone(),
        });
        Ok(session)
    }

    /// End the active session.
    ///
    /// Local state and the heartbeat are cleared before the DELETE is sent;
    /// the DELETE itself is best-effort. Returns the ended session, if any.
    pub async fn end_session(&self) -> Option<PlaybackSession> {
        let (session, generation) = {
            let mut state = self.state.lock();
            let session = state.clear();
            state.phase = if session.is_some() {
                SessionPhase::Ending
            } else {
                SessionPhase::Idle
            };
            (session, state.generation)
        };
        let session = session?;

        self.send_end(&session.session_id).await;

        {
            let mut state = self.state.lock();
            if state.generation == generation && state.phase == SessionPhase::Ending {
                state.phase = SessionPhase::Idle;
            }
        }
        info!(session_id = %session.session_id, "session ended");
        self.publish(PlayerEvent::SessionEnded {
            session_id: session.session_id.clone(),
        });
        Some(session)
    }

    /// Send one heartbeat now, outside the schedule.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoActiveSession`] without a session, or the
    /// transport error. Non-2xx statuses are tolerated.
    pub async fn heartbeat(&self) -> Result<(), SessionError> {
        let session_id = self
            .state
            .lock()
            .session
            .as_ref()
            .map(|s| s.session_id.clone())
            .ok_or(SessionError::NoActiveSession)?;
        let resp = self
            .net
            .post(self.heartbeat_url(&session_id)?, self.headers())
            .await?;
        if !resp.is_success() {
            warn!(%session_id, status = resp.status, "heartbeat rejected");
        }
        Ok(())
    }

    /// Synchronous cleanup for the owner going away.
    ///
    /// Always stops the heartbeat and forgets the session, including when
    /// none was started. The termination DELETE is fired in the background
    /// when a runtime is available.
    pub fn teardown(&self) {
        let session = {
            let mut state = self.state.lock();
            let session = state.clear();
            state.phase = SessionPhase::Idle;
            session
        };
        let Some(session) = session else {
            debug!("teardown without active session");
            return;
        };

        info!(session_id = %session.session_id, "session torn down");
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            match self.session_url(&session.session_id) {
                Ok(url) => {
                    let net = Arc::clone(&self.net);
                    let headers = self.headers();
                    handle.spawn(async move {
                        if let Err(e) = net.delete(url, headers).await {
                            warn!(error = %e, "session termination failed");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "session termination skipped"),
            }
        }
        self.publish(PlayerEvent::SessionEnded {
            session_id: session.session_id,
        });
    }

    async fn send_end(&self, session_id: &str) {
        let url = match self.session_url(session_id) {
            Ok(url) => url,
            Err(e) => {
                warn!(%session_id, error = %e, "session termination skipped");
                return;
            }
        };
        match self.net.delete(url, self.headers()).await {
            Ok(resp) if resp.is_success() => debug!(%session_id, "session terminated"),
            Ok(resp) => warn!(%session_id, status = resp.status, "session termination rejected"),
            Err(e) => warn!(%session_id, error = %e, "session termination failed"),
        }
    }

    fn headers(&self) -> Option<Headers> {
        self.options.auth_token.as_deref().map(Headers::bearer)
    }

    fn session_url(&self, session_id: &str) -> Result<Url, SessionError> {
        self.session_endpoint(&[session_id])
    }

    fn heartbeat_url(&self, session_id: &str) -> Result<Url, SessionError> {
        self.session_endpoint(&[session_id, "heartbeat"])
    }

    fn session_endpoint(&self, segments: &[&str]) -> Result<Url, SessionError> {
        let base = &self.options.session_base_url;
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| NetError::InvalidUrl(format!("{base} cannot be a base")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn publish(&self, event: PlayerEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.clear();
    }
}
