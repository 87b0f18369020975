//! Stub of the admission and session endpoints.
//!
//! Routes:
//! - `POST /admission`
//! - `POST /sessions/{id}/heartbeat`
//! - `DELETE /sessions/{id}`

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{delete, post},
};
use parking_lot::Mutex;
use serde_json::{Value, json};

#[derive(Debug)]
struct ServiceState {
    admission_status: StatusCode,
    admission_body: Value,
    admission_delay: Duration,
    delete_status: StatusCode,
    admission_requests: Vec<Value>,
    authorization: Vec<Option<String>>,
    heartbeats: HashMap<String, u32>,
    ended: Vec<String>,
}

/// Scripted session service with request recording.
#[derive(Clone, Debug)]
pub struct SessionService {
    state: Arc<Mutex<ServiceState>>,
}

impl SessionService {
    fn with_admission(status: StatusCode, body: Value) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServiceState {
                admission_status: status,
                admission_body: body,
                admission_delay: Duration::ZERO,
                delete_status: StatusCode::NO_CONTENT,
                admission_requests: Vec::new(),
                authorization: Vec::new(),
                heartbeats: HashMap::new(),
                ended: Vec::new(),
            })),
        }
    }

    /// Grants every admission with a token and no signed URL.
    #[must_use]
    pub fn granting(session_id: &str, token: &str, expires_at: &str) -> Self {
        Self::with_admission(
            StatusCode::OK,
            json!({
                "data": {
                    "sessionId": session_id,
                    "token": token,
                    "expiresAt": expires_at,
                }
            }),
        )
    }

    /// Grants every admission with a signed playback URL.
    #[must_use]
    pub fn granting_url(session_id: &str, media_url: &str, expires_at: &str) -> Self {
        Self::with_admission(
            StatusCode::OK,
            json!({
                "data": {
                    "sessionId": session_id,
                    "mediaUrl": media_url,
                    "expiresAt": expires_at,
                }
            }),
        )
    }

    /// Refuses every admission with `{error, message}`.
    ///
    /// # Panics
    ///
    /// Panics if `status` is not a valid HTTP status code.
    #[must_use]
    pub fn denying(status: u16, error: &str, message: &str) -> Self {
        Self::with_admission(
            StatusCode::from_u16(status).expect("valid status"),
            json!({ "error": error, "message": message }),
        )
    }

    /// # Panics
    ///
    /// Panics if `status` is not a valid HTTP status code.
    #[must_use]
    pub fn with_delete_status(self, status: u16) -> Self {
        self.state.lock().delete_status = StatusCode::from_u16(status).expect("valid status");
        self
    }

    #[must_use]
    pub fn with_admission_delay(self, delay: Duration) -> Self {
        self.state.lock().admission_delay = delay;
        self
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/admission", post(admit))
            .route("/sessions/{id}/heartbeat", post(heartbeat))
            .route("/sessions/{id}", delete(end))
            .with_state(self.clone())
    }

    #[must_use]
    pub fn admission_requests(&self) -> Vec<Value> {
        self.state.lock().admission_requests.clone()
    }

    /// `Authorization` header of every admission request, in order.
    #[must_use]
    pub fn authorization(&self) -> Vec<Option<String>> {
        self.state.lock().authorization.clone()
    }

    #[must_use]
    pub fn heartbeats(&self, session_id: &str) -> u32 {
        self.state
            .lock()
            .heartbeats
            .get(session_id)
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn ended(&self) -> Vec<String> {
        self.state.lock().ended.clone()
    }
}

async fn admit(
    State(service): State<SessionService>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let delay = {
        let mut state = service.state.lock();
        state.admission_requests.push(body);
        state.authorization.push(
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        );
        state.admission_delay
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let state = service.state.lock();
    (state.admission_status, Json(state.admission_body.clone())).into_response()
}

async fn heartbeat(State(service): State<SessionService>, Path(id): Path<String>) -> StatusCode {
    *service.state.lock().heartbeats.entry(id).or_insert(0) += 1;
    StatusCode::NO_CONTENT
}

async fn end(State(service): State<SessionService>, Path(id): Path<String>) -> StatusCode {
    let mut state = service.state.lock();
    state.ended.push(id);
    state.delete_status
}
