use std::{sync::Arc, time::Duration};

use cadenza_net::{HttpClient, Net, NetOptions};
use cadenza_play::{
    AdmissionDenial, AdmissionRequest, PlaybackEngine, PlayerConfig, PlayerEvent, SessionError,
    SessionManager, SessionOptions, SessionPhase,
};
use cadenza_test_utils::{NetMethod, RecordingNet, SessionService, TestHttpServer};
use rstest::{fixture, rstest};
use serde_json::json;
use url::Url;

const EXPIRES: &str = "2030-06-01T12:00:00Z";

#[fixture]
fn request() -> AdmissionRequest {
    AdmissionRequest {
        user_id: "user-7".into(),
        media_id: "movie-42".into(),
        device_id: "device-1".into(),
        family_id: "family-3".into(),
        user_role: "member".into(),
        content_rating: "PG-13".into(),
        profile_content_rating_limit: "R".into(),
    }
}

fn http_net() -> Arc<dyn Net> {
    Arc::new(HttpClient::new(NetOptions::default()).unwrap())
}

fn options_for(server: &TestHttpServer) -> SessionOptions {
    SessionOptions::new(
        server.url("admission"),
        server.url("sessions"),
        Url::parse("https://media.example/vod").unwrap(),
    )
    .with_auth_token("secret")
}

fn offline_options() -> SessionOptions {
    SessionOptions::new(
        Url::parse("http://svc.test/admission").unwrap(),
        Url::parse("http://svc.test/sessions/").unwrap(),
        Url::parse("https://media.example/vod").unwrap(),
    )
}

fn grant() -> serde_json::Value {
    json!({ "data": { "sessionId": "sess-1", "token": "tok", "expiresAt": EXPIRES } })
}

// -- HTTP contract --

#[rstest]
#[tokio::test]
async fn grant_starts_session_with_fallback_url(request: AdmissionRequest) {
    let service = SessionService::granting("sess-1", "tok-9", EXPIRES);
    let server = TestHttpServer::new(service.router()).await;
    let manager = SessionManager::new(http_net(), options_for(&server));

    let session = manager.start_session(&request).await.unwrap();

    assert_eq!(session.session_id, "sess-1");
    assert_eq!(session.media_id, "movie-42");
    assert_eq!(
        session.playback_url.as_str(),
        "https://media.example/vod/movie-42/master.m3u8?token=tok-9"
    );
    assert_eq!(session.expires_at.to_rfc3339(), "2030-06-01T12:00:00+00:00");
    assert_eq!(manager.phase(), SessionPhase::Active);
    assert!(manager.heartbeat_scheduled());

    let sent = service.admission_requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["mediaId"], "movie-42");
    assert_eq!(sent[0]["profileContentRatingLimit"], "R");
    assert_eq!(service.authorization(), vec![Some("Bearer secret".to_string())]);

    manager.end_session().await;
    assert_eq!(service.ended(), vec!["sess-1".to_string()]);
}

#[rstest]
#[tokio::test]
async fn signed_url_is_used_verbatim(request: AdmissionRequest) {
    let service =
        SessionService::granting_url("sess-2", "https://cdn.example/signed.m3u8?sig=abc", EXPIRES);
    let server = TestHttpServer::new(service.router()).await;
    let manager = SessionManager::new(http_net(), options_for(&server));

    let session = manager.start_session(&request).await.unwrap();
    assert_eq!(
        session.playback_url.as_str(),
        "https://cdn.example/signed.m3u8?sig=abc"
    );
    manager.teardown();
}

#[rstest]
#[tokio::test]
async fn concurrency_limit_is_reported(request: AdmissionRequest) {
    let service = SessionService::denying(429, "concurrency_limit", "limit reached");
    let server = TestHttpServer::new(service.router()).await;
    let manager = SessionManager::new(http_net(), options_for(&server));

    let err = manager.start_session(&request).await.unwrap_err();

    assert_eq!(err.denial(), Some(&AdmissionDenial::ConcurrencyLimit));
    assert!(err.to_string().contains("streams"), "{err}");
    assert_eq!(manager.phase(), SessionPhase::Idle);
    assert!(!manager.heartbeat_scheduled());
    assert!(manager.session().is_none());
}

#[rstest]
#[case(429, "device_limit", AdmissionDenial::DeviceLimit)]
#[case(401, "unauthorized", AdmissionDenial::Unauthorized)]
#[case(500, "internal", AdmissionDenial::ServerError)]
#[tokio::test]
async fn status_codes_map_to_denials(
    request: AdmissionRequest,
    #[case] status: u16,
    #[case] code: &str,
    #[case] expected: AdmissionDenial,
) {
    let service = SessionService::denying(status, code, "nope");
    let server = TestHttpServer::new(service.router()).await;
    let manager = SessionManager::new(http_net(), options_for(&server));

    let err = manager.start_session(&request).await.unwrap_err();
    assert_eq!(err.denial(), Some(&expected));
}

#[rstest]
#[tokio::test]
async fn policy_denial_carries_server_message(request: AdmissionRequest) {
    let service = SessionService::denying(403, "policy_violation", "Rated R is blocked for Kids");
    let server = TestHttpServer::new(service.router()).await;
    let manager = SessionManager::new(http_net(), options_for(&server));

    let err = manager.start_session(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "Rated R is blocked for Kids");
}

#[rstest]
#[tokio::test]
async fn rejected_delete_still_clears_session(request: AdmissionRequest) {
    let service = SessionService::granting("sess-1", "tok", EXPIRES).with_delete_status(500);
    let server = TestHttpServer::new(service.router()).await;
    let manager = SessionManager::new(http_net(), options_for(&server));

    manager.start_session(&request).await.unwrap();
    let ended = manager.end_session().await;

    assert_eq!(ended.map(|s| s.session_id).as_deref(), Some("sess-1"));
    assert!(!manager.heartbeat_scheduled());
    assert!(manager.session().is_none());
    assert_eq!(manager.phase(), SessionPhase::Idle);
}

#[rstest]
#[tokio::test]
async fn late_grant_after_teardown_is_discarded(request: AdmissionRequest) {
    let service = SessionService::granting("sess-late", "tok", EXPIRES)
        .with_admission_delay(Duration::from_millis(300));
    let server = TestHttpServer::new(service.router()).await;
    let manager = Arc::new(SessionManager::new(http_net(), options_for(&server)));

    let pending = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.start_session(&request).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.teardown();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(SessionError::Cancelled)));
    assert!(manager.session().is_none());
    assert!(!manager.heartbeat_scheduled());
    assert_eq!(manager.phase(), SessionPhase::Idle);
}

#[rstest]
#[tokio::test]
async fn replacement_request_keeps_live_session_active(request: AdmissionRequest) {
    let service = SessionService::granting("sess-a", "tok", EXPIRES)
        .with_admission_delay(Duration::from_millis(200));
    let server = TestHttpServer::new(service.router()).await;
    let manager = Arc::new(SessionManager::new(http_net(), options_for(&server)));
    manager.start_session(&request).await.unwrap();

    let pending = {
        let manager = Arc::clone(&manager);
        let request = request.clone();
        tokio::spawn(async move { manager.start_session(&request).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(manager.is_active());
    assert_eq!(manager.phase(), SessionPhase::Active);

    pending.await.unwrap().unwrap();
    assert_eq!(manager.phase(), SessionPhase::Active);
    assert!(manager.heartbeat_scheduled());
    manager.teardown();
}

// -- heartbeat schedule --

#[rstest]
#[tokio::test(start_paused = true)]
async fn heartbeat_fires_every_interval(request: AdmissionRequest) {
    let net = Arc::new(RecordingNet::new().respond_json(200, &grant()));
    let manager = SessionManager::new(net.clone(), offline_options());
    manager.start_session(&request).await.unwrap();

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(net.count(NetMethod::Post), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(net.count(NetMethod::Post), 1);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(net.count(NetMethod::Post), 3);

    let hb = net
        .calls()
        .into_iter()
        .find(|c| c.method == NetMethod::Post)
        .unwrap();
    assert_eq!(hb.url.as_str(), "http://svc.test/sessions/sess-1/heartbeat");
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn heartbeat_failures_do_not_end_session(request: AdmissionRequest) {
    let net = Arc::new(RecordingNet::new().respond_json(200, &grant()).failing_post());
    let manager = SessionManager::new(net.clone(), offline_options());
    manager.start_session(&request).await.unwrap();

    tokio::time::sleep(Duration::from_secs(181)).await;

    assert_eq!(net.count(NetMethod::Post), 3);
    assert!(manager.is_active());
    assert!(manager.heartbeat_scheduled());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn failed_delete_still_stops_heartbeat(request: AdmissionRequest) {
    let net = Arc::new(RecordingNet::new().respond_json(200, &grant()).failing_delete());
    let manager = SessionManager::new(net.clone(), offline_options());
    manager.start_session(&request).await.unwrap();

    manager.end_session().await;
    assert!(!manager.heartbeat_scheduled());

    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(net.count(NetMethod::Post), 0);
    assert_eq!(net.count(NetMethod::Delete), 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn teardown_stops_heartbeat_and_terminates(request: AdmissionRequest) {
    let net = Arc::new(RecordingNet::new().respond_json(200, &grant()));
    let manager = SessionManager::new(net.clone(), offline_options());
    manager.start_session(&request).await.unwrap();

    manager.teardown();
    manager.teardown();
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(net.count(NetMethod::Post), 0);
    assert_eq!(net.count(NetMethod::Delete), 1);
    assert!(manager.session().is_none());
}

#[rstest]
#[tokio::test]
async fn teardown_without_session_is_noop() {
    let net = Arc::new(RecordingNet::new());
    let manager = SessionManager::new(net.clone(), offline_options());
    manager.teardown();
    assert!(manager.end_session().await.is_none());
    assert!(net.calls().is_empty());
    assert_eq!(manager.phase(), SessionPhase::Idle);
}

#[rstest]
#[tokio::test]
async fn manual_heartbeat_requires_session() {
    let manager = SessionManager::new(Arc::new(RecordingNet::new()), offline_options());
    assert!(matches!(
        manager.heartbeat().await,
        Err(SessionError::NoActiveSession)
    ));
}

#[rstest]
#[tokio::test]
async fn grant_without_url_or_token_is_invalid(request: AdmissionRequest) {
    let net = Arc::new(RecordingNet::new().respond_json(
        200,
        &json!({ "data": { "sessionId": "s", "expiresAt": EXPIRES } }),
    ));
    let manager = SessionManager::new(net, offline_options());
    let err = manager.start_session(&request).await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidResponse(_)));
    assert_eq!(manager.phase(), SessionPhase::Idle);
}

#[rstest]
#[tokio::test]
async fn lifecycle_is_published_on_engine_bus(request: AdmissionRequest) {
    let engine = PlaybackEngine::new(PlayerConfig::default());
    let mut rx = engine.subscribe();
    let net = Arc::new(RecordingNet::new().respond_json(200, &grant()));
    let manager = engine.session_manager(net, offline_options());

    manager.start_session(&request).await.unwrap();
    manager.end_session().await;

    assert!(matches!(
        rx.recv().await.unwrap(),
        PlayerEvent::SessionStarted { session_id, media_id }
            if session_id == "sess-1" && media_id == "movie-42"
    ));
    assert!(matches!(
        rx.recv().await.unwrap(),
        PlayerEvent::SessionEnded { session_id } if session_id == "sess-1"
    ));
}
