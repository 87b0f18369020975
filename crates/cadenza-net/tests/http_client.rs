use std::time::Duration;

use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{post, delete},
};
use cadenza_net::{Headers, HttpClient, Net, NetError, NetOptions};
use rstest::*;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

// ============================================================================
// Test server infrastructure
// ============================================================================

struct TestServer {
    base_url: Url,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    async fn new(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let server = axum::serve(listener, router).with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });

        tokio::spawn(async move {
            server.await.unwrap();
        });

        Self {
            base_url: Url::parse(&format!("http://{}", addr)).unwrap(),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn url(&self, path: &str) -> Url {
        self.base_url.join(path).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

// ============================================================================
// Test endpoints
// ============================================================================

async fn echo_endpoint(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let auth = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({ "received": body, "authorization": auth }))
}

async fn limit_endpoint() -> impl IntoResponse {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": "concurrency_limit", "message": "too many streams" })),
    )
}

async fn heartbeat_endpoint(Path(id): Path<String>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "sessionId": id }))
}

async fn delete_endpoint(Path(_id): Path<String>) -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn slow_endpoint() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(2)).await;
    StatusCode::OK
}

fn router() -> Router {
    Router::new()
        .route("/echo", post(echo_endpoint))
        .route("/limit", post(limit_endpoint))
        .route("/sessions/{id}/heartbeat", post(heartbeat_endpoint))
        .route("/sessions/{id}", delete(delete_endpoint))
        .route("/slow", post(slow_endpoint))
}

#[fixture]
fn client() -> HttpClient {
    HttpClient::new(NetOptions::default()).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn test_post_json_sends_body_and_headers(client: HttpClient) {
    let server = TestServer::new(router()).await;

    let resp = client
        .post_json(
            server.url("/echo"),
            json!({ "mediaId": "m-1" }),
            Some(Headers::bearer("tok")),
        )
        .await
        .unwrap();

    assert!(resp.is_success());
    let body: Value = resp.json().unwrap();
    assert_eq!(body["received"]["mediaId"], "m-1");
    assert_eq!(body["authorization"], "Bearer tok");
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn test_non_success_status_is_returned_with_body(client: HttpClient) {
    let server = TestServer::new(router()).await;

    let resp = client
        .post_json(server.url("/limit"), json!({}), None)
        .await
        .unwrap();

    assert_eq!(resp.status, 429);
    let body: Value = resp.json().unwrap();
    assert_eq!(body["error"], "concurrency_limit");
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn test_error_for_status_keeps_body(client: HttpClient) {
    let server = TestServer::new(router()).await;

    let err = client
        .post_json(server.url("/limit"), json!({}), None)
        .await
        .unwrap()
        .error_for_status()
        .unwrap_err();

    match err {
        NetError::HttpError { status, body, .. } => {
            assert_eq!(status, 429);
            assert!(body.unwrap().contains("concurrency_limit"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn test_post_without_body(client: HttpClient) {
    let server = TestServer::new(router()).await;

    let resp = client
        .post(server.url("/sessions/s-42/heartbeat"), None)
        .await
        .unwrap();

    assert_eq!(resp.status, 200);
    let body: Value = resp.json().unwrap();
    assert_eq!(body["sessionId"], "s-42");
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn test_delete(client: HttpClient) {
    let server = TestServer::new(router()).await;

    let resp = client.delete(server.url("/sessions/s-42"), None).await.unwrap();

    assert_eq!(resp.status, 204);
    assert!(resp.is_success());
    assert!(resp.body.is_empty());
}

#[rstest]
#[case::missing_route("/nope", 404)]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn test_unknown_route_status(client: HttpClient, #[case] path: &str, #[case] status: u16) {
    let server = TestServer::new(router()).await;

    let resp = client.post(server.url(path), None).await.unwrap();
    assert_eq!(resp.status, status);
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn test_request_timeout() {
    let server = TestServer::new(router()).await;
    let client = HttpClient::new(
        NetOptions::default().with_request_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let err = client.post(server.url("/slow"), None).await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
}

#[rstest]
#[timeout(Duration::from_secs(5))]
#[tokio::test]
async fn test_connection_refused(client: HttpClient) {
    // Bind and immediately drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("http://{addr}/echo")).unwrap();
    let err = client.post(url, None).await.unwrap_err();
    assert!(matches!(err, NetError::Http(_)));
}
