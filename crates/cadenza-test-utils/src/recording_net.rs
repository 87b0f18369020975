//! In-memory [`Net`] with scripted responses.

use std::collections::VecDeque;

use async_trait::async_trait;
use bytes::Bytes;
use cadenza_net::{Headers, HttpResponse, Net, NetError};
use parking_lot::Mutex;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetMethod {
    PostJson,
    Post,
    Delete,
}

#[derive(Clone, Debug)]
pub struct NetCall {
    pub method: NetMethod,
    pub url: Url,
    pub body: Option<serde_json::Value>,
    pub headers: Option<Headers>,
}

#[derive(Clone, Debug)]
enum Scripted {
    Respond { status: u16, body: Bytes },
    Fail(String),
}

#[derive(Debug, Default)]
struct Script {
    post_json: VecDeque<Scripted>,
    post: Option<Scripted>,
    delete: Option<Scripted>,
}

/// Records every request. `post_json` answers from a queue (404 once
/// empty); `post` and `delete` answer with a fixed outcome, 204 by default.
#[derive(Debug, Default)]
pub struct RecordingNet {
    calls: Mutex<Vec<NetCall>>,
    script: Mutex<Script>,
}

impl RecordingNet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON answer for the next `post_json`.
    #[must_use]
    pub fn respond_json(self, status: u16, body: &serde_json::Value) -> Self {
        self.script.lock().post_json.push_back(Scripted::Respond {
            status,
            body: Bytes::from(body.to_string()),
        });
        self
    }

    #[must_use]
    pub fn with_post_status(self, status: u16) -> Self {
        self.script.lock().post = Some(Scripted::Respond {
            status,
            body: Bytes::new(),
        });
        self
    }

    #[must_use]
    pub fn failing_post(self) -> Self {
        self.script.lock().post = Some(Scripted::Fail("connection reset".into()));
        self
    }

    #[must_use]
    pub fn failing_delete(self) -> Self {
        self.script.lock().delete = Some(Scripted::Fail("connection refused".into()));
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<NetCall> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn count(&self, method: NetMethod) -> usize {
        self.calls.lock().iter().filter(|c| c.method == method).count()
    }

    fn record(
        &self,
        method: NetMethod,
        url: &Url,
        body: Option<serde_json::Value>,
        headers: Option<Headers>,
    ) {
        self.calls.lock().push(NetCall {
            method,
            url: url.clone(),
            body,
            headers,
        });
    }

    fn answer(url: Url, scripted: Option<Scripted>, default_status: u16) -> Result<HttpResponse, NetError> {
        match scripted {
            Some(Scripted::Fail(reason)) => Err(NetError::Http(reason)),
            Some(Scripted::Respond { status, body }) => Ok(HttpResponse { url, status, body }),
            None => Ok(HttpResponse {
                url,
                status: default_status,
                body: Bytes::new(),
            }),
        }
    }
}

#[async_trait]
impl Net for RecordingNet {
    async fn post_json(
        &self,
        url: Url,
        body: serde_json::Value,
        headers: Option<Headers>,
    ) -> Result<HttpResponse, NetError> {
        self.record(NetMethod::PostJson, &url, Some(body), headers);
        let scripted = self.script.lock().post_json.pop_front();
        Self::answer(url, scripted, 404)
    }

    async fn post(&self, url: Url, headers: Option<Headers>) -> Result<HttpResponse, NetError> {
        self.record(NetMethod::Post, &url, None, headers);
        let scripted = self.script.lock().post.clone();
        Self::answer(url, scripted, 204)
    }

    async fn delete(&self, url: Url, headers: Option<Headers>) -> Result<HttpResponse, NetError> {
        self.record(NetMethod::Delete, &url, None, headers);
        let scripted = self.script.lock().delete.clone();
        Self::answer(url, scripted, 204)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn url() -> Url {
        Url::parse("http://svc.test/admission").unwrap()
    }

    #[rstest]
    #[tokio::test]
    async fn queued_json_answers_then_404() {
        let net = RecordingNet::new().respond_json(200, &json!({"ok": true}));
        let first = net.post_json(url(), json!({}), None).await.unwrap();
        assert_eq!(first.status, 200);
        assert_eq!(first.json::<serde_json::Value>().unwrap()["ok"], true);

        let second = net.post_json(url(), json!({}), None).await.unwrap();
        assert_eq!(second.status, 404);
        assert_eq!(net.count(NetMethod::PostJson), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn scripted_failures() {
        let net = RecordingNet::new().failing_post().failing_delete();
        assert!(net.post(url(), None).await.is_err());
        assert!(net.delete(url(), None).await.is_err());
        assert_eq!(net.calls().len(), 2);
    }
}
