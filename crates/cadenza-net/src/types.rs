use std::{collections::HashMap, time::Duration};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{NetError, NetResult};

#[derive(Clone, Debug, PartialEq)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// `Authorization: Bearer <token>`
    pub fn bearer(token: &str) -> Self {
        let mut headers = Self::new();
        headers.insert("Authorization", format!("Bearer {token}"));
        headers
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for Headers {
    fn default() -> Self {
        Self::new()
    }
}

impl From<HashMap<String, String>> for Headers {
    fn from(map: HashMap<String, String>) -> Self {
        Self { inner: map }
    }
}

/// Status and body of a completed request.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub url: Url,
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> NetResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body as UTF-8 text, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn non-2xx statuses into [`NetError::HttpError`].
    pub fn error_for_status(self) -> NetResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let body = self.text();
        Err(NetError::http_error(
            self.status,
            self.url,
            (!body.is_empty()).then_some(body),
        ))
    }
}

#[derive(Clone, Debug)]
pub struct NetOptions {
    pub request_timeout: Duration,
    /// Max idle connections per host. Set to 0 to disable pooling and reduce memory.
    pub pool_max_idle_per_host: usize,
}

impl Default for NetOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 1,
        }
    }
}

impl NetOptions {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;
    use serde::Deserialize;

    use super::*;

    fn response(status: u16, body: &'static str) -> HttpResponse {
        HttpResponse {
            url: Url::parse("http://example.com/api").unwrap(),
            status,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[rstest]
    #[case::ok(200, true)]
    #[case::no_content(204, true)]
    #[case::redirect(302, false)]
    #[case::too_many(429, false)]
    #[case::server(500, false)]
    fn test_is_success(#[case] status: u16, #[case] expected: bool) {
        assert_eq!(response(status, "").is_success(), expected);
    }

    #[test]
    fn test_bearer_header() {
        let headers = Headers::bearer("abc");
        assert_eq!(headers.get("Authorization"), Some("Bearer abc"));
    }

    #[test]
    fn test_headers_from_hashmap() {
        let mut map = HashMap::new();
        map.insert("key1".to_string(), "value1".to_string());
        let headers: Headers = map.into();
        assert!(!headers.is_empty());
        assert_eq!(headers.get("key1"), Some("value1"));
        assert_eq!(headers.get("missing"), None);
    }

    #[test]
    fn test_json_body() {
        #[derive(Deserialize)]
        struct Body {
            error: String,
        }
        let body: Body = response(429, r#"{"error":"concurrency_limit"}"#)
            .json()
            .unwrap();
        assert_eq!(body.error, "concurrency_limit");
    }

    #[test]
    fn test_json_decode_error() {
        let err = response(200, "not json").json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, NetError::Decode(_)));
    }

    #[rstest]
    #[case::with_body(503, "down", Some("down"))]
    #[case::empty_body(404, "", None)]
    fn test_error_for_status(
        #[case] status: u16,
        #[case] body: &'static str,
        #[case] expected_body: Option<&str>,
    ) {
        let err = response(status, body).error_for_status().unwrap_err();
        assert_eq!(err.status_code(), Some(status));
        match err {
            NetError::HttpError { body, .. } => assert_eq!(body.as_deref(), expected_body),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_for_status_passes_success() {
        assert!(response(200, "{}").error_for_status().is_ok());
    }
}
