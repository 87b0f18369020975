use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;
use url::Url;

use crate::{
    error::{NetError, NetResult},
    traits::Net,
    types::{Headers, HttpResponse, NetOptions},
};

/// [`Net`] implementation backed by reqwest.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    options: NetOptions,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns [`NetError::Http`] if the TLS backend cannot be initialised.
    pub fn new(options: NetOptions) -> NetResult<Self> {
        let inner = Client::builder()
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .timeout(options.request_timeout)
            .build()?;
        Ok(Self { inner, options })
    }

    #[must_use]
    pub fn options(&self) -> &NetOptions {
        &self.options
    }

    fn apply_headers(
        mut req: reqwest::RequestBuilder,
        headers: Option<Headers>,
    ) -> reqwest::RequestBuilder {
        if let Some(headers) = headers {
            for (k, v) in headers.iter() {
                req = req.header(k, v);
            }
        }
        req
    }

    async fn send(url: Url, req: reqwest::RequestBuilder) -> NetResult<HttpResponse> {
        let resp = req.send().await.map_err(NetError::from)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(NetError::from)?;
        trace!(%url, status, len = body.len(), "response received");
        Ok(HttpResponse { url, status, body })
    }
}

#[async_trait]
impl Net for HttpClient {
    async fn post_json(
        &self,
        url: Url,
        body: serde_json::Value,
        headers: Option<Headers>,
    ) -> Result<HttpResponse, NetError> {
        let req = self.inner.post(url.clone()).json(&body);
        let req = Self::apply_headers(req, headers);
        Self::send(url, req).await
    }

    async fn post(&self, url: Url, headers: Option<Headers>) -> Result<HttpResponse, NetError> {
        let req = self.inner.post(url.clone());
        let req = Self::apply_headers(req, headers);
        Self::send(url, req).await
    }

    async fn delete(&self, url: Url, headers: Option<Headers>) -> Result<HttpResponse, NetError> {
        let req = self.inner.delete(url.clone());
        let req = Self::apply_headers(req, headers);
        Self::send(url, req).await
    }
}
