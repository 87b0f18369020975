use async_trait::async_trait;
use url::Url;

use crate::{
    error::NetError,
    types::{Headers, HttpResponse},
};

/// Request verbs the session service needs.
///
/// Non-2xx statuses are returned as responses, not errors: callers decide
/// what a status means. Use [`HttpResponse::error_for_status`] to fold
/// them into [`NetError`].
#[async_trait]
pub trait Net: Send + Sync {
    /// POST a JSON body
    async fn post_json(
        &self,
        url: Url,
        body: serde_json::Value,
        headers: Option<Headers>,
    ) -> Result<HttpResponse, NetError>;

    /// POST without a body
    async fn post(&self, url: Url, headers: Option<Headers>) -> Result<HttpResponse, NetError>;

    /// DELETE a resource
    async fn delete(&self, url: Url, headers: Option<Headers>) -> Result<HttpResponse, NetError>;
}
