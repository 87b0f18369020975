use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AdmissionDenial, SessionError};

/// Body of the admission POST.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub user_id: String,
    pub media_id: String,
    pub device_id: String,
    pub family_id: String,
    pub user_role: String,
    pub content_rating: String,
    pub profile_content_rating_limit: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GrantEnvelope {
    pub data: AdmissionGrant,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AdmissionGrant {
    pub session_id: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
struct DenialBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Map a non-2xx admission response to the viewer-facing denial.
pub(crate) fn denial_for(status: u16, body: &[u8]) -> AdmissionDenial {
    let body: DenialBody = serde_json::from_slice(body).unwrap_or_default();
    let message = body.message.filter(|m| !m.is_empty());

    match status {
        401 => AdmissionDenial::Unauthorized,
        403 => AdmissionDenial::PolicyDenied {
            message: message
                .unwrap_or_else(|| "This title is not available for your profile.".to_string()),
        },
        429 if body.error.as_deref() == Some("concurrency_limit") => {
            AdmissionDenial::ConcurrencyLimit
        }
        429 if body.error.as_deref() == Some("device_limit") => AdmissionDenial::DeviceLimit,
        500 => AdmissionDenial::ServerError,
        _ => AdmissionDenial::Rejected {
            status,
            message: message.unwrap_or_else(|| format!("admission failed with status {status}")),
        },
    }
}

impl AdmissionGrant {
    /// Signed URL from the grant, or `{media_base}/{media_id}/master.m3u8?token=`.
    pub(crate) fn playback_url(&self, media_base: &Url, media_id: &str) -> Result<Url, SessionError> {
        if let Some(url) = self.media_url.as_deref().filter(|u| !u.is_empty()) {
            return Url::parse(url)
                .map_err(|e| SessionError::InvalidResponse(format!("mediaUrl: {e}")));
        }

        let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) else {
            return Err(SessionError::InvalidResponse(
                "grant carries neither mediaUrl nor token".to_string(),
            ));
        };

        let mut url = media_base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                SessionError::InvalidResponse(format!("media base {media_base} cannot be a base"))
            })?
            .pop_if_empty()
            .extend([media_id, "master.m3u8"]);
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}
