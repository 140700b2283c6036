// Hub HTTP client
//
// Wraps `reqwest::Client` with hub URL construction and response
// classification. Three endpoints: status polling, role assignment,
// and node renaming.

use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{AssignReply, HubErrorBody, SetNameRequest, StatusResponse};
use crate::transport::TransportConfig;

/// Longest body excerpt carried inside an error.
const BODY_PREVIEW_LEN: usize = 200;

/// Raw HTTP client for the HydroControl GE hub.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct HubClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HubClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the hub root, e.g. `http://192.168.4.1`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The hub base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`, preserving any path prefix on the base URL.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/status`: the complete current node list.
    pub async fn status(&self) -> Result<StatusResponse, Error> {
        let url = self.url("api/status")?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let body = Self::success_body(resp).await?;

        // The hub reports lock contention as `{"error": "..."}` with HTTP 200.
        if let Ok(err) = serde_json::from_str::<HubErrorBody>(&body) {
            return Err(Error::Backend { message: err.error });
        }

        decode(&body)
    }

    /// `POST /api/assign` with URL-encoded form fields.
    ///
    /// Every HTTP status is a valid reply here: the hub answers
    /// `400 Missing parameters.` as readable text for the operator.
    pub async fn assign(&self, fields: &[(String, String)]) -> Result<AssignReply, Error> {
        let url = self.url("api/assign")?;
        debug!("POST {} ({} fields)", url, fields.len());

        let resp = self.http.post(url).form(fields).send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        trace!(status, %text, "assign reply");

        Ok(AssignReply { status, text })
    }

    /// `POST /api/set-name` with JSON `{id, name}`.
    pub async fn set_name(&self, id: &str, name: &str) -> Result<(), Error> {
        let url = self.url("api/set-name")?;
        debug!("POST {} id={}", url, id);

        let resp = self
            .http
            .post(url)
            .json(&SetNameRequest { id, name })
            .send()
            .await?;
        Self::success_body(resp).await.map(drop)
    }

    /// Open the raw `/events` response for the push-update reader.
    pub(crate) async fn open_events(&self) -> Result<reqwest::Response, Error> {
        let url = self.url("events")?;
        debug!("GET {} (event stream)", url);

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| Error::UpdateStream(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::UpdateStream(format!("HTTP {status}")));
        }
        Ok(resp)
    }

    // ── Response helpers ─────────────────────────────────────────────

    /// Return the body text on a 2xx status, or `Error::Status` otherwise.
    async fn success_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }
        Ok(resp.text().await?)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    })
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(BODY_PREVIEW_LEN);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> HubClient {
        HubClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn url_joins_without_double_slash() {
        let hub = client("http://192.168.4.1/");
        assert_eq!(
            hub.url("api/status").unwrap().as_str(),
            "http://192.168.4.1/api/status"
        );
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let hub = client("http://gateway.local/hub");
        assert_eq!(
            hub.url("/api/set-name").unwrap().as_str(),
            "http://gateway.local/hub/api/set-name"
        );
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let cut = preview(&body);
        assert!(cut.len() <= BODY_PREVIEW_LEN);
        assert!(body.starts_with(cut));
    }
}
