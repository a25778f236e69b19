use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use vigil_api::*;

use crate::error::ClientError;
use crate::retry::{retry_send, RetryConfig};

/// Typed HTTP client for the monitoring backend.
///
/// The session is a cookie: the client keeps its own cookie jar and never
/// follows redirects, so a protected endpoint bouncing to the login page
/// surfaces as [`ClientError::Redirected`] instead of an HTML body.
/// Clones share the jar.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client`. The caller is responsible
    /// for enabling the cookie store and disabling redirects.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ── Auth ──────────────────────────────────────────────────────────────

    /// Submit the login form. Only transport failures are errors; the status
    /// is returned so the caller decides what counts as accepted.
    pub async fn login(&self, username: &str, password: &str) -> Result<StatusCode, ClientError> {
        let resp = self
            .client
            .post(self.url(paths::LOGIN))
            .form(&LoginForm { username, password })
            .send()
            .await?;
        debug!(status = %resp.status(), "login form submitted");
        Ok(resp.status())
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let resp = self.client.get(self.url(paths::LOGOUT)).send().await?;
        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Status of the cheapest protected call. 2xx means the cookie is live.
    pub async fn probe_session(&self) -> Result<StatusCode, ClientError> {
        let resp = self.client.get(self.url(paths::AGENTS)).send().await?;
        Ok(resp.status())
    }

    // ── Agents ────────────────────────────────────────────────────────────

    pub async fn list_agents(&self) -> Result<Vec<Agent>, ClientError> {
        let resp = self.client.get(self.url(paths::AGENTS)).send().await?;
        let value: serde_json::Value = parse_response(resp).await?;
        if !value.is_array() {
            warn!("agent list is not an array, treating as empty");
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value)?)
    }

    pub async fn create_agent(&self, req: &CreateAgentRequest) -> Result<(), ClientError> {
        let resp = self
            .client
            .post(self.url(paths::AGENTS))
            .json(req)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    pub async fn delete_agent(&self, id: &str) -> Result<(), ClientError> {
        let resp = self
            .client
            .delete(self.url(&paths::agent(id)))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    // ── Metrics ───────────────────────────────────────────────────────────

    /// Distinct values of `label` (`__name__` for metric names, `job` for jobs).
    pub async fn label_values(&self, label: &str) -> Result<Vec<String>, ClientError> {
        self.label_values_with_retry(label, &RetryConfig::none())
            .await
    }

    pub async fn label_values_with_retry(
        &self,
        label: &str,
        retry: &RetryConfig,
    ) -> Result<Vec<String>, ClientError> {
        let url = self.url(&paths::label_values(label));
        let resp = retry_send(|| self.client.get(&url), retry).await?;
        let parsed: LabelValuesResponse = parse_response(resp).await?;
        if let Some(status) = parsed.failed_status() {
            warn!(label, status, "label values request reported failure");
        }
        Ok(parsed.into_values())
    }

    /// Raw JSON-lines export for a series selector.
    pub async fn export(&self, selector: &str) -> Result<String, ClientError> {
        let resp = self
            .client
            .post(self.url(paths::EXPORT))
            .form(&ExportForm { selector })
            .send()
            .await?;
        let resp = check_status(resp).await?;
        Ok(resp.text().await?)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Map non-2xx answers onto [`ClientError`]; pass 2xx through.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status.is_redirection() {
        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        return Err(ClientError::Redirected {
            status: status.as_u16(),
            location,
        });
    }
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(ClientError::Unauthorized {
            status: status.as_u16(),
        });
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let resp = check_status(resp).await?;
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
