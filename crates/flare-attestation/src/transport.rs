//! HTTP seam between the client and the verifier services.

use std::future::Future;
use std::time::Duration;

use crate::constants::API_KEY_HEADER;
use crate::error::AttestationError;

/// Sends JSON to a verifier endpoint and returns the decoded JSON reply.
///
/// Implementations must not retry: transport and decode failures go straight
/// back to the caller.
pub trait VerifierTransport: Send + Sync {
    fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, AttestationError>> + Send;

    fn get_json(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<serde_json::Value, AttestationError>> + Send;
}

/// [`VerifierTransport`] over `reqwest`, authenticating with `X-API-KEY`.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    api_key: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, AttestationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AttestationError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
        })
    }

    async fn read_json(resp: reqwest::Response) -> Result<serde_json::Value, AttestationError> {
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| AttestationError::Network(format!("failed to read response: {e}")))?;

        let parsed = serde_json::from_slice::<serde_json::Value>(&bytes);
        if status.is_success() {
            return parsed
                .map_err(|e| AttestationError::Decode(format!("response is not valid JSON: {e}")));
        }

        match parsed {
            // Verifiers report INVALID with an error status; that body is a verdict.
            Ok(value) if value.get("status").is_some() => {
                tracing::debug!(status = status.as_u16(), "verifier returned JSON error body");
                Ok(value)
            }
            _ => Err(AttestationError::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&bytes),
            }),
        }
    }
}

fn truncate_body(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).chars().take(200).collect()
}

impl VerifierTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, AttestationError> {
        tracing::debug!(%url, "POST verifier");
        let resp = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AttestationError::Network(format!("POST {url} failed: {e}")))?;
        Self::read_json(resp).await
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value, AttestationError> {
        tracing::debug!(%url, "GET verifier");
        let resp = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| AttestationError::Network(format!("GET {url} failed: {e}")))?;
        Self::read_json(resp).await
    }
}
