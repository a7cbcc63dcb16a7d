//! HTTP client for the upstream billing/usage API.

use std::time::Duration;

use crate::errors::AppError;

#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    org_id: Option<String>,
}

impl UpstreamClient {
    pub fn new(base_url: &str, api_key: &str, org_id: Option<String>) -> Self {
        // Per-request timeouts come from the endpoint table; only the connect
        // timeout is fixed here.
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            org_id,
        }
    }

    /// Issue a GET against the upstream. Any transport failure (refused
    /// connection, timeout, DNS) maps to `UpstreamUnreachable`; HTTP status
    /// classification is the dispatcher's job. No retries here — the caller
    /// may retry.
    pub async fn fetch(
        &self,
        path: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<reqwest::Response, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(params)
            .timeout(timeout);

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        req.send().await.map_err(|e| {
            tracing::warn!(path = path, "upstream request failed: {}", e);
            AppError::UpstreamUnreachable(e.to_string())
        })
    }
}
