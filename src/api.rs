use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::models::{Container, Host, Image};

const PAGE_LIMIT: usize = 50;

/// Thin client for the Compute console API. Authenticates once, then
/// pages through the inventory endpoints. No retries: a failed request
/// fails the whole run and the operator reruns the job.
pub struct ConsoleClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

impl ConsoleClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.console_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Exchange username/password for a bearer token
    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        let url = format!("{}/api/v1/authenticate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&AuthRequest { username, password })
            .send()
            .await
            .context("Failed to send authentication request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Console authentication failed with status {}", status);
        }

        let auth: AuthResponse = response
            .json()
            .await
            .context("Failed to parse authentication response")?;
        self.token = Some(auth.token);
        debug!("Obtained console API token");

        Ok(())
    }

    /// Pre-flight connectivity check against the console
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/api/v1/_ping", self.base_url);
        let response = self
            .request(&url)
            .send()
            .await
            .context("Failed to reach console")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Console ping returned status {}", status);
        }

        Ok(())
    }

    pub async fn list_hosts(&self) -> Result<Vec<Host>> {
        self.list_all("/api/v1/hosts", &[]).await
    }

    /// Deployed images, restricted to base images by the console-side filter
    pub async fn list_images(&self) -> Result<Vec<Image>> {
        self.list_all("/api/v1/images", &[("filterBaseImage", "true")])
            .await
    }

    pub async fn list_containers(&self) -> Result<Vec<Container>> {
        self.list_all("/api/v1/containers", &[]).await
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Page through an inventory endpoint with offset/limit until a short
    /// or empty page
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, path);
        let mut all = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut request = self.request(&url).query(&[
                ("limit", PAGE_LIMIT.to_string()),
                ("offset", offset.to_string()),
            ]);
            for (key, value) in extra_query {
                request = request.query(&[(key, value)]);
            }

            let response = request
                .send()
                .await
                .with_context(|| format!("Failed to request {}", path))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unable to read response body".to_string());
                anyhow::bail!("Console returned status {} for {}: {}", status, path, body);
            }

            // The console returns a JSON null body for an empty page
            let page: Option<Vec<T>> = response
                .json()
                .await
                .with_context(|| format!("Failed to parse response from {}", path))?;
            let page = page.unwrap_or_default();
            let count = page.len();
            all.extend(page);

            debug!(path, offset, count, "Fetched inventory page");

            if count < PAGE_LIMIT {
                break;
            }
            offset += PAGE_LIMIT;
        }

        Ok(all)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
