//! Nextcloud HTTP client
//!
//! Two request flavours are supported:
//! - OCS API calls (JSON, wrapped in the `{"ocs": {"meta", "data"}}` envelope)
//! - WebDAV calls (raw bodies, used for CalDAV)

use crate::{config::NextcloudConfig, error::NextcloudError};
use reqwest::{Client, Method};
use serde::Deserialize;
use std::sync::Arc;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("context-agent/", env!("CARGO_PKG_VERSION"));

/// Nextcloud API client
///
/// Cloning is cheap: the underlying connection pool and config are shared.
#[derive(Clone)]
pub struct NextcloudClient {
    client: Client,
    config: Arc<NextcloudConfig>,
}

#[derive(Debug, Deserialize)]
struct OcsEnvelope {
    ocs: OcsBody,
}

#[derive(Debug, Deserialize)]
struct OcsBody {
    meta: OcsMeta,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OcsMeta {
    status: String,
    statuscode: u16,
    #[serde(default)]
    message: Option<String>,
}

impl NextcloudClient {
    /// Create a client from `NEXTCLOUD_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns `NextcloudError::Config` if the environment is incomplete
    pub fn from_env() -> Result<Self, NextcloudError> {
        Self::new(NextcloudConfig::from_env()?)
    }

    /// Create a client with explicit configuration
    ///
    /// # Errors
    ///
    /// Returns `NextcloudError::Config` if the HTTP client cannot be built
    pub fn new(config: NextcloudConfig) -> Result<Self, NextcloudError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NextcloudError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Connection configuration
    #[must_use]
    pub fn config(&self) -> &NextcloudConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Turn a server-absolute href into a path relative to the base URL
    ///
    /// Needed when Nextcloud lives in a subdirectory: hrefs then start with
    /// that subdirectory, which is already part of `base_url`.
    pub(crate) fn relative_path<'a>(&self, href: &'a str) -> &'a str {
        let prefix = reqwest::Url::parse(&self.config.base_url)
            .map(|url| url.path().trim_end_matches('/').to_string())
            .unwrap_or_default();

        if prefix.is_empty() {
            return href;
        }
        href.strip_prefix(prefix.as_str())
            .filter(|rest| rest.starts_with('/'))
            .unwrap_or(href)
    }

    /// Call an OCS endpoint and return the unwrapped `ocs.data` value
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-success HTTP statuses, OCS
    /// failures reported in `ocs.meta`, or bodies that are not OCS envelopes
    pub async fn ocs(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, NextcloudError> {
        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .basic_auth(&self.config.user, Some(&self.config.app_password))
            .header("OCS-APIRequest", "true")
            .header("Accept", "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::trace!(%method, path, "OCS request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            // OCS v2 reports failures with an HTTP error plus an envelope
            let message = serde_json::from_str::<OcsEnvelope>(&text)
                .ok()
                .and_then(|envelope| envelope.ocs.meta.message)
                .filter(|message| !message.is_empty())
                .unwrap_or(text);
            return Err(NextcloudError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: OcsEnvelope = serde_json::from_str(&text).map_err(|e| {
            NextcloudError::ResponseParseFailed(format!("Invalid OCS envelope: {e}"))
        })?;

        if envelope.ocs.meta.status != "ok" {
            return Err(NextcloudError::OcsError {
                statuscode: envelope.ocs.meta.statuscode,
                message: envelope.ocs.meta.message.unwrap_or_default(),
            });
        }

        Ok(envelope.ocs.data)
    }

    /// Send a WebDAV request and return the response body
    ///
    /// # Errors
    ///
    /// Returns errors for network failures or non-success HTTP statuses
    pub async fn dav(
        &self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
        body: String,
    ) -> Result<String, NextcloudError> {
        let mut request = self
            .client
            .request(method.clone(), self.url(path))
            .basic_auth(&self.config.user, Some(&self.config.app_password))
            .body(body);

        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        tracing::trace!(%method, path, "WebDAV request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(NextcloudError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        Ok(text)
    }
}

impl std::fmt::Debug for NextcloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextcloudClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
