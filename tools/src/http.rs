//! HTTP access to the public JSON services (geocoding, weather)

use context_agent_core::ToolError;
use context_agent_nextcloud::client::USER_AGENT;
use futures::StreamExt;

/// Maximum response size (5MB)
const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024;

/// Shared HTTP client for public APIs
///
/// Both Nominatim and MET Norway reject anonymous clients, so every request
/// carries the crate's user agent.
#[derive(Debug, Clone)]
pub struct PublicApiClient {
    client: reqwest::Client,
}

impl PublicApiClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the HTTP client cannot be built
    pub fn new() -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ToolError {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }

    /// GET `url` with query parameters and parse the body as JSON
    ///
    /// # Errors
    ///
    /// Returns `ToolError` for failed requests, non-success statuses,
    /// oversized bodies, or invalid JSON
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, ToolError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ToolError {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();

        // Stream response with size limit
        let mut body_bytes = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ToolError {
                message: format!("Failed to read response: {e}"),
            })?;

            if body_bytes.len() + chunk.len() > MAX_RESPONSE_SIZE {
                return Err(ToolError {
                    message: format!("Response too large (>{MAX_RESPONSE_SIZE} bytes)"),
                });
            }

            body_bytes.extend_from_slice(&chunk);
        }

        let body: serde_json::Value = serde_json::from_slice(&body_bytes).map_err(|e| {
            if status.is_success() {
                ToolError {
                    message: format!("Invalid JSON response: {e}"),
                }
            } else {
                ToolError {
                    message: format!("HTTP request failed with status {status}"),
                }
            }
        })?;

        // Nominatim reports some errors as JSON with an error status
        if !status.is_success() && body.get("error").is_none() {
            return Err(ToolError {
                message: format!("HTTP request failed with status {status}"),
            });
        }

        Ok(body)
    }
}
