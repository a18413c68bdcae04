//! Address geocoding via Nominatim (OpenStreetMap)

use crate::http::PublicApiClient;
use crate::input::parse_input;
use context_agent_core::agent::{Tool, ToolError, ToolExecutorFn, ToolFuture};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Latitude and longitude, as the decimal strings Nominatim returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude
    pub latitude: String,
    /// Longitude
    pub longitude: String,
}

/// Nominatim search client
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    http: PublicApiClient,
    base_url: String,
}

impl GeocodingClient {
    /// Create a client for the Nominatim instance at `base_url`
    #[must_use]
    pub fn new(http: PublicApiClient, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Look up the best match for `address`
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the request fails, Nominatim reports an error,
    /// or there is no result
    pub async fn coordinates(&self, address: &str) -> Result<Coordinates, ToolError> {
        let body = self
            .http
            .get_json(
                &format!("{}/search", self.base_url),
                &[
                    ("q", address),
                    ("format", "json"),
                    ("addressdetails", "1"),
                    ("extratags", "1"),
                    ("namedetails", "1"),
                    ("limit", "1"),
                ],
            )
            .await?;

        if let Some(error) = body.get("error") {
            let message = match error {
                serde_json::Value::String(message) => message.clone(),
                other => other
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .map_or_else(|| other.to_string(), str::to_string),
            };
            return Err(ToolError { message });
        }

        let first = body
            .as_array()
            .and_then(|results| results.first())
            .ok_or_else(|| ToolError {
                message: format!("No results for address {address}"),
            })?;

        let field = |name: &str| {
            first
                .get(name)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ToolError {
                    message: format!("Geocoding result for {address} has no '{name}'"),
                })
        };

        Ok(Coordinates {
            latitude: field("lat")?,
            longitude: field("lon")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CoordinatesInput {
    address: String,
}

/// Create the `get_coordinates_for_address` tool
///
/// Returns JSON:
/// ```json
/// {"latitude": "52.5170365", "longitude": "13.3888599"}
/// ```
#[must_use]
pub fn get_coordinates_for_address_tool(client: GeocodingClient) -> (Tool, ToolExecutorFn) {
    let tool = Tool {
        name: "get_coordinates_for_address".to_string(),
        description: "Calculates the coordinates (latitude and longitude) for a given address"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "string",
                    "description": "The address to calculate the coordinates for"
                }
            },
            "required": ["address"]
        }),
    };

    let executor = Arc::new(move |input: String| {
        let client = client.clone();
        Box::pin(async move {
            let input: CoordinatesInput = parse_input(&input)?;
            let coordinates = client.coordinates(&input.address).await?;
            Ok(json!(coordinates).to_string())
        }) as ToolFuture
    }) as ToolExecutorFn;

    (tool, executor)
}
