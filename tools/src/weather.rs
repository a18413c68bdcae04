//! Current weather from the MET Norway locationforecast API

use crate::http::PublicApiClient;
use crate::input::parse_input;
use context_agent_core::agent::{Tool, ToolError, ToolExecutorFn, ToolFuture};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

const FORECAST_PATH: &str = "/weatherapi/locationforecast/2.0/compact";

/// MET Norway forecast client
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: PublicApiClient,
    base_url: String,
}

impl WeatherClient {
    /// Create a client for the API host at `base_url`
    #[must_use]
    pub fn new(http: PublicApiClient, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Instant weather details of the first forecast step
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the request fails or the forecast has no
    /// instant details
    pub async fn current(&self, lat: &str, lon: &str) -> Result<serde_json::Value, ToolError> {
        let body = self
            .http
            .get_json(
                &format!("{}{FORECAST_PATH}", self.base_url),
                &[("lat", lat), ("lon", lon)],
            )
            .await?;

        body.pointer("/properties/timeseries/0/data/instant/details")
            .filter(|details| details.is_object())
            .cloned()
            .ok_or_else(|| ToolError {
                message: "Could not retrieve weather for coordinates".to_string(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct WeatherInput {
    lat: String,
    lon: String,
}

/// Create the `get_current_weather_for_coordinates` tool
///
/// Returns JSON with the instant details, e.g.:
/// ```json
/// {"air_temperature": 3.1, "wind_speed": 4.2, "relative_humidity": 81.0}
/// ```
#[must_use]
pub fn get_current_weather_for_coordinates_tool(client: WeatherClient) -> (Tool, ToolExecutorFn) {
    let tool = Tool {
        name: "get_current_weather_for_coordinates".to_string(),
        description: "Retrieve the current weather for a given latitude and longitude".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "lat": {
                    "type": "string",
                    "description": "Latitude"
                },
                "lon": {
                    "type": "string",
                    "description": "Longitude"
                }
            },
            "required": ["lat", "lon"]
        }),
    };

    let executor = Arc::new(move |input: String| {
        let client = client.clone();
        Box::pin(async move {
            let input: WeatherInput = parse_input(&input)?;
            let details = client.current(&input.lat, &input.lon).await?;
            Ok(details.to_string())
        }) as ToolFuture
    }) as ToolExecutorFn;

    (tool, executor)
}
