//! Tool input decoding

use context_agent_core::ToolError;
use serde::de::DeserializeOwned;

/// Decode a tool's JSON input into its typed parameters
///
/// # Errors
///
/// Returns `ToolError` when the input is not valid JSON or misses a required field
pub fn parse_input<T: DeserializeOwned>(input: &str) -> Result<T, ToolError> {
    serde_json::from_str(input).map_err(|e| ToolError {
        message: format!("Invalid input JSON: {e}"),
    })
}
