//! Tool vocabulary shared by every agent tool
//!
//! A tool is a pair of a [`Tool`] definition (name, description, JSON input
//! schema) and a [`ToolExecutorFn`] that receives the raw JSON input string
//! and produces a [`ToolResult`].
//!
//! ## Example
//!
//! ```ignore
//! use context_agent_core::agent::{Tool, ToolExecutorFn, ToolFuture};
//! use std::sync::Arc;
//!
//! let tool = Tool {
//!     name: "echo".to_string(),
//!     description: "Echo the input back".to_string(),
//!     input_schema: serde_json::json!({"type": "object"}),
//! };
//! let executor: ToolExecutorFn = Arc::new(|input: String| {
//!     Box::pin(async move { Ok(input) }) as ToolFuture
//! });
//! ```

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Tool definition handed to the LLM
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// Tool name (used to identify which tool to call)
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON schema for the tool's input parameters
    pub input_schema: serde_json::Value,
}

/// Result from tool execution
pub type ToolResult = Result<String, ToolError>;

/// Boxed future returned by a tool executor
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Async tool executor: JSON input string in, result string out
pub type ToolExecutorFn = Arc<dyn Fn(String) -> ToolFuture + Send + Sync>;

/// Tool execution errors
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolError {
    /// Error message
    pub message: String,
}

impl ToolError {
    /// Create an error from anything displayable
    #[must_use]
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ToolError {}

/// Whether a tool only reads data or has effects other people can see
///
/// Hosts are expected to ask the user before running a
/// [`ToolSafety::Dangerous`] tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSafety {
    /// Read-only tool, safe to run without confirmation
    Safe,
    /// Tool that creates or sends something on the user's behalf
    Dangerous,
}

impl ToolSafety {
    /// Check if this tool needs confirmation before running
    #[must_use]
    pub const fn is_dangerous(self) -> bool {
        matches!(self, Self::Dangerous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_display() {
        let error = ToolError {
            message: "Tool failed".to_string(),
        };

        assert_eq!(error.to_string(), "Tool failed");
    }

    #[test]
    fn test_tool_error_new() {
        let error = ToolError::new(format_args!("Calendar not found: {}", "Work"));
        assert_eq!(error.message, "Calendar not found: Work");
    }

    #[test]
    fn test_tool_safety() {
        assert!(ToolSafety::Dangerous.is_dangerous());
        assert!(!ToolSafety::Safe.is_dangerous());
        assert_eq!(
            serde_json::to_string(&ToolSafety::Dangerous).ok(),
            Some("\"dangerous\"".to_string())
        );
    }

    #[tokio::test]
    async fn test_executor_fn_roundtrip() {
        let executor: ToolExecutorFn = Arc::new(|input: String| {
            Box::pin(async move { Ok(input.to_uppercase()) }) as ToolFuture
        });

        let result = executor("hello".to_string()).await;
        assert_eq!(result, Ok("HELLO".to_string()));
    }
}
