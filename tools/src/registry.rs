//! Tool registry for dynamic tool management
//!
//! The registry provides:
//! - Tool registration with a safety classification
//! - Thread-safe tool storage
//! - Tool execution by name
//! - Listing of tools, and of the dangerous ones a host must confirm

use context_agent_core::agent::{Tool, ToolError, ToolExecutorFn, ToolResult, ToolSafety};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Clone)]
struct RegisteredTool {
    tool: Tool,
    executor: ToolExecutorFn,
    safety: ToolSafety,
}

/// Thread-safe tool registry
///
/// ## Example
///
/// ```ignore
/// use context_agent_core::ToolSafety;
/// use context_agent_tools::{calendar::list_calendars_tool, ToolRegistry};
///
/// let registry = ToolRegistry::new();
/// let (tool, executor) = list_calendars_tool(client);
/// registry.register(tool, executor, ToolSafety::Safe);
///
/// let result = registry.execute("list_calendars", "{}".to_string()).await;
/// ```
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, RegisteredTool>>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a tool with its executor and safety class
    ///
    /// Returns `true` if a tool with the same name was replaced.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[allow(clippy::expect_used)]
    pub fn register(&self, tool: Tool, executor: ToolExecutorFn, safety: ToolSafety) -> bool {
        let mut tools = self
            .tools
            .write()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        tools
            .insert(
                tool.name.clone(),
                RegisteredTool {
                    tool,
                    executor,
                    safety,
                },
            )
            .is_some()
    }

    /// Execute a tool by name
    ///
    /// The registry does not ask for confirmation: checking
    /// [`Self::safety`] before running a dangerous tool is the host's job.
    ///
    /// # Errors
    ///
    /// Returns `ToolError` if the tool is not found or execution fails
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[allow(clippy::expect_used)]
    pub async fn execute(&self, name: &str, input: String) -> ToolResult {
        // Get executor (release lock quickly)
        let executor = {
            let tools = self
                .tools
                .read()
                .expect("Tool registry lock poisoned - indicates a panic in another thread");
            tools.get(name).map(|registered| registered.executor.clone())
        };

        let Some(executor) = executor else {
            return Err(ToolError {
                message: format!("Tool not found: {name}"),
            });
        };

        tracing::info!(tool = name, "Executing tool");
        let result = executor(input).await;
        if let Err(error) = &result {
            tracing::warn!(tool = name, error = %error, "Tool execution failed");
        }
        result
    }

    /// Get all registered tool names, sorted alphabetically
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn list_tools(&self) -> Vec<String> {
        let tools = self
            .tools
            .read()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        let mut names: Vec<String> = tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get names of the tools that need confirmation, sorted alphabetically
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn dangerous_tools(&self) -> Vec<String> {
        let tools = self
            .tools
            .read()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        let mut names: Vec<String> = tools
            .values()
            .filter(|registered| registered.safety.is_dangerous())
            .map(|registered| registered.tool.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Get all tool definitions sorted by name (for passing to the LLM)
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn get_tools(&self) -> Vec<Tool> {
        let tools = self
            .tools
            .read()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        let mut tool_list: Vec<Tool> = tools
            .values()
            .map(|registered| registered.tool.clone())
            .collect();
        tool_list.sort_by(|a, b| a.name.cmp(&b.name));
        tool_list
    }

    /// Get a specific tool definition by name
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn get_tool(&self, name: &str) -> Option<Tool> {
        let tools = self
            .tools
            .read()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        tools.get(name).map(|registered| registered.tool.clone())
    }

    /// Get the safety class of a tool
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn safety(&self, name: &str) -> Option<ToolSafety> {
        let tools = self
            .tools
            .read()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        tools.get(name).map(|registered| registered.safety)
    }

    /// Get the number of registered tools
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned (indicates a panic in another thread)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn count(&self) -> usize {
        let tools = self
            .tools
            .read()
            .expect("Tool registry lock poisoned - indicates a panic in another thread");
        tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;
    use context_agent_core::agent::ToolFuture;
    use serde_json::json;

    fn echo_tool(name: &str) -> (Tool, ToolExecutorFn) {
        let tool = Tool {
            name: name.to_string(),
            description: "Echo the input".to_string(),
            input_schema: json!({"type": "object"}),
        };
        let executor = Arc::new(|input: String| Box::pin(async move { Ok(input) }) as ToolFuture)
            as ToolExecutorFn;
        (tool, executor)
    }

    fn failing_tool(name: &str) -> (Tool, ToolExecutorFn) {
        let (tool, _) = echo_tool(name);
        let executor = Arc::new(|_input: String| {
            Box::pin(async move {
                Err(ToolError {
                    message: "Conversation not found: Random".to_string(),
                })
            }) as ToolFuture
        }) as ToolExecutorFn;
        (tool, executor)
    }

    #[test]
    fn test_registry_new() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_registry_register_replace() {
        let registry = ToolRegistry::new();
        let (tool1, executor1) = echo_tool("list_calendars");
        let (tool2, executor2) = echo_tool("list_calendars");

        assert!(!registry.register(tool1, executor1, ToolSafety::Safe));
        assert!(registry.register(tool2, executor2, ToolSafety::Dangerous));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.safety("list_calendars"), Some(ToolSafety::Dangerous));
    }

    #[test]
    fn test_registry_listing_is_sorted() {
        let registry = ToolRegistry::new();
        for (name, safety) in [
            ("send_message_to_conversation", ToolSafety::Dangerous),
            ("list_calendars", ToolSafety::Safe),
            ("schedule_event", ToolSafety::Dangerous),
        ] {
            let (tool, executor) = echo_tool(name);
            registry.register(tool, executor, safety);
        }

        assert_eq!(
            registry.list_tools(),
            vec!["list_calendars", "schedule_event", "send_message_to_conversation"]
        );
        assert_eq!(
            registry.dangerous_tools(),
            vec!["schedule_event", "send_message_to_conversation"]
        );
        assert_eq!(registry.get_tools()[0].name, "list_calendars");
    }

    #[test]
    fn test_registry_get_tool() {
        let registry = ToolRegistry::new();
        let (tool, executor) = echo_tool("ask_context_chat");
        registry.register(tool, executor, ToolSafety::Safe);

        assert_eq!(
            registry.get_tool("ask_context_chat").map(|tool| tool.name),
            Some("ask_context_chat".to_string())
        );
        assert!(registry.get_tool("nonexistent").is_none());
        assert!(registry.safety("nonexistent").is_none());
    }

    #[tokio::test]
    async fn test_registry_execute() {
        let registry = ToolRegistry::new();
        let (tool, executor) = echo_tool("echo");
        registry.register(tool, executor, ToolSafety::Safe);

        let result = registry.execute("echo", r#"{"a":1}"#.to_string()).await;
        assert_eq!(result.expect("should succeed"), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_registry_execute_propagates_error() {
        let registry = ToolRegistry::new();
        let (tool, executor) = failing_tool("send_message_to_conversation");
        registry.register(tool, executor, ToolSafety::Dangerous);

        let result = registry
            .execute("send_message_to_conversation", "{}".to_string())
            .await;
        assert_eq!(
            result.expect_err("should fail").message,
            "Conversation not found: Random"
        );
    }

    #[tokio::test]
    async fn test_registry_execute_not_found() {
        let registry = ToolRegistry::new();

        let result = registry.execute("nonexistent", "{}".to_string()).await;
        assert!(result
            .expect_err("should fail")
            .message
            .contains("Tool not found"));
    }
}
