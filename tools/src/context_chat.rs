//! The `ask_context_chat` tool: questions about the user's documents
//!
//! Runs one TaskProcessing task per call and blocks the call until the task
//! finishes or the poller gives up (see
//! [`AsyncTaskPoller`](context_agent_nextcloud::AsyncTaskPoller)).

use crate::input::parse_input;
use context_agent_core::agent::{Tool, ToolError, ToolExecutorFn, ToolFuture};
use context_agent_nextcloud::{AsyncTaskPoller, TaskProcessing};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct AskInput {
    question: String,
}

/// Create the `ask_context_chat` tool over any TaskProcessing service
///
/// A textual answer is returned as-is; any other answer value is returned as
/// its JSON encoding.
#[must_use]
pub fn ask_context_chat_tool<T>(service: T) -> (Tool, ToolExecutorFn)
where
    T: TaskProcessing + 'static,
{
    let tool = Tool {
        name: "ask_context_chat".to_string(),
        description: "Ask the context chat oracle, which knows all of the user's documents, a question about them".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question to ask"
                }
            },
            "required": ["question"]
        }),
    };

    let poller = Arc::new(AsyncTaskPoller::new(service));

    let executor = Arc::new(move |input: String| {
        let poller = Arc::clone(&poller);
        Box::pin(async move {
            let input: AskInput = parse_input(&input)?;
            let answer = poller.ask(&input.question).await.map_err(ToolError::new)?;

            Ok(match answer {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            })
        }) as ToolFuture
    }) as ToolExecutorFn;

    (tool, executor)
}
