//! Talk tools: conversations and chat messages
//!
//! Conversations are addressed by display name, the way the user refers to
//! them; the token lookup happens on every call.

use crate::input::parse_input;
use context_agent_core::agent::{Tool, ToolError, ToolExecutorFn, ToolFuture};
use context_agent_nextcloud::{ChatMessage, Conversation, NextcloudClient};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Messages returned by `list_messages_in_conversation` when not specified
pub const DEFAULT_MESSAGE_COUNT: u32 = 30;

/// Conversations sharing a display name resolve to the last one listed
async fn find_conversation(
    client: &NextcloudClient,
    name: &str,
) -> Result<Conversation, ToolError> {
    client
        .conversations()
        .await
        .map_err(ToolError::new)?
        .into_iter()
        .rev()
        .find(|conversation| conversation.display_name == name)
        .ok_or_else(|| ToolError {
            message: format!("Conversation not found: {name}"),
        })
}

/// Create the `list_talk_conversations` tool
///
/// Returns the conversation names joined with `", "`.
#[must_use]
pub fn list_talk_conversations_tool(client: NextcloudClient) -> (Tool, ToolExecutorFn) {
    let tool = Tool {
        name: "list_talk_conversations".to_string(),
        description: "List all conversations in talk".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    };

    let executor = Arc::new(move |_input: String| {
        let client = client.clone();
        Box::pin(async move {
            let conversations = client.conversations().await.map_err(ToolError::new)?;
            Ok(conversations
                .iter()
                .map(|conversation| conversation.display_name.as_str())
                .collect::<Vec<_>>()
                .join(", "))
        }) as ToolFuture
    }) as ToolExecutorFn;

    (tool, executor)
}

#[derive(Debug, Deserialize)]
struct SendMessageInput {
    conversation_name: String,
    message: String,
}

/// Create the `send_message_to_conversation` tool
///
/// Posts a message and returns `true`.
#[must_use]
pub fn send_message_to_conversation_tool(client: NextcloudClient) -> (Tool, ToolExecutorFn) {
    let tool = Tool {
        name: "send_message_to_conversation".to_string(),
        description: "Send a message to a conversation in talk".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "conversation_name": {
                    "type": "string",
                    "description": "The name of the conversation to send a message to"
                },
                "message": {
                    "type": "string",
                    "description": "The message to send"
                }
            },
            "required": ["conversation_name", "message"]
        }),
    };

    let executor = Arc::new(move |input: String| {
        let client = client.clone();
        Box::pin(async move {
            let input: SendMessageInput = parse_input(&input)?;
            let conversation = find_conversation(&client, &input.conversation_name).await?;
            client
                .send_message(&conversation, &input.message)
                .await
                .map_err(ToolError::new)?;

            Ok(json!(true).to_string())
        }) as ToolFuture
    }) as ToolExecutorFn;

    (tool, executor)
}

#[derive(Debug, Deserialize)]
struct ListMessagesInput {
    conversation_name: String,
    #[serde(default)]
    n_messages: Option<u32>,
}

/// Create the `list_messages_in_conversation` tool
///
/// Returns a JSON array of `"<timestamp> <actor>: <message>"` strings.
#[must_use]
pub fn list_messages_in_conversation_tool(client: NextcloudClient) -> (Tool, ToolExecutorFn) {
    let tool = Tool {
        name: "list_messages_in_conversation".to_string(),
        description: "List messages of a conversation in talk".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "conversation_name": {
                    "type": "string",
                    "description": "The name of the conversation to list messages of"
                },
                "n_messages": {
                    "type": "integer",
                    "description": "The number of messages to receive",
                    "default": DEFAULT_MESSAGE_COUNT,
                    "minimum": 1
                }
            },
            "required": ["conversation_name"]
        }),
    };

    let executor = Arc::new(move |input: String| {
        let client = client.clone();
        Box::pin(async move {
            let input: ListMessagesInput = parse_input(&input)?;
            let limit = input.n_messages.unwrap_or(DEFAULT_MESSAGE_COUNT);
            let conversation = find_conversation(&client, &input.conversation_name).await?;

            let lines: Vec<String> = client
                .receive_messages(&conversation, limit)
                .await
                .map_err(ToolError::new)?
                .iter()
                .map(ChatMessage::to_line)
                .collect();

            Ok(json!(lines).to_string())
        }) as ToolFuture
    }) as ToolExecutorFn;

    (tool, executor)
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code can use expect
mod tests {
    use super::*;
    use context_agent_nextcloud::NextcloudConfig;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ocs_ok(data: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "ocs": {"meta": {"status": "ok", "statuscode": 200}, "data": data}
        }))
    }

    async fn talk_server() -> (MockServer, NextcloudClient) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ocs/v2.php/apps/spreed/api/v4/room"))
            .respond_with(ocs_ok(json!([
                {"token": "tok1", "displayName": "General"},
                {"token": "tok2", "displayName": "Project X"}
            ])))
            .mount(&server)
            .await;
        let client = NextcloudClient::new(NextcloudConfig::new(server.uri(), "alice", "secret"))
            .expect("client should build");
        (server, client)
    }

    #[tokio::test]
    async fn test_list_talk_conversations() {
        let (_server, client) = talk_server().await;
        let (tool, executor) = list_talk_conversations_tool(client);
        assert_eq!(tool.name, "list_talk_conversations");

        let result = executor("{}".to_string()).await;
        assert_eq!(result.expect("should succeed"), "General, Project X");
    }

    #[tokio::test]
    async fn test_send_message_to_conversation() {
        let (server, client) = talk_server().await;
        Mock::given(method("POST"))
            .and(path("/ocs/v2.php/apps/spreed/api/v1/chat/tok2"))
            .and(body_json(json!({"message": "Status update"})))
            .respond_with(ocs_ok(json!({"id": 5})))
            .expect(1)
            .mount(&server)
            .await;

        let (_tool, executor) = send_message_to_conversation_tool(client);
        let input =
            json!({"conversation_name": "Project X", "message": "Status update"}).to_string();

        assert_eq!(executor(input).await.expect("should succeed"), "true");
    }

    #[tokio::test]
    async fn test_send_message_unknown_conversation() {
        let (_server, client) = talk_server().await;
        let (_tool, executor) = send_message_to_conversation_tool(client);
        let input = json!({"conversation_name": "Random", "message": "Hi"}).to_string();

        let result = executor(input).await;
        assert_eq!(
            result.expect_err("should fail").message,
            "Conversation not found: Random"
        );
    }

    #[tokio::test]
    async fn test_send_message_duplicate_names_pick_last() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ocs/v2.php/apps/spreed/api/v4/room"))
            .respond_with(ocs_ok(json!([
                {"token": "old", "displayName": "Standup"},
                {"token": "new", "displayName": "Standup"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/ocs/v2.php/apps/spreed/api/v1/chat/new"))
            .respond_with(ocs_ok(json!({"id": 9})))
            .expect(1)
            .mount(&server)
            .await;
        let client = NextcloudClient::new(NextcloudConfig::new(server.uri(), "alice", "secret"))
            .expect("client should build");

        let (_tool, executor) = send_message_to_conversation_tool(client);
        let input = json!({"conversation_name": "Standup", "message": "Done"}).to_string();

        assert_eq!(executor(input).await.expect("should succeed"), "true");
    }

    #[tokio::test]
    async fn test_list_messages_default_count() {
        let (server, client) = talk_server().await;
        Mock::given(method("GET"))
            .and(path("/ocs/v2.php/apps/spreed/api/v1/chat/tok1"))
            .and(query_param("limit", "30"))
            .respond_with(ocs_ok(json!([
                {"timestamp": 1_700_000_000, "actorDisplayName": "Bob", "message": "Morning"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let (_tool, executor) = list_messages_in_conversation_tool(client);
        let result = executor(json!({"conversation_name": "General"}).to_string()).await;

        let lines: Vec<String> =
            serde_json::from_str(&result.expect("should succeed")).expect("valid JSON");
        assert_eq!(lines, vec!["1700000000 Bob: Morning"]);
    }

    #[tokio::test]
    async fn test_list_messages_custom_count() {
        let (server, client) = talk_server().await;
        Mock::given(method("GET"))
            .and(path("/ocs/v2.php/apps/spreed/api/v1/chat/tok1"))
            .and(query_param("limit", "5"))
            .respond_with(ocs_ok(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let (_tool, executor) = list_messages_in_conversation_tool(client);
        let input = json!({"conversation_name": "General", "n_messages": 5}).to_string();
        let result = executor(input).await;

        assert_eq!(result.expect("should succeed"), "[]");
    }
}
