//! Nextcloud Talk: conversations and chat messages

use crate::{client::NextcloudClient, error::NextcloudError};
use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

const ROOM_PATH: &str = "/ocs/v2.php/apps/spreed/api/v4/room";
const CHAT_PATH: &str = "/ocs/v2.php/apps/spreed/api/v1/chat";

/// A Talk conversation the user takes part in
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Conversation token, used in chat URLs
    pub token: String,
    /// Name shown to the user
    pub display_name: String,
}

/// A chat message
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Display name of the author
    #[serde(default)]
    pub actor_display_name: String,
    /// Message text (may contain `{placeholder}` parameters)
    #[serde(default)]
    pub message: String,
}

impl ChatMessage {
    /// `"<timestamp> <actor>: <message>"`
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{} {}: {}", self.timestamp, self.actor_display_name, self.message)
    }
}

fn parse<T: DeserializeOwned>(data: serde_json::Value, what: &str) -> Result<T, NextcloudError> {
    serde_json::from_value(data)
        .map_err(|e| NextcloudError::ResponseParseFailed(format!("Invalid {what}: {e}")))
}

impl NextcloudClient {
    /// List the user's Talk conversations
    ///
    /// # Errors
    ///
    /// Returns errors for failed requests or unexpected response shapes
    pub async fn conversations(&self) -> Result<Vec<Conversation>, NextcloudError> {
        let data = self.ocs(Method::GET, ROOM_PATH, None).await?;
        parse(data, "conversation list")
    }

    /// Post `message` to `conversation`
    ///
    /// # Errors
    ///
    /// Returns errors for failed requests
    pub async fn send_message(
        &self,
        conversation: &Conversation,
        message: &str,
    ) -> Result<(), NextcloudError> {
        let body = json!({ "message": message });
        self.ocs(
            Method::POST,
            &format!("{CHAT_PATH}/{}", urlencoding::encode(&conversation.token)),
            Some(&body),
        )
        .await?;

        tracing::info!(conversation = %conversation.display_name, "Sent Talk message");
        Ok(())
    }

    /// Fetch up to `limit` of the most recent messages of `conversation`
    ///
    /// # Errors
    ///
    /// Returns errors for failed requests or unexpected response shapes
    pub async fn receive_messages(
        &self,
        conversation: &Conversation,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, NextcloudError> {
        let path = format!(
            "{CHAT_PATH}/{}?lookIntoFuture=0&limit={limit}",
            urlencoding::encode(&conversation.token)
        );
        let data = self.ocs(Method::GET, &path, None).await?;
        parse(data, "message list")
    }
}
