//! Collaboration tools for the context agent
//!
//! Each tool is a `(Tool, ToolExecutorFn)` pair: a JSON-schema definition an
//! LLM can pick from, and an executor that takes the chosen arguments as a
//! JSON string and returns a textual result.
//!
//! ## Safe and dangerous tools
//!
//! Tools that only read data are **safe**. Tools that change something on
//! the user's behalf (creating calendar events, posting chat messages) are
//! **dangerous**: a host should confirm them with the user before running.
//! [`get_tools`] returns the two groups separately.
//!
//! ## Modules
//!
//! - `calendar`: `list_calendars`, `schedule_event`
//! - `talk`: `list_talk_conversations`, `send_message_to_conversation`,
//!   `list_messages_in_conversation`
//! - `geocoding`: `get_coordinates_for_address`
//! - `weather`: `get_current_weather_for_coordinates`
//! - `context_chat`: `ask_context_chat`
//! - `registry`: Tool registry for dynamic tool management
//! - `http`: Size-limited JSON client for public web APIs
//! - `config`: Endpoints of the public web APIs

pub mod calendar;
pub mod config;
pub mod context_chat;
pub mod geocoding;
pub mod http;
pub mod input;
pub mod registry;
pub mod talk;
pub mod weather;

pub use context_agent_core::agent::{Tool, ToolError, ToolExecutorFn, ToolResult, ToolSafety};

// Re-export commonly used types
pub use config::ToolsConfig;
pub use registry::ToolRegistry;

use context_agent_nextcloud::NextcloudClient;
use geocoding::GeocodingClient;
use http::PublicApiClient;
use weather::WeatherClient;

/// All tools, split by safety class
pub struct ToolSet {
    /// Read-only tools
    pub safe: Vec<(Tool, ToolExecutorFn)>,
    /// Tools that act on the user's behalf
    pub dangerous: Vec<(Tool, ToolExecutorFn)>,
}

impl ToolSet {
    /// Register every tool with its safety class
    #[must_use]
    pub fn into_registry(self) -> ToolRegistry {
        let registry = ToolRegistry::new();
        for (tool, executor) in self.safe {
            registry.register(tool, executor, ToolSafety::Safe);
        }
        for (tool, executor) in self.dangerous {
            registry.register(tool, executor, ToolSafety::Dangerous);
        }
        registry
    }
}

/// Build every tool against one Nextcloud account
///
/// # Errors
///
/// Returns `ToolError` if the HTTP client for the public APIs cannot be built
pub fn get_tools(client: &NextcloudClient, config: &ToolsConfig) -> Result<ToolSet, ToolError> {
    let http = PublicApiClient::new()?;
    let geocoding = GeocodingClient::new(http.clone(), config.geocoding_url.clone());
    let weather = WeatherClient::new(http, config.weather_url.clone());

    Ok(ToolSet {
        safe: vec![
            calendar::list_calendars_tool(client.clone()),
            talk::list_talk_conversations_tool(client.clone()),
            talk::list_messages_in_conversation_tool(client.clone()),
            geocoding::get_coordinates_for_address_tool(geocoding),
            weather::get_current_weather_for_coordinates_tool(weather),
            context_chat::ask_context_chat_tool(client.clone()),
        ],
        dangerous: vec![
            calendar::schedule_event_tool(client.clone()),
            talk::send_message_to_conversation_tool(client.clone()),
        ],
    })
}
