//! Nextcloud client for the context agent
//!
//! Covers the parts of a Nextcloud server the agent tools need:
//!
//! - `client`: authenticated OCS and WebDAV requests
//! - `calendar`: CalDAV calendar listing and event creation
//! - `talk`: Talk conversations and chat messages
//! - `taskprocessing`: scheduling a context chat task and polling it to completion
//!
//! ## Example
//!
//! ```no_run
//! use context_agent_nextcloud::{AsyncTaskPoller, NextcloudClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = NextcloudClient::from_env()?;
//! let answer = AsyncTaskPoller::new(client).ask("When is the offsite?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod calendar;
pub mod client;
pub mod config;
pub mod error;
pub mod talk;
pub mod taskprocessing;

pub use calendar::{Calendar, CalendarEvent, EventTiming};
pub use client::NextcloudClient;
pub use config::NextcloudConfig;
pub use error::{NextcloudError, TaskProcessingError};
pub use talk::{ChatMessage, Conversation};
pub use taskprocessing::{
    extract_result, AsyncTaskPoller, Task, TaskId, TaskProcessing, TaskStatus, MAX_POLL_ATTEMPTS,
    POLL_INTERVAL,
};
