//! Nextcloud TaskProcessing: scheduling a task and waiting for its result
//!
//! [`AsyncTaskPoller`] submits a `context_chat:context_chat` task, polls it at a
//! fixed interval until it reaches a terminal status or the attempt cap runs
//! out, and extracts `output["output"]` from the finished task.
//!
//! ```text
//! submit ──► Task{status: any}
//!              │
//!              ▼  non-terminal and attempts < 360
//!        sleep 5s ──► poll ──► Task{status}
//!              │
//!              ▼  STATUS_SUCCESSFUL | STATUS_FAILED | cap reached
//!        extract_result
//! ```
//!
//! The interval and the cap are fixed. Remote calls are never retried: a
//! transport or parse failure ends the whole operation.

use crate::{
    client::NextcloudClient,
    error::{NextcloudError, TaskProcessingError},
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Delay between two status polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Maximum number of status polls (30 minutes at [`POLL_INTERVAL`])
pub const MAX_POLL_ATTEMPTS: u32 = 60 * 6;

/// OCS path for scheduling a task
pub const SCHEDULE_PATH: &str = "/ocs/v1.php/taskprocessing/schedule";

/// Task type of the document question-answering task
pub const CONTEXT_CHAT_TASK_TYPE: &str = "context_chat:context_chat";

/// App id the tasks are scheduled for
pub const APP_ID: &str = "context_agent";

const STATUS_SUCCESSFUL: &str = "STATUS_SUCCESSFUL";
const STATUS_FAILED: &str = "STATUS_FAILED";

/// Task identifier assigned by the server
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    /// Numeric id (what Nextcloud sends)
    Number(u64),
    /// Textual id
    Text(String),
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => write!(f, "{id}"),
        }
    }
}

/// Task lifecycle status
///
/// Only [`TaskStatus::Successful`] and [`TaskStatus::Failed`] are terminal.
/// Every other label the server reports (`STATUS_SCHEDULED`,
/// `STATUS_RUNNING`, ...) is kept verbatim in [`TaskStatus::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// `STATUS_SUCCESSFUL`
    Successful,
    /// `STATUS_FAILED`
    Failed,
    /// Any non-terminal status
    Other(String),
}

impl TaskStatus {
    /// Whether no further transition can happen
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Successful | Self::Failed)
    }

    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Successful => STATUS_SUCCESSFUL,
            Self::Failed => STATUS_FAILED,
            Self::Other(status) => status,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            STATUS_SUCCESSFUL => Self::Successful,
            STATUS_FAILED => Self::Failed,
            _ => Self::Other(status),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(status) => status,
            terminal => terminal.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A TaskProcessing task as reported by the server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned id, fixed for the task's lifetime
    pub id: TaskId,
    /// Current status
    pub status: TaskStatus,
    /// Result payload; only meaningful once the task succeeded
    #[serde(default)]
    pub output: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TaskEnvelope {
    task: Task,
}

/// Input of a context chat task
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextChatInput {
    /// The question
    pub prompt: String,
    /// Scope kind; `none` searches all of the user's documents
    pub scope_type: String,
    /// Scoped source ids
    pub scope_list: Vec<String>,
    /// Scope metadata
    pub scope_list_meta: String,
}

impl ContextChatInput {
    /// Question over all documents, without a scope restriction
    #[must_use]
    pub fn unscoped(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            scope_type: "none".to_string(),
            scope_list: Vec::new(),
            scope_list_meta: String::new(),
        }
    }
}

/// Body of `POST /taskprocessing/schedule`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    /// Task type id
    #[serde(rename = "type")]
    pub task_type: String,
    /// Scheduling app id
    pub app_id: String,
    /// Task input
    pub input: ContextChatInput,
}

impl ScheduleRequest {
    /// Context chat request for `question`
    #[must_use]
    pub fn context_chat(question: impl Into<String>) -> Self {
        Self {
            task_type: CONTEXT_CHAT_TASK_TYPE.to_string(),
            app_id: APP_ID.to_string(),
            input: ContextChatInput::unscoped(question),
        }
    }
}

/// Remote side of the TaskProcessing API
///
/// Implementations return the raw OCS `data` value; parsing it into a
/// [`Task`] is the poller's job.
pub trait TaskProcessing: Send + Sync {
    /// Schedule a new task
    ///
    /// # Errors
    ///
    /// Returns `NextcloudError` if the request fails
    fn schedule(
        &self,
        request: &ScheduleRequest,
    ) -> impl Future<Output = Result<serde_json::Value, NextcloudError>> + Send;

    /// Fetch the current state of a task
    ///
    /// # Errors
    ///
    /// Returns `NextcloudError` if the request fails
    fn fetch_task(
        &self,
        id: &TaskId,
    ) -> impl Future<Output = Result<serde_json::Value, NextcloudError>> + Send;
}

impl TaskProcessing for NextcloudClient {
    async fn schedule(
        &self,
        request: &ScheduleRequest,
    ) -> Result<serde_json::Value, NextcloudError> {
        let body = serde_json::to_value(request)
            .map_err(|e| NextcloudError::RequestFailed(format!("Failed to encode task: {e}")))?;
        self.ocs(Method::POST, SCHEDULE_PATH, Some(&body)).await
    }

    async fn fetch_task(&self, id: &TaskId) -> Result<serde_json::Value, NextcloudError> {
        self.ocs(Method::GET, &format!("/ocs/v1.php/taskprocessing/task/{id}"), None)
            .await
    }
}

/// Parse an OCS `data` value of shape `{"task": {...}}`
///
/// # Errors
///
/// Returns `TaskProcessingError::MalformedResponse` on any schema mismatch
pub fn parse_task(data: serde_json::Value) -> Result<Task, TaskProcessingError> {
    serde_json::from_value::<TaskEnvelope>(data)
        .map(|envelope| envelope.task)
        .map_err(|e| TaskProcessingError::MalformedResponse(e.to_string()))
}

/// Extract `output["output"]` from a finished task
///
/// # Errors
///
/// - `TaskProcessingError::TaskFailed` unless the status is `STATUS_SUCCESSFUL`
///   (this includes tasks still running after the attempt cap)
/// - `TaskProcessingError::MalformedOutput` if the output is not an object
///   with an `output` key
pub fn extract_result(task: Task) -> Result<serde_json::Value, TaskProcessingError> {
    if task.status != TaskStatus::Successful {
        return Err(TaskProcessingError::TaskFailed {
            id: task.id.to_string(),
        });
    }

    match task.output {
        Some(serde_json::Value::Object(mut output)) => output
            .remove("output")
            .ok_or(TaskProcessingError::MalformedOutput),
        _ => Err(TaskProcessingError::MalformedOutput),
    }
}

/// Submits a task and waits for it with fixed-interval, bounded polling
#[derive(Clone, Debug)]
pub struct AsyncTaskPoller<T> {
    service: T,
}

impl<T: TaskProcessing> AsyncTaskPoller<T> {
    /// Create a poller over an injected TaskProcessing service
    #[must_use]
    pub const fn new(service: T) -> Self {
        Self { service }
    }

    /// Schedule a context chat task for `question`
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the request fails, `MalformedResponse` if the
    /// response is not a task
    pub async fn submit(&self, question: &str) -> Result<Task, TaskProcessingError> {
        let request = ScheduleRequest::context_chat(question);
        let task = parse_task(self.service.schedule(&request).await?)?;
        tracing::debug!(task_id = %task.id, status = %task.status, "Scheduled TaskProcessing task");
        Ok(task)
    }

    /// Fetch the current state of `task`
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the request fails, `MalformedResponse` if the
    /// response is not a task or carries a different id
    pub async fn poll(&self, task: &Task) -> Result<Task, TaskProcessingError> {
        let fetched = parse_task(self.service.fetch_task(&task.id).await?)?;

        if fetched.id.to_string() != task.id.to_string() {
            return Err(TaskProcessingError::MalformedResponse(format!(
                "Expected task {} but received task {}",
                task.id, fetched.id
            )));
        }

        tracing::debug!(
            task_id = %fetched.id,
            status = %fetched.status,
            "Fetched TaskProcessing task"
        );
        Ok(fetched)
    }

    /// Poll until the task is terminal or [`MAX_POLL_ATTEMPTS`] polls were made
    ///
    /// Sleeps [`POLL_INTERVAL`] before every poll. A task that is already
    /// terminal is returned without polling. The returned task may still be
    /// non-terminal when the cap ran out.
    ///
    /// # Errors
    ///
    /// Returns the first error of any poll
    pub async fn await_completion(&self, mut task: Task) -> Result<Task, TaskProcessingError> {
        let mut attempts = 0;

        while !task.status.is_terminal() && attempts < MAX_POLL_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;
            attempts += 1;
            task = self.poll(&task).await?;
        }

        if !task.status.is_terminal() {
            tracing::warn!(
                task_id = %task.id,
                status = %task.status,
                attempts,
                "TaskProcessing task still not finished, giving up"
            );
        }

        Ok(task)
    }

    /// Ask a question and wait for the answer
    ///
    /// # Errors
    ///
    /// Any error of [`Self::submit`], [`Self::await_completion`] or
    /// [`extract_result`]
    pub async fn ask(&self, question: &str) -> Result<serde_json::Value, TaskProcessingError> {
        let task = self.submit(question).await?;
        let task = self.await_completion(task).await?;
        extract_result(task)
    }
}
