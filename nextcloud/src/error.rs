//! Error types for the Nextcloud client

use thiserror::Error;

/// Errors that can occur when talking to a Nextcloud server
#[derive(Debug, Error)]
pub enum NextcloudError {
    /// Required configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Server answered with a non-success HTTP status
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// OCS envelope reported a failure
    #[error("OCS error (statuscode {statuscode}): {message}")]
    OcsError {
        /// OCS status code from `ocs.meta.statuscode`
        statuscode: u16,
        /// Message from `ocs.meta.message`
        message: String,
    },

    /// Response body could not be parsed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),
}

impl From<reqwest::Error> for NextcloudError {
    fn from(error: reqwest::Error) -> Self {
        Self::RequestFailed(error.to_string())
    }
}

/// Errors from the TaskProcessing poller
///
/// An explicit `STATUS_FAILED` and running out of poll attempts both map to
/// [`TaskProcessingError::TaskFailed`].
#[derive(Debug, Error)]
pub enum TaskProcessingError {
    /// Schedule or status response did not match the task schema
    #[error("Failed to parse Nextcloud TaskProcessing task result: {0}")]
    MalformedResponse(String),

    /// Task did not finish successfully
    #[error("Nextcloud TaskProcessing task {id} failed")]
    TaskFailed {
        /// Id of the task that failed
        id: String,
    },

    /// Task succeeded but its output has no `output` key
    #[error("\"output\" key not found in Nextcloud TaskProcessing task result")]
    MalformedOutput,

    /// Request to the server failed
    #[error(transparent)]
    Transport(#[from] NextcloudError),
}
