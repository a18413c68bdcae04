//! # Context Agent Testing
//!
//! Testing utilities and helpers for the context agent.
//!
//! This crate provides:
//! - A scripted in-memory TaskProcessing service
//! - Builders for TaskProcessing response payloads
//! - Property-based testing strategies for task statuses
//!
//! ## Example
//!
//! ```ignore
//! use context_agent_nextcloud::AsyncTaskPoller;
//! use context_agent_testing::{helpers::task_data, ScriptedTaskProcessing};
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_answer() {
//!     let service = ScriptedTaskProcessing::new(task_data(1, "STATUS_SCHEDULED"))
//!         .then_respond(helpers::successful_task(1, json!("42")));
//!     let answer = AsyncTaskPoller::new(service.clone()).ask("?").await;
//!     assert_eq!(service.poll_count(), 1);
//! }
//! ```

use context_agent_nextcloud::taskprocessing::ScheduleRequest;
use context_agent_nextcloud::{NextcloudError, TaskId, TaskProcessing};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Mock implementations of the remote services
pub mod mocks {
    use super::{
        Arc, Instant, Mutex, NextcloudError, ScheduleRequest, TaskId, TaskProcessing, Value,
        VecDeque,
    };

    #[derive(Debug, Default)]
    struct ScriptState {
        responses: VecDeque<Value>,
        last: Option<Value>,
        requests: Vec<ScheduleRequest>,
        polled_ids: Vec<TaskId>,
        poll_times: Vec<Instant>,
    }

    /// TaskProcessing service answering from a script
    ///
    /// `schedule` always returns the configured submission payload. Each
    /// `fetch_task` pops the next scripted payload; once the script is
    /// exhausted the last one is repeated (the submission payload if nothing
    /// was scripted). Clones share the script and the recorded calls.
    #[derive(Debug, Clone)]
    pub struct ScriptedTaskProcessing {
        scheduled: Value,
        state: Arc<Mutex<ScriptState>>,
    }

    impl ScriptedTaskProcessing {
        /// Service whose `schedule` returns `scheduled`
        #[must_use]
        pub fn new(scheduled: Value) -> Self {
            Self {
                scheduled,
                state: Arc::new(Mutex::new(ScriptState::default())),
            }
        }

        /// Append a payload to the `fetch_task` script
        #[must_use]
        #[allow(clippy::expect_used)]
        pub fn then_respond(self, response: Value) -> Self {
            self.state
                .lock()
                .expect("script lock poisoned")
                .responses
                .push_back(response);
            self
        }

        /// Number of `fetch_task` calls so far
        #[must_use]
        #[allow(clippy::expect_used)]
        pub fn poll_count(&self) -> usize {
            self.state.lock().expect("script lock poisoned").poll_times.len()
        }

        /// Instants at which `fetch_task` was called
        #[must_use]
        #[allow(clippy::expect_used)]
        pub fn poll_times(&self) -> Vec<Instant> {
            self.state.lock().expect("script lock poisoned").poll_times.clone()
        }

        /// Task ids passed to `fetch_task`
        #[must_use]
        #[allow(clippy::expect_used)]
        pub fn polled_ids(&self) -> Vec<TaskId> {
            self.state.lock().expect("script lock poisoned").polled_ids.clone()
        }

        /// Requests passed to `schedule`
        #[must_use]
        #[allow(clippy::expect_used)]
        pub fn requests(&self) -> Vec<ScheduleRequest> {
            self.state.lock().expect("script lock poisoned").requests.clone()
        }
    }

    impl TaskProcessing for ScriptedTaskProcessing {
        #[allow(clippy::expect_used)]
        async fn schedule(&self, request: &ScheduleRequest) -> Result<Value, NextcloudError> {
            self.state
                .lock()
                .expect("script lock poisoned")
                .requests
                .push(request.clone());
            Ok(self.scheduled.clone())
        }

        #[allow(clippy::expect_used)]
        async fn fetch_task(&self, id: &TaskId) -> Result<Value, NextcloudError> {
            let mut state = self.state.lock().expect("script lock poisoned");
            state.polled_ids.push(id.clone());
            state.poll_times.push(Instant::now());

            let response = match state.responses.pop_front() {
                Some(next) => next,
                None => state.last.clone().unwrap_or_else(|| self.scheduled.clone()),
            };
            state.last = Some(response.clone());
            Ok(response)
        }
    }
}

/// Builders for TaskProcessing payloads and test setup
pub mod helpers {
    use serde_json::{json, Value};

    /// OCS `data` of a task with `status` and no output
    #[must_use]
    pub fn task_data(id: u64, status: &str) -> Value {
        json!({"task": {"id": id, "status": status, "output": null}})
    }

    /// OCS `data` of a successful task whose answer is `answer`
    #[must_use]
    pub fn successful_task(id: u64, answer: Value) -> Value {
        json!({
            "task": {
                "id": id,
                "status": "STATUS_SUCCESSFUL",
                "output": {"output": answer}
            }
        })
    }

    /// Send `tracing` output to the test harness
    ///
    /// Safe to call from every test; only the first call installs the
    /// subscriber. Filtered by `RUST_LOG`.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest
pub mod properties {
    use proptest::prelude::*;

    /// Any status label except the two terminal ones
    pub fn non_terminal_status() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("STATUS_SCHEDULED".to_string()),
            Just("STATUS_RUNNING".to_string()),
            Just("STATUS_UNKNOWN".to_string()),
            Just("STATUS_SUCCESFUL".to_string()),
            "[A-Za-z_]{0,24}",
        ]
        .prop_filter("terminal status", |status| {
            status != "STATUS_SUCCESSFUL" && status != "STATUS_FAILED"
        })
    }

    /// Any status label, terminal ones included
    pub fn any_status() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => non_terminal_status(),
            1 => Just("STATUS_SUCCESSFUL".to_string()),
            1 => Just("STATUS_FAILED".to_string()),
        ]
    }
}

// Re-export commonly used items
pub use mocks::ScriptedTaskProcessing;
