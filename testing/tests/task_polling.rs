//! End-to-end tests of the TaskProcessing poller against a scripted service

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use context_agent_nextcloud::{
    AsyncTaskPoller, TaskId, TaskProcessingError, TaskStatus, MAX_POLL_ATTEMPTS, POLL_INTERVAL,
};
use context_agent_testing::helpers::{init_tracing, successful_task, task_data};
use context_agent_testing::properties::{any_status, non_terminal_status};
use context_agent_testing::ScriptedTaskProcessing;
use context_agent_tools::context_chat::ask_context_chat_tool;
use proptest::prelude::*;
use serde_json::json;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_answer_after_two_pending_polls() {
    init_tracing();
    let service = ScriptedTaskProcessing::new(task_data(7, "STATUS_SCHEDULED"))
        .then_respond(task_data(7, "STATUS_RUNNING"))
        .then_respond(task_data(7, "STATUS_RUNNING"))
        .then_respond(successful_task(7, json!({"answer": "42"})));

    let answer = AsyncTaskPoller::new(service.clone())
        .ask("What is the answer?")
        .await
        .expect("task should succeed");

    assert_eq!(answer, json!({"answer": "42"}));
    assert_eq!(service.poll_count(), 3);
    assert_eq!(service.polled_ids(), vec![TaskId::Number(7); 3]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_task_stops_polling() {
    let service = ScriptedTaskProcessing::new(task_data(3, "STATUS_SCHEDULED"))
        .then_respond(task_data(3, "STATUS_RUNNING"))
        .then_respond(task_data(3, "STATUS_FAILED"));

    let result = AsyncTaskPoller::new(service.clone()).ask("Anything?").await;

    match result {
        Err(TaskProcessingError::TaskFailed { id }) => assert_eq!(id, "3"),
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    assert_eq!(service.poll_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unrecognised_status_exhausts_attempt_cap() {
    // A misspelled terminal label is just another non-terminal status
    let service = ScriptedTaskProcessing::new(task_data(5, "STATUS_SCHEDULED"))
        .then_respond(task_data(5, "STATUS_SUCCESFUL"));
    let started = Instant::now();

    let result = AsyncTaskPoller::new(service.clone()).ask("Still there?").await;

    assert!(matches!(result, Err(TaskProcessingError::TaskFailed { .. })));
    assert_eq!(service.poll_count(), MAX_POLL_ATTEMPTS as usize);
    assert_eq!(started.elapsed(), POLL_INTERVAL * MAX_POLL_ATTEMPTS);
}

#[tokio::test(start_paused = true)]
async fn test_unrecognised_submission_status_exhausts_attempt_cap() {
    let service = ScriptedTaskProcessing::new(task_data(1, "STATUS_SUCCEEDED_TYPO"));

    let result = AsyncTaskPoller::new(service.clone()).ask("Anyone?").await;

    match result {
        Err(TaskProcessingError::TaskFailed { id }) => assert_eq!(id, "1"),
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    assert_eq!(service.poll_count(), MAX_POLL_ATTEMPTS as usize);
    assert!(service.polled_ids().iter().all(|id| *id == TaskId::Number(1)));
}

#[tokio::test(start_paused = true)]
async fn test_polls_are_spaced_by_interval() {
    let service = ScriptedTaskProcessing::new(task_data(1, "STATUS_SCHEDULED"))
        .then_respond(task_data(1, "STATUS_RUNNING"))
        .then_respond(task_data(1, "STATUS_RUNNING"))
        .then_respond(task_data(1, "STATUS_RUNNING"))
        .then_respond(successful_task(1, json!("ok")));
    let started = Instant::now();

    AsyncTaskPoller::new(service.clone())
        .ask("Timing?")
        .await
        .expect("task should succeed");

    let times = service.poll_times();
    assert_eq!(times.len(), 4);
    assert_eq!(times[0] - started, POLL_INTERVAL);
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], POLL_INTERVAL);
    }
}

#[tokio::test(start_paused = true)]
async fn test_submit_reports_scheduled_task() {
    let service = ScriptedTaskProcessing::new(task_data(11, "STATUS_SCHEDULED"));
    let poller = AsyncTaskPoller::new(service.clone());

    let task = poller.submit("Where is the report?").await.expect("submit");

    assert_eq!(task.id, TaskId::Number(11));
    assert_eq!(task.status, TaskStatus::Other("STATUS_SCHEDULED".to_string()));
    assert_eq!(service.poll_count(), 0);

    let requests = service.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].input.prompt, "Where is the report?");
    assert_eq!(requests[0].task_type, "context_chat:context_chat");
}

#[tokio::test(start_paused = true)]
async fn test_already_finished_submission_is_not_polled() {
    let service = ScriptedTaskProcessing::new(successful_task(2, json!("instant")));
    let started = Instant::now();

    let answer = AsyncTaskPoller::new(service.clone())
        .ask("Quick one")
        .await
        .expect("task should succeed");

    assert_eq!(answer, json!("instant"));
    assert_eq!(service.poll_count(), 0);
    assert_eq!(started.elapsed(), std::time::Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_poll_response() {
    let service = ScriptedTaskProcessing::new(task_data(8, "STATUS_SCHEDULED"))
        .then_respond(json!({"task": {"status": "STATUS_RUNNING"}}));

    let result = AsyncTaskPoller::new(service.clone()).ask("Broken?").await;

    assert!(matches!(result, Err(TaskProcessingError::MalformedResponse(_))));
    assert_eq!(service.poll_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_successful_task_without_output() {
    let service = ScriptedTaskProcessing::new(task_data(6, "STATUS_SCHEDULED"))
        .then_respond(task_data(6, "STATUS_SUCCESSFUL"));

    let result = AsyncTaskPoller::new(service).ask("Empty?").await;

    assert!(matches!(result, Err(TaskProcessingError::MalformedOutput)));
}

#[tokio::test(start_paused = true)]
async fn test_ask_context_chat_tool_over_scripted_service() {
    let service = ScriptedTaskProcessing::new(task_data(21, "STATUS_SCHEDULED"))
        .then_respond(task_data(21, "STATUS_RUNNING"))
        .then_respond(successful_task(21, json!("Budget is in Finance/2025.ods")));

    let (tool, executor) = ask_context_chat_tool(service.clone());
    assert_eq!(tool.name, "ask_context_chat");

    let result = executor(json!({"question": "Where is the budget?"}).to_string()).await;

    assert_eq!(result.expect("tool should succeed"), "Budget is in Finance/2025.ods");
    assert_eq!(service.poll_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_ask_context_chat_tool_reports_failure() {
    let service = ScriptedTaskProcessing::new(task_data(22, "STATUS_SCHEDULED"))
        .then_respond(task_data(22, "STATUS_FAILED"));

    let (_tool, executor) = ask_context_chat_tool(service);
    let result = executor(json!({"question": "?"}).to_string()).await;

    assert_eq!(
        result.expect_err("tool should fail").message,
        "Nextcloud TaskProcessing task 22 failed"
    );
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("runtime should build")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_never_terminal_task_fails_at_cap(status in non_terminal_status()) {
        let service = ScriptedTaskProcessing::new(task_data(1, "STATUS_SCHEDULED"))
            .then_respond(task_data(1, &status));

        let result = paused_runtime().block_on(AsyncTaskPoller::new(service.clone()).ask("?"));

        let failed_at_cap = matches!(result, Err(TaskProcessingError::TaskFailed { .. }));
        prop_assert!(failed_at_cap);
        prop_assert_eq!(service.poll_count(), MAX_POLL_ATTEMPTS as usize);
    }

    #[test]
    fn prop_polling_stops_at_first_terminal_status(
        statuses in proptest::collection::vec(any_status(), 1..40)
    ) {
        let mut service = ScriptedTaskProcessing::new(task_data(1, "STATUS_SCHEDULED"));
        for status in &statuses {
            let response = if status == "STATUS_SUCCESSFUL" {
                successful_task(1, json!("done"))
            } else {
                task_data(1, status)
            };
            service = service.then_respond(response);
        }

        let result = paused_runtime().block_on(AsyncTaskPoller::new(service.clone()).ask("?"));

        let first_terminal = statuses
            .iter()
            .position(|status| status == "STATUS_SUCCESSFUL" || status == "STATUS_FAILED");
        match first_terminal {
            Some(index) => {
                prop_assert_eq!(service.poll_count(), index + 1);
                if statuses[index] == "STATUS_SUCCESSFUL" {
                    prop_assert_eq!(result.ok(), Some(json!("done")));
                } else {
                    let failed = matches!(result, Err(TaskProcessingError::TaskFailed { .. }));
                    prop_assert!(failed);
                }
            }
            None => {
                // The last scripted status repeats until the cap
                prop_assert_eq!(service.poll_count(), MAX_POLL_ATTEMPTS as usize);
                let failed = matches!(result, Err(TaskProcessingError::TaskFailed { .. }));
                prop_assert!(failed);
            }
        }
    }
}
