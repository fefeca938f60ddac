//! External task poll cycles against a mocked process engine.
//!
//! Each test mounts fetch-and-lock and complete endpoints on a wiremock
//! server and checks the exact calls one `poll_once` makes. `expect(n)` is
//! verified when the mock server drops.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bpmn_gateway::config::WorkerConfig;
use bpmn_gateway::{BatchFailurePolicy, EngineApi, ExternalTaskWorker, RestEngineClient};

// =============================================================================
// HELPERS
// =============================================================================

const FETCH_PATH: &str = "/engine-rest/external-task/fetchAndLock";

fn worker_for(server: &MockServer, config: WorkerConfig) -> ExternalTaskWorker {
    let base = format!("{}/engine-rest", server.uri());
    let engine: Arc<dyn EngineApi> =
        Arc::new(RestEngineClient::new(&base, Duration::from_secs(2)).unwrap());
    ExternalTaskWorker::new(engine, &config)
}

fn complete_path(task_id: &str) -> String {
    format!("/engine-rest/external-task/{task_id}/complete")
}

fn expected_complete_body() -> serde_json::Value {
    json!({
        "workerId": "node-worker-1",
        "variables": {"processedBy": {"value": "Node.js Worker", "type": "String"}}
    })
}

async fn mount_fetch(server: &MockServer, tasks: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(FETCH_PATH))
        .and(body_json(json!({
            "workerId": "node-worker-1",
            "maxTasks": 1,
            "topics": [{"topicName": "process-in-node", "lockDuration": 10000}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(tasks))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_complete(server: &MockServer, task_id: &str, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path(complete_path(task_id)))
        .and(body_json(expected_complete_body()))
        .respond_with(ResponseTemplate::new(status))
        .expect(times)
        .mount(server)
        .await;
}

// =============================================================================
// CYCLES
// =============================================================================

#[tokio::test]
async fn single_task_is_completed_once() {
    let server = MockServer::start().await;
    mount_fetch(&server, json!([{"id": "t1", "topicName": "process-in-node"}])).await;
    mount_complete(&server, "t1", 204, 1).await;

    let report = worker_for(&server, WorkerConfig::default())
        .poll_once()
        .await;

    assert!(report.is_clean());
    assert_eq!(report.fetched, 1);
    assert_eq!(report.completed, 1);
}

#[tokio::test]
async fn task_with_untyped_variables_is_still_completed() {
    let server = MockServer::start().await;
    mount_fetch(
        &server,
        json!([{
            "id": "t1",
            "processInstanceId": "pi-1",
            "variables": {
                "applicantName": {"value": "Alice", "type": "String", "valueInfo": {}},
                "attachment": {
                    "type": "File",
                    "valueInfo": {"filename": "cv.pdf", "mimeType": "application/pdf"}
                }
            }
        }]),
    )
    .await;
    mount_complete(&server, "t1", 204, 1).await;

    let report = worker_for(&server, WorkerConfig::default())
        .poll_once()
        .await;

    assert!(!report.fetch_failed);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.completed, 1);
}

#[tokio::test]
async fn empty_fetch_makes_no_completion_calls() {
    let server = MockServer::start().await;
    mount_fetch(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/engine-rest/external-task/t1/complete"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let report = worker_for(&server, WorkerConfig::default())
        .poll_once()
        .await;

    assert!(report.is_clean());
    assert_eq!(report.fetched, 0);
    assert_eq!(report.completed, 0);
}

#[tokio::test]
async fn batch_larger_than_max_tasks_is_fully_handled() {
    // The engine may return more than asked for; every task gets completed.
    let server = MockServer::start().await;
    mount_fetch(&server, json!([{"id": "t1"}, {"id": "t2"}, {"id": "t3"}])).await;
    mount_complete(&server, "t1", 204, 1).await;
    mount_complete(&server, "t2", 204, 1).await;
    mount_complete(&server, "t3", 204, 1).await;

    let report = worker_for(&server, WorkerConfig::default())
        .poll_once()
        .await;

    assert_eq!(report.fetched, 3);
    assert_eq!(report.completed, 3);
}

#[tokio::test]
async fn completion_failure_does_not_abort_batch() {
    let server = MockServer::start().await;
    mount_fetch(&server, json!([{"id": "t1"}, {"id": "t2"}, {"id": "t3"}])).await;
    mount_complete(&server, "t1", 204, 1).await;
    mount_complete(&server, "t2", 500, 1).await;
    mount_complete(&server, "t3", 204, 1).await;

    let report = worker_for(&server, WorkerConfig::default())
        .poll_once()
        .await;

    assert_eq!(report.completed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 0);
}

#[tokio::test]
async fn abort_policy_leaves_rest_of_batch_untouched() {
    let server = MockServer::start().await;
    mount_fetch(&server, json!([{"id": "t1"}, {"id": "t2"}, {"id": "t3"}])).await;
    mount_complete(&server, "t1", 500, 1).await;
    mount_complete(&server, "t2", 204, 0).await;
    mount_complete(&server, "t3", 204, 0).await;

    let config = WorkerConfig {
        batch_failure_policy: BatchFailurePolicy::Abort,
        ..WorkerConfig::default()
    };
    let report = worker_for(&server, config).poll_once().await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.completed, 0);
}

#[tokio::test]
async fn fetch_error_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FETCH_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "type": "ProcessEngineException",
            "message": "database unavailable"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = worker_for(&server, WorkerConfig::default())
        .poll_once()
        .await;

    assert!(report.fetch_failed);
    assert_eq!(report.fetched, 0);
}

#[tokio::test]
async fn slow_engine_is_cut_off_by_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FETCH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let base = format!("{}/engine-rest", server.uri());
    let engine: Arc<dyn EngineApi> =
        Arc::new(RestEngineClient::new(&base, Duration::from_millis(200)).unwrap());
    let worker = ExternalTaskWorker::new(engine, &WorkerConfig::default());

    let started = std::time::Instant::now();
    let report = worker.poll_once().await;

    assert!(report.fetch_failed);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn custom_identity_and_label_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FETCH_PATH))
        .and(body_json(json!({
            "workerId": "rust-worker-7",
            "maxTasks": 3,
            "topics": [{"topicName": "invoices", "lockDuration": 60000}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "inv-1"}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(complete_path("inv-1")))
        .and(body_json(json!({
            "workerId": "rust-worker-7",
            "variables": {"handledBy": {"value": "Rust Worker", "type": "String"}}
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = WorkerConfig {
        worker_id: "rust-worker-7".into(),
        topic_name: "invoices".into(),
        lock_duration_ms: 60_000,
        max_tasks: 3,
        result_variable: "handledBy".into(),
        result_label: "Rust Worker".into(),
        ..WorkerConfig::default()
    };
    let report = worker_for(&server, config).poll_once().await;

    assert_eq!(report.completed, 1);
}
