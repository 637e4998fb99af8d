//! HTTP contract tests against a server bound to an ephemeral port, with a
//! stub executable standing in for `npx`.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use automation_runner::{HostCapabilities, JobRegistry, JobRunner, RunnerConfig};
use automation_web::{router, AppState};

/// Spawn a server whose runner invokes the given stub body, returning the
/// base URL.
async fn spawn_server(dir: &TempDir, stub_body: &str, timeout: Duration) -> String {
    use std::os::unix::fs::PermissionsExt;

    let program = dir.path().join("stub.sh");
    std::fs::write(&program, format!("#!/bin/sh\n{stub_body}\n")).unwrap();
    let mut perms = std::fs::metadata(&program).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&program, perms).unwrap();

    let config = RunnerConfig {
        project_root: dir.path().to_path_buf(),
        timeout,
        program,
        capabilities: HostCapabilities {
            has_display: false,
            force_headed: false,
        },
    };
    let state = Arc::new(AppState {
        runner: JobRunner::new(JobRegistry::default(), config),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir, "exit 0", Duration::from_secs(5)).await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn successful_run_returns_200_with_result() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(
        &dir,
        "sleep 0.05\necho suite passed\nexit 0",
        Duration::from_secs(5),
    )
    .await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/api/automation/run-login"))
        .json(&serde_json::json!({ "headed": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["exitCode"], 0);
    assert_eq!(body["timedOut"], false);
    assert!(body["stdout"].as_str().unwrap().contains("suite passed"));
}

#[tokio::test]
async fn run_accepts_empty_body() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir, "exit 0", Duration::from_secs(5)).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/api/automation/run-course-creation"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn failed_run_returns_500_with_result() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir, "echo boom >&2\nexit 2", Duration::from_secs(5)).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/api/automation/run-purchase"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["exitCode"], 2);
    assert!(body["stderr"].as_str().unwrap().contains("boom"));
}

#[tokio::test]
async fn timed_out_run_returns_500_with_timed_out_flag() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir, "sleep 10", Duration::from_millis(200)).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/api/automation/run-login"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["timedOut"], true);
}

#[tokio::test]
async fn concurrent_run_is_rejected_with_409() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir, "sleep 1\nexit 0", Duration::from_secs(10)).await;

    let client = reqwest::Client::new();
    let first = {
        let client = client.clone();
        let url = format!("{base}/api/automation/run-login");
        tokio::spawn(async move { client.post(url).send().await.unwrap() })
    };

    tokio::time::sleep(Duration::from_millis(200)).await;

    let second = client
        .post(format!("{base}/api/automation/run-purchase"))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("in progress"));

    // The first run is unaffected by the rejected one.
    let first = first.await.unwrap();
    assert_eq!(first.status(), 200);
}

#[tokio::test]
async fn unregistered_job_route_is_404() {
    let dir = TempDir::new().unwrap();
    let base = spawn_server(&dir, "exit 0", Duration::from_secs(5)).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/api/automation/run-no-such-job"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
