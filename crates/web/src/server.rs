//! Axum routes for the automation server

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use automation_runner::{JobRegistry, JobRequest, JobRunner, RunnerError};

use crate::config::ServerConfig;

/// Shared state behind every route.
pub struct AppState {
    pub runner: JobRunner,
}

pub type SharedState = Arc<AppState>;

/// Body accepted by every run route; both fields are optional and the body
/// itself may be absent.
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    /// Request a visible browser window (default true).
    pub headed: Option<bool>,
    /// Alternate spec file for this run.
    pub spec: Option<String>,
}

/// Build the router: `/health` plus one run route per registered job.
pub fn router(state: SharedState) -> Router {
    let mut router = Router::new().route("/health", get(health_handler));

    let names: Vec<String> = state
        .runner
        .registry()
        .names()
        .map(str::to_string)
        .collect();
    for name in names {
        let path = format!("/api/automation/run-{name}");
        router = router.route(
            &path,
            post(
                move |state: State<SharedState>, body: Option<Json<RunRequest>>| {
                    run_job_handler(state, name, body)
                },
            ),
        );
    }

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until a shutdown signal arrives, then stop any suite
/// that is still running.
pub async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
    let runner = JobRunner::new(JobRegistry::default(), cfg.runner);
    let state = Arc::new(AppState { runner });

    let listener = tokio::net::TcpListener::bind(cfg.addr).await?;
    info!(
        "Automation server listening on http://{}",
        listener.local_addr()?
    );

    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown_state))
        .await?;

    Ok(())
}

/// Wait for SIGINT/SIGTERM, then stop any in-flight suite right away.
///
/// The stop must happen here, when the signal arrives: graceful shutdown
/// drains open connections, and the run handler holds its connection until
/// the suite resolves, so waiting for `serve` to return would sit out the
/// rest of the run's budget first.
async fn shutdown_signal(state: SharedState) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
    state.runner.terminate_inflight();
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Automation server is running",
    }))
}

async fn run_job_handler(
    State(state): State<SharedState>,
    job: String,
    body: Option<Json<RunRequest>>,
) -> Response {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let request = JobRequest {
        name: job,
        headed: body.headed.unwrap_or(true),
        spec_override: body.spec,
    };
    info!(
        job = %request.name,
        headed = request.headed,
        has_override = request.spec_override.is_some(),
        "run requested"
    );

    match state.runner.submit(request).await {
        Ok(result) => {
            let status = if result.success {
                StatusCode::OK
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(result)).into_response()
        }
        Err(err @ RunnerError::Busy) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "success": false, "message": err.to_string() })),
        )
            .into_response(),
        Err(err @ RunnerError::UnknownJob(_)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "success": false, "message": err.to_string() })),
        )
            .into_response(),
    }
}
