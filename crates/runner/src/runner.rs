//! The exclusive job runner - one Playwright suite at a time

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::environment::{ExecutionEnvironment, HostCapabilities};
use crate::error::{RunnerError, RunnerResult};
use crate::registry::JobRegistry;
use crate::slot::{ActiveRun, RunGuard, RunSlot};

/// Default wall-clock budget per run (8 minutes, like the suites need).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8 * 60);

/// Grace period between SIGTERM and a hard kill on timeout.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// One request to execute a named job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub name: String,
    /// Whether the caller wants a visible browser window.
    pub headed: bool,
    /// Alternate spec file, replacing the registered one for this run only.
    pub spec_override: Option<String>,
}

impl JobRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headed: true,
            spec_override: None,
        }
    }
}

/// Outcome of a completed or aborted run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub success: bool,
    pub message: String,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub timed_out: bool,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

/// Configuration for the runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory containing the Playwright project (cwd for the child).
    pub project_root: PathBuf,
    /// Wall-clock budget per run.
    pub timeout: Duration,
    /// Program used to launch suites; `npx` in production, a stub in tests.
    pub program: PathBuf,
    /// Host display facts, detected once at startup.
    pub capabilities: HostCapabilities,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            timeout: DEFAULT_TIMEOUT,
            program: default_program(),
            capabilities: HostCapabilities::detect(),
        }
    }
}

fn default_program() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("npx.cmd")
    } else {
        PathBuf::from("npx")
    }
}

/// Serializes execution of the registered automation suites.
pub struct JobRunner {
    registry: JobRegistry,
    config: RunnerConfig,
    slot: RunSlot,
}

impl JobRunner {
    pub fn new(registry: JobRegistry, config: RunnerConfig) -> Self {
        Self {
            registry,
            config,
            slot: RunSlot::default(),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Snapshot of the in-flight run, if any.
    pub fn current_run(&self) -> Option<ActiveRun> {
        self.slot.current()
    }

    /// Execute one job to completion.
    ///
    /// Rejects immediately with [`RunnerError::UnknownJob`] for names not in
    /// the registry and with [`RunnerError::Busy`] while another run holds
    /// the slot; neither rejection spawns a process. Every accepted
    /// submission resolves to exactly one [`JobResult`] and releases the
    /// slot before returning, whatever the outcome.
    pub async fn submit(&self, request: JobRequest) -> RunnerResult<JobResult> {
        let registered = self
            .registry
            .resolve(&request.name)
            .ok_or_else(|| RunnerError::UnknownJob(request.name.clone()))?;

        let script = request
            .spec_override
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| registered.to_path_buf());

        let guard = self
            .slot
            .try_acquire(&request.name)
            .ok_or(RunnerError::Busy)?;

        let env = ExecutionEnvironment::resolve(request.headed, &self.config.capabilities);
        info!(
            job = %request.name,
            script = %script.display(),
            headed = env.headed,
            requested_headed = request.headed,
            "starting run"
        );

        Ok(self.execute(&request.name, &script, &env, guard).await)
    }

    /// Signal the in-flight suite, if one exists (best-effort, Unix only).
    /// Used on server shutdown so a half-finished browser run does not
    /// outlive the process that launched it.
    pub fn terminate_inflight(&self) {
        let Some(run) = self.slot.current() else {
            return;
        };
        let Some(pid) = run.pid else {
            return;
        };
        info!(job = %run.job, pid, "terminating in-flight run");
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        }
    }

    async fn execute(
        &self,
        job: &str,
        script: &Path,
        env: &ExecutionEnvironment,
        guard: RunGuard,
    ) -> JobResult {
        let start = Instant::now();

        let mut cmd = Command::new(&self.config.program);
        cmd.args(suite_args(script, env.headed))
            .current_dir(&self.config.project_root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        env.apply(&mut cmd);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(job, error = %e, "failed to start run");
                return JobResult {
                    success: false,
                    message: format!("Failed to start test run: {e}"),
                    stdout: None,
                    stderr: None,
                    timed_out: false,
                    exit_code: None,
                    duration_ms: start.elapsed().as_millis() as u64,
                };
            }
        };

        if let Some(pid) = child.id() {
            guard.record_pid(pid);
        }

        let stdout_task = collect_lines(child.stdout.take(), "stdout");
        let stderr_task = collect_lines(child.stderr.take(), "stderr");

        let (status, timed_out) = match tokio::time::timeout(self.config.timeout, child.wait()).await
        {
            Ok(waited) => (waited, false),
            Err(_) => {
                warn!(
                    job,
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "run exceeded budget, terminating"
                );
                terminate(&mut child).await;
                (child.wait().await, true)
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        let duration_ms = start.elapsed().as_millis() as u64;

        match status {
            Ok(status) => {
                let exit_code = status.code();
                let success = !timed_out && status.success();
                let message = if timed_out {
                    "Test run timed out and was stopped".to_string()
                } else if success {
                    "Test run completed successfully".to_string()
                } else {
                    match exit_code {
                        Some(code) => format!("Test run failed with exit code {code}"),
                        None => "Test run was terminated by a signal".to_string(),
                    }
                };

                if success {
                    info!(job, duration_ms, "run succeeded");
                } else {
                    error!(job, duration_ms, message = %message, "run failed");
                }

                JobResult {
                    success,
                    message,
                    stdout: non_empty(stdout),
                    stderr: non_empty(stderr),
                    timed_out,
                    exit_code,
                    duration_ms,
                }
            }
            Err(e) => {
                error!(job, error = %e, "failed waiting for run to finish");
                JobResult {
                    success: false,
                    message: format!("Failed waiting for test run: {e}"),
                    stdout: non_empty(stdout),
                    stderr: non_empty(stderr),
                    timed_out,
                    exit_code: None,
                    duration_ms,
                }
            }
        }
        // guard drops here: the slot is free before submit's future resolves
    }
}

/// Arguments for one suite invocation, `npx <args..>`.
fn suite_args(script: &Path, headed: bool) -> Vec<String> {
    let mut args = vec![
        "playwright".to_string(),
        "test".to_string(),
        script.display().to_string(),
        "--project=chromium".to_string(),
        "--reporter=line".to_string(),
    ];
    if headed {
        args.push("--headed".to_string());
    }
    args
}

/// Best-effort termination: SIGTERM first, short grace, then a hard kill.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
            && tokio::time::timeout(KILL_GRACE, child.wait()).await.is_ok()
        {
            return;
        }
    }

    let _ = child.kill().await;
}

/// Stream a child pipe line by line: re-log each line as it arrives and
/// accumulate the whole stream for the result payload.
fn collect_lines<R>(pipe: Option<R>, stream: &'static str) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut collected = String::new();
        let Some(pipe) = pipe else {
            return collected;
        };
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(target: "automation_runner::suite", "[{stream}] {line}");
            collected.push_str(&line);
            collected.push('\n');
        }
        collected
    })
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_args_appends_headed_flag_only_when_headed() {
        let script = Path::new("tests/student/login.spec.js");

        let headless = suite_args(script, false);
        assert_eq!(headless[0], "playwright");
        assert_eq!(headless[2], "tests/student/login.spec.js");
        assert!(!headless.contains(&"--headed".to_string()));

        let headed = suite_args(script, true);
        assert_eq!(headed.last().map(String::as_str), Some("--headed"));
    }

    #[test]
    fn non_empty_trims_and_drops_blank_output() {
        assert_eq!(non_empty("  \n".to_string()), None);
        assert_eq!(non_empty("ok\n".to_string()), Some("ok".to_string()));
    }
}
