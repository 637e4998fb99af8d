//! Environment-driven server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use automation_runner::RunnerConfig;

const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub addr: SocketAddr,
    /// Configuration handed to the job runner.
    pub runner: RunnerConfig,
}

impl ServerConfig {
    /// Build the configuration from the environment.
    ///
    /// - `AUTOMATION_PORT` - listen port (default 3001)
    /// - `AUTOMATION_TIMEOUT_MS` - per-run budget (default 8 minutes)
    /// - `AUTOMATION_PROJECT_ROOT` - Playwright project directory (default ".")
    /// - `FORCE_HEADED` - consumed by capability detection
    pub fn from_env() -> Self {
        let port = env_parse("AUTOMATION_PORT", DEFAULT_PORT);

        let mut runner = RunnerConfig::default();
        if let Some(timeout_ms) = env_opt::<u64>("AUTOMATION_TIMEOUT_MS") {
            runner.timeout = Duration::from_millis(timeout_ms);
        }
        if let Ok(root) = std::env::var("AUTOMATION_PROJECT_ROOT") {
            if !root.trim().is_empty() {
                runner.project_root = PathBuf::from(root.trim());
            }
        }

        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            runner,
        }
    }
}

fn env_opt<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env_opt(key).unwrap_or(default)
}
