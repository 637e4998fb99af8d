//! Exclusive job runner for Playwright automation suites
//!
//! This crate executes named browser-automation test jobs as child
//! processes, one at a time:
//! - A `JobRegistry` maps job names to Playwright spec files
//! - A single `RunSlot` enforces that at most one run is in flight;
//!   overlapping submissions are rejected, never queued
//! - `ExecutionEnvironment` decides headed vs headless per run based on
//!   what the host can actually render
//! - Each run has a wall-clock budget; runs that exceed it are terminated
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      JobRunner                             │
//! │  submit(JobRequest)                                        │
//! │    ├── registry.resolve(name)      -> spec path            │
//! │    ├── slot.try_acquire()          -> RunGuard | Busy      │
//! │    ├── ExecutionEnvironment::resolve(headed, caps)         │
//! │    ├── spawn `npx playwright test <spec> ...`              │
//! │    ├── stream + collect stdout/stderr                      │
//! │    └── wait with timeout           -> JobResult            │
//! │  (RunGuard drop releases the slot on every exit path)      │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod environment;
pub mod error;
pub mod registry;
pub mod runner;
pub mod slot;

pub use environment::{ExecutionEnvironment, HostCapabilities};
pub use error::{RunnerError, RunnerResult};
pub use registry::JobRegistry;
pub use runner::{JobRequest, JobResult, JobRunner, RunnerConfig, DEFAULT_TIMEOUT};
pub use slot::{ActiveRun, RunSlot};
