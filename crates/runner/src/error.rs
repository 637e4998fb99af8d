//! Error types for the automation runner

use thiserror::Error;

/// Rejections that happen before any process is spawned.
///
/// Everything that can go wrong once a run has started (spawn failure,
/// nonzero exit, timeout) is classified inside [`crate::JobResult`]
/// instead, because the run itself is the answer to the caller.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("A test run is already in progress. Please wait for it to finish.")]
    Busy,

    #[error("Unknown job: {0}")]
    UnknownJob(String),
}

pub type RunnerResult<T> = Result<T, RunnerError>;
