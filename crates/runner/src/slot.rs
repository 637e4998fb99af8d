//! Single-flight run slot

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

/// What currently occupies the slot.
#[derive(Debug, Clone)]
pub struct ActiveRun {
    pub job: String,
    /// OS pid of the spawned suite, recorded once the child is up.
    pub pid: Option<u32>,
    pub started_at: Instant,
}

/// Cheap-clone handle to the single shared "a run is in progress" flag.
///
/// At most one [`RunGuard`] exists at a time. Dropping the guard clears the
/// slot, so release happens on every exit path of a run without the runner
/// having to remember it.
#[derive(Debug, Default, Clone)]
pub struct RunSlot {
    current: Arc<Mutex<Option<ActiveRun>>>,
}

impl RunSlot {
    /// Claim the slot for `job`, or return `None` if a run already holds it.
    pub fn try_acquire(&self, job: &str) -> Option<RunGuard> {
        let mut current = self.current.lock();
        if current.is_some() {
            return None;
        }
        *current = Some(ActiveRun {
            job: job.to_string(),
            pid: None,
            started_at: Instant::now(),
        });
        Some(RunGuard { slot: self.clone() })
    }

    /// Snapshot of the in-flight run, if any.
    pub fn current(&self) -> Option<ActiveRun> {
        self.current.lock().clone()
    }

    fn record_pid(&self, pid: u32) {
        if let Some(run) = self.current.lock().as_mut() {
            run.pid = Some(pid);
        }
    }

    fn release(&self) {
        *self.current.lock() = None;
    }
}

/// Exclusive hold on the run slot for the duration of one run.
pub struct RunGuard {
    slot: RunSlot,
}

impl RunGuard {
    pub fn record_pid(&self, pid: u32) {
        self.slot.record_pid(pid);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.slot.release();
    }
}
