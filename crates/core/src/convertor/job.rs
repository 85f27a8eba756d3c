//! Job tracking: the internal map entry and the caller-facing handle.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Weak;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

use super::formats::OutputFormat;
use super::types::{FileRef, JobSnapshot, JobState};

/// The jobs map: key (input file name) to tracked job. A key is present
/// iff a job for that input is non-terminal.
pub(crate) type JobsMap = RwLock<HashMap<String, ActiveJob>>;

/// A conversion tracked by the convertor. Owned exclusively by the jobs
/// map; the worker task removes the entry as its terminal transition.
pub(crate) struct ActiveJob {
    pub(crate) file: FileRef,
    pub(crate) format: OutputFormat,
    pub(crate) state: JobState,
    pub(crate) progress: f32,
    pub(crate) started_at: DateTime<Utc>,
    /// Signals cancellation to the worker; the worker observes it at its
    /// next suspension point.
    pub(crate) cancel_tx: broadcast::Sender<()>,
    /// The worker task, awaited (or aborted) during shutdown.
    pub(crate) task: JoinHandle<()>,
}

impl ActiveJob {
    pub(crate) fn snapshot(&self, key: &str) -> JobSnapshot {
        JobSnapshot {
            key: key.to_string(),
            file: self.file.clone(),
            format: self.format,
            state: self.state,
            progress: self.progress,
            started_at: self.started_at,
        }
    }
}

/// Handle to a submitted conversion, used to request cancellation.
///
/// The handle does not own the job: it holds the job key and a weak
/// reference to the convertor's jobs map. Once the job reaches a terminal
/// state (or the convertor is gone) the lookup misses and [`cancel`]
/// becomes a no-op.
///
/// [`cancel`]: JobHandle::cancel
#[derive(Clone)]
pub struct JobHandle {
    key: String,
    jobs: Weak<JobsMap>,
}

impl JobHandle {
    pub(crate) fn new(key: String, jobs: Weak<JobsMap>) -> Self {
        Self { key, jobs }
    }

    /// The job key (input file name).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Requests cancellation of the job.
    ///
    /// Safe to call from any task, any number of times, at any job state.
    /// Cancellation is not instantaneous: the worker observes the request
    /// at its next tick boundary and transitions to `Cancelled` before any
    /// further progress or completion event fires. Cancelling a job that
    /// already reached a terminal state is a no-op.
    pub async fn cancel(&self) {
        let Some(jobs) = self.jobs.upgrade() else {
            return;
        };
        let jobs = jobs.read().await;
        if let Some(job) = jobs.get(&self.key) {
            // No receiver means the worker already finished; nothing to do.
            let _ = job.cancel_tx.send(());
        }
    }

    /// Whether the job is still tracked (i.e. not yet terminal).
    pub async fn is_active(&self) -> bool {
        match self.jobs.upgrade() {
            Some(jobs) => jobs.read().await.contains_key(&self.key),
            None => false,
        }
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle").field("key", &self.key).finish()
    }
}
