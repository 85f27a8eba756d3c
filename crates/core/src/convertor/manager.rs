//! The conversion job manager.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock, Semaphore};
use tracing::{debug, info, warn};

use super::backend::{BackendError, ConversionBackend};
use super::config::ConvertorConfig;
use super::error::ConvertorError;
use super::formats::{InputFormat, OutputFormat};
use super::job::{ActiveJob, JobHandle, JobsMap};
use super::observer::ConversionObserver;
use super::types::{ConvertorStatus, FileRef, JobState, JobSnapshot};

/// Manages asynchronous, cancellable conversion jobs.
///
/// One job per input file name: submitting a file whose name already has a
/// job in flight is rejected. Jobs run concurrently on a bounded worker
/// pool and report progress and exactly one terminal event per job to the
/// registered [`ConversionObserver`].
///
/// The jobs map is the single shared resource. Every logical operation on
/// it (check-and-insert, self-removal, drain) is one blocking lock
/// acquisition; the worker task is the sole writer of terminal outcomes,
/// so a cancel racing a natural completion resolves to whichever the
/// worker observes first.
pub struct Convertor {
    config: ConvertorConfig,
    backend: Arc<dyn ConversionBackend>,
    observer: Arc<dyn ConversionObserver>,
    worker_slots: Arc<Semaphore>,
    jobs: Arc<JobsMap>,
    running: AtomicBool,
}

impl Convertor {
    /// Creates a new convertor. Jobs submitted via [`convert`] run against
    /// `backend` and report to `observer`.
    ///
    /// [`convert`]: Convertor::convert
    pub fn new(
        config: ConvertorConfig,
        backend: Arc<dyn ConversionBackend>,
        observer: Arc<dyn ConversionObserver>,
    ) -> Self {
        let worker_slots = Arc::new(Semaphore::new(config.max_parallel_conversions.max(1)));

        Self {
            config,
            backend,
            observer,
            worker_slots,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            running: AtomicBool::new(true),
        }
    }

    /// Submits a conversion job for `file` targeting `format`.
    ///
    /// Validates that the file carries the expected input extension, then
    /// atomically checks for an in-flight job under the same name and
    /// registers the new one. Returns immediately; the conversion proceeds
    /// in the background and its outcome is delivered to the observer.
    pub async fn convert(
        &self,
        file: FileRef,
        format: OutputFormat,
    ) -> Result<JobHandle, ConvertorError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(ConvertorError::ShutDown);
        }

        if file.extension != InputFormat::Shapr.extension() {
            return Err(ConvertorError::InvalidInputFormat { file });
        }

        let key = file.name.clone();

        // Check-and-insert under one write lock: two racing converts for
        // the same name cannot both pass the duplicate check.
        let mut jobs = self.jobs.write().await;

        // Shutdown may have drained the map while this submission was
        // waiting for the lock; a job inserted now would never be
        // signalled, so re-check the flag with the lock held.
        if !self.running.load(Ordering::SeqCst) {
            return Err(ConvertorError::ShutDown);
        }

        if jobs.contains_key(&key) {
            return Err(ConvertorError::AlreadyInProgress { name: key });
        }

        let (cancel_tx, cancel_rx) = broadcast::channel(1);

        let task = tokio::spawn(Self::run_job(
            key.clone(),
            file.clone(),
            format,
            Arc::clone(&self.backend),
            Arc::clone(&self.observer),
            Arc::clone(&self.jobs),
            Arc::clone(&self.worker_slots),
            Duration::from_millis(self.config.tick_interval_ms),
            cancel_rx,
        ));

        jobs.insert(
            key.clone(),
            ActiveJob {
                file,
                format,
                state: JobState::Pending,
                progress: 0.0,
                started_at: Utc::now(),
                cancel_tx,
                task,
            },
        );
        drop(jobs);

        debug!(%key, %format, "Conversion job registered");

        Ok(JobHandle::new(key, Arc::downgrade(&self.jobs)))
    }

    /// Submits a conversion job for each file, sequentially.
    ///
    /// Fail-fast: the first rejected file aborts the batch and its error is
    /// returned, but jobs started for earlier files keep running. A name
    /// appearing twice in one batch fails its second occurrence with
    /// [`ConvertorError::AlreadyInProgress`]. Callers needing all-or-nothing
    /// semantics must validate every file before submitting.
    pub async fn convert_batch(
        &self,
        files: Vec<FileRef>,
        format: OutputFormat,
    ) -> Result<Vec<JobHandle>, ConvertorError> {
        let mut handles = Vec::with_capacity(files.len());
        for file in files {
            handles.push(self.convert(file, format).await?);
        }
        Ok(handles)
    }

    /// Cancels every tracked job and waits for each to acknowledge.
    ///
    /// Blocks until every worker has delivered its terminal event or the
    /// configured grace period elapses. The grace period bounds the whole
    /// teardown; workers still running at the deadline are aborted.
    /// Afterwards the jobs map is empty and [`convert`] returns
    /// [`ConvertorError::ShutDown`]. Safe to call once; repeated calls are
    /// no-ops.
    ///
    /// [`convert`]: Convertor::convert
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Convertor already shut down");
            return;
        }

        info!("Shutting down convertor");

        // Drain first so no terminal race can re-observe these entries,
        // then signal every worker. The lock is not held while waiting, so
        // workers that are concurrently completing can still finish.
        let drained: Vec<(String, ActiveJob)> = {
            let mut jobs = self.jobs.write().await;
            jobs.drain().collect()
        };

        for (_, job) in &drained {
            let _ = job.cancel_tx.send(());
        }

        // One grace period bounds the whole drain, not each job.
        let deadline =
            tokio::time::Instant::now() + Duration::from_millis(self.config.shutdown_grace_ms);
        for (key, job) in drained {
            let mut task = job.task;
            match tokio::time::timeout_at(deadline, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(%key, error = %e, "Conversion worker terminated abnormally"),
                Err(_) => {
                    warn!(%key, "Job did not stop within grace period, aborting worker");
                    task.abort();
                }
            }
        }

        info!("Convertor shut down");
    }

    /// Returns the current convertor status with a snapshot of every
    /// tracked job.
    pub async fn status(&self) -> ConvertorStatus {
        let jobs = self.jobs.read().await;
        let mut snapshots: Vec<JobSnapshot> =
            jobs.iter().map(|(key, job)| job.snapshot(key)).collect();
        snapshots.sort_by(|a, b| a.key.cmp(&b.key));

        ConvertorStatus {
            running: self.running.load(Ordering::Relaxed),
            active_jobs: snapshots.len(),
            jobs: snapshots,
        }
    }

    /// Runs one conversion job to its terminal state.
    ///
    /// This task is the only writer of the job's terminal outcome: cancel
    /// requests merely signal, and are observed here at suspension points.
    /// Every exit path removes the map entry and emits exactly one
    /// terminal event.
    #[allow(clippy::too_many_arguments)]
    async fn run_job(
        key: String,
        file: FileRef,
        format: OutputFormat,
        backend: Arc<dyn ConversionBackend>,
        observer: Arc<dyn ConversionObserver>,
        jobs: Arc<JobsMap>,
        worker_slots: Arc<Semaphore>,
        tick_interval: Duration,
        mut cancel_rx: broadcast::Receiver<()>,
    ) {
        // Wait for a worker slot; cancellation can arrive while queued.
        let _permit = tokio::select! {
            biased;
            _ = cancel_rx.recv() => {
                Self::finish_cancelled(&key, &file, format, &jobs, &observer).await;
                return;
            }
            permit = Arc::clone(&worker_slots).acquire_owned() => match permit {
                Ok(permit) => permit,
                // A closed pool means teardown; treat it like a cancel
                // so the map entry and terminal event still happen.
                Err(_) => {
                    Self::finish_cancelled(&key, &file, format, &jobs, &observer).await;
                    return;
                }
            },
        };

        {
            let mut jobs = jobs.write().await;
            if let Some(job) = jobs.get_mut(&key) {
                job.state = JobState::Running;
            }
        }
        debug!(%key, %format, backend = backend.name(), "Conversion running");

        let mut ticks = match backend.start(&file, format).await {
            Ok(ticks) => ticks,
            Err(e) => {
                Self::finish_failed(&key, &file, format, &e, &jobs, &observer).await;
                return;
            }
        };

        let mut last_progress = 0.0_f32;
        loop {
            tokio::select! {
                biased;
                _ = cancel_rx.recv() => {
                    Self::finish_cancelled(&key, &file, format, &jobs, &observer).await;
                    return;
                }
                _ = tokio::time::sleep(tick_interval) => {
                    match ticks.tick().await {
                        Ok(progress) if progress >= 1.0 => {
                            let converted = ticks.output();
                            Self::finish_completed(&key, &file, &converted, &jobs, &observer).await;
                            return;
                        }
                        // The tick source only promises non-decreasing
                        // values; observers are promised strictly
                        // increasing ones, so plateaus are swallowed.
                        Ok(progress) if progress > last_progress => {
                            last_progress = progress;
                            {
                                let mut jobs = jobs.write().await;
                                if let Some(job) = jobs.get_mut(&key) {
                                    job.progress = progress;
                                }
                            }
                            observer.on_progress(&file, format, progress).await;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            Self::finish_failed(&key, &file, format, &e, &jobs, &observer).await;
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn finish_completed(
        key: &str,
        file: &FileRef,
        converted: &FileRef,
        jobs: &Arc<JobsMap>,
        observer: &Arc<dyn ConversionObserver>,
    ) {
        jobs.write().await.remove(key);
        info!(key, output = %converted.file_name(), "Conversion completed");
        observer.on_completed(file, converted).await;
    }

    async fn finish_cancelled(
        key: &str,
        file: &FileRef,
        format: OutputFormat,
        jobs: &Arc<JobsMap>,
        observer: &Arc<dyn ConversionObserver>,
    ) {
        jobs.write().await.remove(key);
        info!(key, %format, "Conversion cancelled");
        observer.on_cancelled(file, format).await;
    }

    async fn finish_failed(
        key: &str,
        file: &FileRef,
        format: OutputFormat,
        error: &BackendError,
        jobs: &Arc<JobsMap>,
        observer: &Arc<dyn ConversionObserver>,
    ) {
        jobs.write().await.remove(key);
        warn!(key, %format, error = %error, "Conversion failed");
        observer.on_failed(file, format, error).await;
    }
}

impl Drop for Convertor {
    fn drop(&mut self) {
        // Workers must not outlive the convertor; anything still tracked
        // here was not shut down cleanly.
        if let Ok(mut jobs) = self.jobs.try_write() {
            for (_, job) in jobs.drain() {
                job.task.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convertor::SimulatedBackend;
    use crate::testing::{MockObserver, ObservedEvent};

    fn convertor() -> Convertor {
        Convertor::new(
            ConvertorConfig::default(),
            Arc::new(SimulatedBackend::with_defaults()),
            Arc::new(MockObserver::new()),
        )
    }

    #[tokio::test]
    async fn test_rejects_wrong_input_extension() {
        let convertor = convertor();
        let result = convertor
            .convert(FileRef::new("x.shaper"), OutputFormat::Obj)
            .await;

        assert!(matches!(
            result,
            Err(ConvertorError::InvalidInputFormat { .. })
        ));
        assert_eq!(convertor.status().await.active_jobs, 0);
    }

    #[tokio::test]
    async fn test_rejects_duplicate_key() {
        let convertor = convertor();
        convertor
            .convert(FileRef::new("part.shapr"), OutputFormat::Obj)
            .await
            .unwrap();

        let result = convertor
            .convert(FileRef::new("part.shapr"), OutputFormat::Stl)
            .await;
        assert!(matches!(
            result,
            Err(ConvertorError::AlreadyInProgress { ref name }) if name == "part"
        ));

        convertor.shutdown().await;
    }

    #[tokio::test]
    async fn test_convert_after_shutdown_is_rejected() {
        let convertor = convertor();
        convertor.shutdown().await;

        let result = convertor
            .convert(FileRef::new("part.shapr"), OutputFormat::Obj)
            .await;
        assert!(matches!(result, Err(ConvertorError::ShutDown)));
    }

    #[tokio::test]
    async fn test_convert_losing_the_race_to_shutdown_is_rejected() {
        let observer = Arc::new(MockObserver::new());
        let convertor = Arc::new(Convertor::new(
            ConvertorConfig::default(),
            Arc::new(SimulatedBackend::with_defaults()),
            Arc::clone(&observer) as Arc<dyn ConversionObserver>,
        ));

        // Hold the jobs lock so the submission passes the running check
        // and then parks on the lock while shutdown clears the flag.
        let guard = convertor.jobs.write().await;

        let submit = {
            let convertor = Arc::clone(&convertor);
            tokio::spawn(async move {
                convertor
                    .convert(FileRef::new("part.shapr"), OutputFormat::Obj)
                    .await
            })
        };
        tokio::task::yield_now().await;

        let stop = {
            let convertor = Arc::clone(&convertor);
            tokio::spawn(async move { convertor.shutdown().await })
        };
        tokio::task::yield_now().await;
        drop(guard);

        let result = submit.await.unwrap();
        stop.await.unwrap();

        // The submission must not slip a job in behind the drain.
        assert!(matches!(result, Err(ConvertorError::ShutDown)));
        assert_eq!(convertor.status().await.active_jobs, 0);
        assert!(observer.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_closed_worker_pool_still_delivers_terminal_event() {
        let observer = Arc::new(MockObserver::new());
        let convertor = Convertor::new(
            ConvertorConfig::default(),
            Arc::new(SimulatedBackend::with_defaults()),
            Arc::clone(&observer) as Arc<dyn ConversionObserver>,
        );
        convertor.worker_slots.close();

        convertor
            .convert(FileRef::new("part.shapr"), OutputFormat::Obj)
            .await
            .unwrap();

        assert!(
            observer
                .wait_for_terminal_count(1, Duration::from_secs(2))
                .await
        );
        let events = observer.events_for("part").await;
        assert!(matches!(
            events.last().unwrap(),
            ObservedEvent::Cancelled { .. }
        ));
        assert_eq!(convertor.status().await.active_jobs, 0);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let convertor = convertor();
        convertor.shutdown().await;
        convertor.shutdown().await;

        assert!(!convertor.status().await.running);
    }

    #[tokio::test]
    async fn test_status_tracks_submitted_jobs() {
        let convertor = convertor();
        convertor
            .convert(FileRef::new("a.shapr"), OutputFormat::Step)
            .await
            .unwrap();
        convertor
            .convert(FileRef::new("b.shapr"), OutputFormat::Step)
            .await
            .unwrap();

        let status = convertor.status().await;
        assert!(status.running);
        assert_eq!(status.active_jobs, 2);
        assert_eq!(status.jobs[0].key, "a");
        assert_eq!(status.jobs[1].key, "b");

        convertor.shutdown().await;
        assert_eq!(convertor.status().await.active_jobs, 0);
    }
}
