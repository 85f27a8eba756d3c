//! Mock backend for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::convertor::{BackendError, ConversionBackend, FileRef, OutputFormat, TickSource};

/// Mock implementation of the [`ConversionBackend`] trait.
///
/// Provides controllable behavior for testing:
/// - Fixed, deterministic duration in ticks
/// - Failure on start or after a given number of ticks
/// - A scripted progress sequence, including plateaus
/// - Ticks that never resolve, for teardown tests
/// - Records started jobs for assertions
#[derive(Debug)]
pub struct MockBackend {
    duration_ticks: Arc<RwLock<u64>>,
    fail_on_start: Arc<RwLock<bool>>,
    fail_after_ticks: Arc<RwLock<Option<u64>>>,
    progress_script: Arc<RwLock<Option<Vec<f32>>>>,
    stall_on_tick: Arc<RwLock<bool>>,
    started: Arc<RwLock<Vec<(String, OutputFormat)>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend with a 10-tick duration.
    pub fn new() -> Self {
        Self {
            duration_ticks: Arc::new(RwLock::new(10)),
            fail_on_start: Arc::new(RwLock::new(false)),
            fail_after_ticks: Arc::new(RwLock::new(None)),
            progress_script: Arc::new(RwLock::new(None)),
            stall_on_tick: Arc::new(RwLock::new(false)),
            started: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Set the fixed duration for subsequent jobs.
    pub async fn set_duration_ticks(&self, ticks: u64) {
        *self.duration_ticks.write().await = ticks.max(1);
    }

    /// Make subsequent starts fail immediately.
    pub async fn set_fail_on_start(&self, fail: bool) {
        *self.fail_on_start.write().await = fail;
    }

    /// Make subsequent jobs fail after the given number of ticks.
    pub async fn set_fail_after_ticks(&self, ticks: Option<u64>) {
        *self.fail_after_ticks.write().await = ticks;
    }

    /// Make subsequent jobs report exactly this progress sequence, one
    /// value per tick. The last value is repeated once the script runs
    /// out. Overrides the fixed duration.
    pub async fn set_progress_script(&self, script: Vec<f32>) {
        *self.progress_script.write().await = Some(script);
    }

    /// Make ticks of subsequent jobs never resolve.
    pub async fn set_stall_on_tick(&self, stall: bool) {
        *self.stall_on_tick.write().await = stall;
    }

    /// Jobs started so far, as `(file name, format)` pairs.
    pub async fn started_jobs(&self) -> Vec<(String, OutputFormat)> {
        self.started.read().await.clone()
    }
}

#[async_trait]
impl ConversionBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(
        &self,
        file: &FileRef,
        format: OutputFormat,
    ) -> Result<Box<dyn TickSource>, BackendError> {
        if *self.fail_on_start.read().await {
            return Err(BackendError::failed("mock start failure"));
        }

        self.started.write().await.push((file.name.clone(), format));

        Ok(Box::new(MockTicks {
            file: file.clone(),
            format,
            ticks: 0,
            duration: *self.duration_ticks.read().await,
            fail_after: *self.fail_after_ticks.read().await,
            script: self.progress_script.read().await.clone(),
            stall: *self.stall_on_tick.read().await,
        }))
    }
}

struct MockTicks {
    file: FileRef,
    format: OutputFormat,
    ticks: u64,
    duration: u64,
    fail_after: Option<u64>,
    script: Option<Vec<f32>>,
    stall: bool,
}

#[async_trait]
impl TickSource for MockTicks {
    async fn tick(&mut self) -> Result<f32, BackendError> {
        if self.stall {
            std::future::pending::<()>().await;
        }
        if let Some(fail_after) = self.fail_after {
            if self.ticks >= fail_after {
                return Err(BackendError::failed("mock tick failure"));
            }
        }
        if let Some(script) = &self.script {
            if !script.is_empty() {
                let index = (self.ticks as usize).min(script.len() - 1);
                self.ticks += 1;
                return Ok(script[index]);
            }
        }
        if self.ticks < self.duration {
            self.ticks += 1;
        }
        Ok(self.ticks as f32 / self.duration as f32)
    }

    fn output(&self) -> FileRef {
        self.file.with_extension(self.format.extension())
    }
}
