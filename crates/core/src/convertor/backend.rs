//! Conversion backend traits and the simulated implementation.

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

use super::config::SimulatedBackendConfig;
use super::formats::OutputFormat;
use super::types::FileRef;

/// Errors reported by a conversion backend.
///
/// Backend failures are discovered after `convert` has returned, so they
/// never cross the synchronous API boundary; the convertor delivers them
/// through [`ConversionObserver::on_failed`](super::ConversionObserver::on_failed).
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The backend could not carry out the conversion.
    #[error("conversion failed: {reason}")]
    Failed { reason: String },
}

impl BackendError {
    /// Creates a new failure with the given reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed { reason: reason.into() }
    }
}

/// A backend that performs the actual format conversion.
///
/// The convertor drives the work: it asks the backend to start a job,
/// then advances the returned [`TickSource`] once per tick interval until
/// progress reaches `1.0` or the job is cancelled.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Returns the name of this backend implementation.
    fn name(&self) -> &str;

    /// Begins a conversion, returning the tick source that advances it.
    async fn start(
        &self,
        file: &FileRef,
        format: OutputFormat,
    ) -> Result<Box<dyn TickSource>, BackendError>;
}

/// One in-flight conversion, advanced a tick at a time.
#[async_trait]
pub trait TickSource: Send {
    /// Advances the conversion by one unit of work and returns overall
    /// progress in `(0.0, 1.0]`, monotonically non-decreasing. A return
    /// value of `1.0` means the conversion is done.
    async fn tick(&mut self) -> Result<f32, BackendError>;

    /// Materializes the output file. Only meaningful once [`tick`] has
    /// returned `1.0`.
    ///
    /// [`tick`]: TickSource::tick
    fn output(&self) -> FileRef;
}

/// Simulated backend: no bytes are converted, progress advances by
/// `1/duration` per tick with a random duration per job.
pub struct SimulatedBackend {
    config: SimulatedBackendConfig,
}

impl SimulatedBackend {
    /// Creates a simulated backend with the given configuration.
    pub fn new(config: SimulatedBackendConfig) -> Self {
        Self { config }
    }

    /// Creates a simulated backend with default durations (5 to 25 ticks).
    pub fn with_defaults() -> Self {
        Self::new(SimulatedBackendConfig::default())
    }
}

#[async_trait]
impl ConversionBackend for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn start(
        &self,
        file: &FileRef,
        format: OutputFormat,
    ) -> Result<Box<dyn TickSource>, BackendError> {
        let min = self.config.min_duration_ticks.max(1);
        let max = self.config.max_duration_ticks.max(min);
        let duration = rand::thread_rng().gen_range(min..=max);

        Ok(Box::new(SimulatedTicks {
            file: file.clone(),
            format,
            ticks: 0,
            duration,
        }))
    }
}

struct SimulatedTicks {
    file: FileRef,
    format: OutputFormat,
    ticks: u64,
    duration: u64,
}

#[async_trait]
impl TickSource for SimulatedTicks {
    async fn tick(&mut self) -> Result<f32, BackendError> {
        if self.ticks < self.duration {
            self.ticks += 1;
        }
        Ok(self.ticks as f32 / self.duration as f32)
    }

    fn output(&self) -> FileRef {
        self.file.with_extension(self.format.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_duration_within_range() {
        let backend = SimulatedBackend::new(SimulatedBackendConfig {
            min_duration_ticks: 3,
            max_duration_ticks: 6,
        });
        let file = FileRef::new("part.shapr");

        for _ in 0..20 {
            let mut ticks = backend.start(&file, OutputFormat::Obj).await.unwrap();
            let mut count = 0;
            loop {
                count += 1;
                if ticks.tick().await.unwrap() >= 1.0 {
                    break;
                }
            }
            assert!((3..=6).contains(&count), "duration {} out of range", count);
        }
    }

    #[tokio::test]
    async fn test_simulated_progress_monotonic() {
        let backend = SimulatedBackend::new(SimulatedBackendConfig {
            min_duration_ticks: 5,
            max_duration_ticks: 5,
        });
        let file = FileRef::new("part.shapr");
        let mut ticks = backend.start(&file, OutputFormat::Stl).await.unwrap();

        let mut last = 0.0;
        loop {
            let progress = ticks.tick().await.unwrap();
            assert!(progress > last);
            last = progress;
            if progress >= 1.0 {
                break;
            }
        }
        assert_eq!(last, 1.0);
    }

    #[tokio::test]
    async fn test_simulated_output_rewrites_extension() {
        let backend = SimulatedBackend::with_defaults();
        let file = FileRef::new("/models/part.shapr");
        let ticks = backend.start(&file, OutputFormat::Obj).await.unwrap();

        let output = ticks.output();
        assert_eq!(output.name, "part");
        assert_eq!(output.extension, "obj");
    }

    #[tokio::test]
    async fn test_progress_stays_at_one_after_done() {
        let backend = SimulatedBackend::new(SimulatedBackendConfig {
            min_duration_ticks: 2,
            max_duration_ticks: 2,
        });
        let file = FileRef::new("part.shapr");
        let mut ticks = backend.start(&file, OutputFormat::Step).await.unwrap();

        ticks.tick().await.unwrap();
        assert_eq!(ticks.tick().await.unwrap(), 1.0);
        // a straggling tick past completion does not overshoot
        assert_eq!(ticks.tick().await.unwrap(), 1.0);
    }
}
