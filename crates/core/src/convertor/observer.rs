//! Observer trait for conversion lifecycle events.

use async_trait::async_trait;

use super::backend::BackendError;
use super::formats::OutputFormat;
use super::types::FileRef;

/// Receives lifecycle events for submitted conversions.
///
/// Implemented by callers. For every submitted job the convertor delivers
/// exactly one terminal event ([`on_completed`], [`on_cancelled`] or
/// [`on_failed`]), preceded by any number of [`on_progress`] calls with
/// strictly increasing values in `(0.0, 1.0)`.
///
/// [`on_progress`]: ConversionObserver::on_progress
/// [`on_completed`]: ConversionObserver::on_completed
/// [`on_cancelled`]: ConversionObserver::on_cancelled
/// [`on_failed`]: ConversionObserver::on_failed
#[async_trait]
pub trait ConversionObserver: Send + Sync {
    /// A job made progress. `value` is fractional progress in `(0.0, 1.0)`.
    async fn on_progress(&self, file: &FileRef, format: OutputFormat, value: f32);

    /// A job finished normally; `converted` is the output artifact.
    async fn on_completed(&self, file: &FileRef, converted: &FileRef);

    /// A job was cancelled before completing.
    async fn on_cancelled(&self, file: &FileRef, format: OutputFormat);

    /// A job failed in the backend. The simulated backend never fails;
    /// this hook exists for real backends.
    async fn on_failed(&self, file: &FileRef, format: OutputFormat, error: &BackendError) {
        let _ = (file, format, error);
    }
}
