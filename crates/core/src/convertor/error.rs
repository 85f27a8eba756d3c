//! Error types for the convertor module.

use thiserror::Error;

use super::types::FileRef;

/// Errors returned synchronously from [`Convertor::convert`] and
/// [`Convertor::convert_batch`].
///
/// Asynchronous outcomes (completion, cancellation, backend failure) are
/// never surfaced here; they are delivered through the
/// [`ConversionObserver`](super::ConversionObserver) as terminal events.
///
/// [`Convertor::convert`]: super::Convertor::convert
/// [`Convertor::convert_batch`]: super::Convertor::convert_batch
#[derive(Debug, Error)]
pub enum ConvertorError {
    /// The input file's extension does not match the expected input format.
    #[error("invalid input format: {}", file.file_name())]
    InvalidInputFormat { file: FileRef },

    /// A conversion for the same input file is already in flight.
    #[error("conversion already in progress: {name}")]
    AlreadyInProgress { name: String },

    /// The convertor has been shut down and accepts no new jobs.
    #[error("convertor has been shut down")]
    ShutDown,
}
