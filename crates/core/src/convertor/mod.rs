//! Conversion job tracking and progress reporting.
//!
//! This module provides the [`Convertor`], which accepts conversion
//! requests for `.shapr` files, runs each as an independently cancellable
//! job on a bounded worker pool, enforces at-most-one in-flight job per
//! input file name, and reports progress and exactly one terminal event
//! per job to a caller-supplied [`ConversionObserver`].
//!
//! The actual byte-level conversion is behind the [`ConversionBackend`]
//! trait; [`SimulatedBackend`] is the provided implementation.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use convertor_core::{Convertor, ConvertorConfig, FileRef, OutputFormat, SimulatedBackend};
//!
//! let convertor = Convertor::new(
//!     ConvertorConfig::default(),
//!     Arc::new(SimulatedBackend::with_defaults()),
//!     observer,
//! );
//!
//! // Submit a conversion; returns immediately.
//! let handle = convertor.convert(FileRef::new("part.shapr"), OutputFormat::Obj).await?;
//!
//! // Cancel it from anywhere, any number of times.
//! handle.cancel().await;
//!
//! // Tear down: cancels in-flight jobs and waits for acknowledgement.
//! convertor.shutdown().await;
//! ```

mod backend;
mod config;
mod error;
mod formats;
mod job;
mod manager;
mod observer;
mod types;

pub use backend::{BackendError, ConversionBackend, SimulatedBackend, TickSource};
pub use config::{ConvertorConfig, SimulatedBackendConfig};
pub use error::ConvertorError;
pub use formats::{InputFormat, OutputFormat};
pub use job::JobHandle;
pub use manager::Convertor;
pub use observer::ConversionObserver;
pub use types::{ConvertorStatus, FileRef, JobSnapshot, JobState};
