//! Types for the convertor module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::formats::OutputFormat;

/// Reference to a file on disk, split into the parts the convertor cares
/// about: full path, name (stem, used as the job key) and extension.
///
/// A `FileRef` is never mutated once submitted; the output artifact of a
/// conversion is a derived copy produced by [`FileRef::with_extension`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name without extension. Unique per directory, used as the
    /// dedup key for in-flight jobs.
    pub name: String,
    /// File extension, without the leading dot.
    pub extension: String,
}

impl FileRef {
    /// Creates a file reference from a path, splitting out name and
    /// extension. Missing components become empty strings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { path, name, extension }
    }

    /// Derives the output file reference: same location and name, with the
    /// extension replaced.
    pub fn with_extension(&self, extension: &str) -> Self {
        let mut path = self.path.clone();
        path.set_extension(extension);
        Self {
            path,
            name: self.name.clone(),
            extension: extension.to_string(),
        }
    }

    /// The file name including its extension.
    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.extension)
        }
    }

    /// Directory containing the file, if any.
    pub fn parent(&self) -> Option<&Path> {
        self.path.parent()
    }
}

/// Lifecycle state of a conversion job.
///
/// `Pending -> Running -> {Completed, Cancelled, Failed}`; the terminal
/// states are absorbing. The jobs map only ever holds non-terminal states:
/// removal from the map *is* the terminal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Inserted into the map, worker not yet running.
    Pending,
    /// Worker is executing; progress updates are valid.
    Running,
    /// Finished normally.
    Completed,
    /// Cancel request observed before natural completion.
    Cancelled,
    /// Backend reported a failure.
    Failed,
}

impl JobState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Point-in-time view of one tracked job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Job key (input file name).
    pub key: String,
    /// Input file.
    pub file: FileRef,
    /// Target output format.
    pub format: OutputFormat,
    /// Current state.
    pub state: JobState,
    /// Fractional progress in `[0.0, 1.0)`.
    pub progress: f32,
    /// When the job was submitted.
    pub started_at: DateTime<Utc>,
}

/// Current status of the convertor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertorStatus {
    /// Whether the convertor accepts new jobs.
    pub running: bool,
    /// Number of tracked (non-terminal) jobs.
    pub active_jobs: usize,
    /// Snapshot of each tracked job.
    pub jobs: Vec<JobSnapshot>,
}
