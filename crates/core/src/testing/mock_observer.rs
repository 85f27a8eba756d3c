//! Mock observer for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::convertor::{BackendError, ConversionObserver, FileRef, OutputFormat};

/// A recorded observer callback, in delivery order.
#[derive(Debug, Clone)]
pub enum ObservedEvent {
    Progress {
        name: String,
        format: OutputFormat,
        value: f32,
    },
    Completed {
        name: String,
        converted: FileRef,
    },
    Cancelled {
        name: String,
        format: OutputFormat,
    },
    Failed {
        name: String,
        format: OutputFormat,
        error: String,
    },
}

impl ObservedEvent {
    /// Input file name the event belongs to.
    pub fn name(&self) -> &str {
        match self {
            Self::Progress { name, .. }
            | Self::Completed { name, .. }
            | Self::Cancelled { name, .. }
            | Self::Failed { name, .. } => name,
        }
    }

    /// Whether this is a terminal event.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Mock implementation of [`ConversionObserver`] that records every
/// callback for assertions.
#[derive(Debug, Default)]
pub struct MockObserver {
    events: Arc<RwLock<Vec<ObservedEvent>>>,
}

impl MockObserver {
    /// Create a new mock observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, in delivery order.
    pub async fn events(&self) -> Vec<ObservedEvent> {
        self.events.read().await.clone()
    }

    /// Recorded events for one input file name.
    pub async fn events_for(&self, name: &str) -> Vec<ObservedEvent> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.name() == name)
            .cloned()
            .collect()
    }

    /// Number of terminal events recorded so far.
    pub async fn terminal_count(&self) -> usize {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.is_terminal())
            .count()
    }

    /// Number of terminal events recorded for one input file name.
    pub async fn terminal_count_for(&self, name: &str) -> usize {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.is_terminal() && e.name() == name)
            .count()
    }

    /// Progress values recorded for one input file name, in order.
    pub async fn progress_values(&self, name: &str) -> Vec<f32> {
        self.events
            .read()
            .await
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::Progress { name: n, value, .. } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Clear recorded events.
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }

    /// Polls until at least `count` terminal events have been recorded.
    /// Returns `false` if the timeout elapses first.
    pub async fn wait_for_terminal_count(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.terminal_count().await >= count {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl ConversionObserver for MockObserver {
    async fn on_progress(&self, file: &FileRef, format: OutputFormat, value: f32) {
        self.events.write().await.push(ObservedEvent::Progress {
            name: file.name.clone(),
            format,
            value,
        });
    }

    async fn on_completed(&self, file: &FileRef, converted: &FileRef) {
        self.events.write().await.push(ObservedEvent::Completed {
            name: file.name.clone(),
            converted: converted.clone(),
        });
    }

    async fn on_cancelled(&self, file: &FileRef, format: OutputFormat) {
        self.events.write().await.push(ObservedEvent::Cancelled {
            name: file.name.clone(),
            format,
        });
    }

    async fn on_failed(&self, file: &FileRef, format: OutputFormat, error: &BackendError) {
        self.events.write().await.push(ObservedEvent::Failed {
            name: file.name.clone(),
            format,
            error: error.to_string(),
        });
    }
}
