//! Testing utilities and mock implementations.
//!
//! Mock observer and backend used by the lifecycle integration tests,
//! allowing full E2E coverage without timers measured in seconds.

mod mock_backend;
mod mock_observer;

pub use mock_backend::MockBackend;
pub use mock_observer::{MockObserver, ObservedEvent};
