pub mod recorder;
pub mod test_helpers;

pub use recorder::{
    EventRecorder, RecordedEvent, RecordingLayer, init_test_tracing,
};
pub use test_helpers::*;

/// Shorthand for test setup helpers.
pub type TestResult<T = ()> = anyhow::Result<T>;
