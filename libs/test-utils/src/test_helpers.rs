use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

/// Shared invocation counter for handlers and retried operations.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicU32>);

impl CallCounter {
    pub fn new() -> Self { Self::default() }

    /// Records one call and returns its 1-based ordinal.
    pub fn hit(&self) -> u32 { self.0.fetch_add(1, Ordering::SeqCst) + 1 }

    pub fn count(&self) -> u32 { self.0.load(Ordering::SeqCst) }
}

/// Error double for operations that fail on purpose.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transient failure on call {call}")]
pub struct TransientError {
    pub call: u32,
}

/// Returns a closure-friendly outcome: the first `failures` calls fail,
/// later calls succeed with their ordinal.
pub fn fail_first(
    counter: &CallCounter, failures: u32,
) -> Result<u32, TransientError> {
    let call = counter.hit();
    if call <= failures {
        Err(TransientError { call })
    }
    else {
        Ok(call)
    }
}
