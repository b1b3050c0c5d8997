//! Replay progress counter
//!
//! Counts recorded events the producer has fully applied in the current
//! session. A value of `k` means events `0..k` have taken effect.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::HarnessError;

/// Monotonic, thread-visible event counter (single writer).
#[derive(Debug, Default)]
pub struct ProgressCounter {
    applied: AtomicU64,
}

impl ProgressCounter {
    /// Create a counter at zero
    pub fn new() -> Self {
        Self {
            applied: AtomicU64::new(0),
        }
    }

    /// Number of events applied so far.
    pub fn get(&self) -> u64 {
        self.applied.load(Ordering::Acquire)
    }

    /// Mark one more event as applied. Returns the new value.
    ///
    /// Must be called after the event's effects are written, so that an
    /// observer reading `>= k` also sees the effects of event `k - 1`.
    pub fn increment(&self) -> u64 {
        self.applied.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Jump forward to `applied`.
    ///
    /// Fails with [`HarnessError::ProgressRegression`] if that would move the
    /// counter backwards; setting the current value again is a no-op.
    pub fn advance_to(&self, applied: u64) -> Result<(), HarnessError> {
        let current = self.applied.load(Ordering::Acquire);
        if applied < current {
            return Err(HarnessError::ProgressRegression {
                from: current,
                to: applied,
            });
        }
        self.applied.store(applied, Ordering::Release);
        Ok(())
    }

    /// Back to zero. Only valid when a new session begins.
    pub(crate) fn reset(&self) {
        self.applied.store(0, Ordering::Release);
    }
}
