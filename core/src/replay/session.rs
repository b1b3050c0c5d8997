//! Shared replay session context
//!
//! Bundles everything the producer publishes and the observers read: the
//! status register, the progress counter, the shutdown request flag and the
//! registration of the thread currently driving the simulation. One session
//! is created per host and handed explicitly to whoever needs it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use tracing::{info, warn};

use super::progress::ProgressCounter;
use super::status::{ReplayStatus, StatusRegister};

#[derive(Debug, Default)]
struct SessionInner {
    status: StatusRegister,
    progress: ProgressCounter,
    shutdown_requested: AtomicBool,
    producer_thread: Mutex<Option<ThreadId>>,
}

/// Cheaply cloneable handle to one replay session's shared state.
#[derive(Debug, Clone, Default)]
pub struct ReplaySession {
    inner: Arc<SessionInner>,
}

impl ReplaySession {
    /// Create a fresh session in `NOT_ACTIVATED`
    pub fn new() -> Self {
        Self::default()
    }

    /// The status register
    pub fn status_register(&self) -> &StatusRegister {
        &self.inner.status
    }

    /// The progress counter
    pub fn progress_counter(&self) -> &ProgressCounter {
        &self.inner.progress
    }

    /// Current lifecycle status
    pub fn status(&self) -> ReplayStatus {
        self.inner.status.get()
    }

    /// Events applied so far in this session
    pub fn progress(&self) -> u64 {
        self.inner.progress.get()
    }

    /// Start a new session: progress back to zero, status `PREPARING_REPLAY`.
    ///
    /// Progress is reset before the status is published so no observer can
    /// pair the new status with a stale counter.
    pub(crate) fn begin(&self, recording: &str) {
        self.inner.progress.reset();
        self.inner.status.set(ReplayStatus::PreparingReplay);
        info!(recording, "replay session started");
    }

    /// Ask the producer to stop at its next loop iteration.
    ///
    /// Returns `true` if this call made the request, `false` if it had
    /// already been made.
    pub(crate) fn request_shutdown(&self) -> bool {
        !self.inner.shutdown_requested.swap(true, Ordering::AcqRel)
    }

    /// Whether shutdown has been requested
    pub fn shutdown_requested(&self) -> bool {
        self.inner.shutdown_requested.load(Ordering::Acquire)
    }

    /// Register the calling thread as the producer.
    pub(crate) fn register_producer(&self) {
        *self.producer_slot() = Some(thread::current().id());
    }

    /// Clear the producer registration (the producer loop has exited).
    pub(crate) fn clear_producer(&self) {
        *self.producer_slot() = None;
    }

    /// Thread currently driving the simulation, if any
    pub fn producer_thread(&self) -> Option<ThreadId> {
        *self.producer_slot()
    }

    /// True when called from the thread that drives the simulation.
    pub fn is_producer_thread(&self) -> bool {
        self.producer_thread() == Some(thread::current().id())
    }

    fn producer_slot(&self) -> std::sync::MutexGuard<'_, Option<ThreadId>> {
        self.inner.producer_thread.lock().unwrap_or_else(|e| {
            warn!("producer registration mutex poisoned; continuing");
            e.into_inner()
        })
    }
}
