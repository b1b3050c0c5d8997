//! Monotonic observation of a replay session
//!
//! A `StatusTracker` belongs to one observer thread. Every read of status or
//! progress goes through it, and a value that moved backwards since the last
//! read is reported as a harness invariant violation instead of being treated
//! as "not reached yet".

use std::cell::Cell;

use super::poll::Poller;
use super::session::ReplaySession;
use super::status::ReplayStatus;
use crate::error::HarnessError;

/// Per-observer view of status and progress that rejects regressions.
#[derive(Debug)]
pub struct StatusTracker {
    session: ReplaySession,
    last_status: Cell<ReplayStatus>,
    last_progress: Cell<u64>,
}

impl StatusTracker {
    /// Start tracking `session` from its initial state.
    pub fn new(session: ReplaySession) -> Self {
        Self {
            session,
            last_status: Cell::new(ReplayStatus::NotActivated),
            last_progress: Cell::new(0),
        }
    }

    /// The tracked session
    pub fn session(&self) -> &ReplaySession {
        &self.session
    }

    /// Read the status, failing if it is earlier than the last one seen.
    pub fn status(&self) -> Result<ReplayStatus, HarnessError> {
        let status = self.session.status();
        let last = self.last_status.get();
        if status < last {
            return Err(HarnessError::StatusRegression {
                from: last,
                to: status,
            });
        }
        if status > last {
            // A new session restarts the counter; only compare progress
            // within the same session.
            if last < ReplayStatus::PreparingReplay && status >= ReplayStatus::PreparingReplay {
                self.last_progress.set(0);
            }
            self.last_status.set(status);
        }
        Ok(status)
    }

    /// Read the progress counter, failing if it went backwards.
    pub fn progress(&self) -> Result<u64, HarnessError> {
        let progress = self.session.progress();
        let last = self.last_progress.get();
        if progress < last {
            return Err(HarnessError::ProgressRegression {
                from: last,
                to: progress,
            });
        }
        self.last_progress.set(progress);
        Ok(progress)
    }

    /// Wait until the status is at least `target`.
    ///
    /// Reaching a later state also satisfies the wait: with a polling
    /// observer, short-lived states can legitimately be skipped over.
    pub fn wait_for_status(
        &self,
        poller: &Poller,
        target: ReplayStatus,
    ) -> Result<ReplayStatus, HarnessError> {
        poller.try_wait_until(|| Ok::<bool, HarnessError>(self.status()? >= target))?;
        self.status()
    }

    /// Wait until at least `applied` events have taken effect.
    pub fn wait_for_progress(&self, poller: &Poller, applied: u64) -> Result<u64, HarnessError> {
        poller.try_wait_until(|| {
            // Status is read too so a session restart shows up as a regression.
            self.status()?;
            Ok::<bool, HarnessError>(self.progress()? >= applied)
        })?;
        self.progress()
    }

    /// Fail unless the current status is exactly `expected`.
    pub fn expect_status(&self, expected: ReplayStatus) -> Result<(), HarnessError> {
        let found = self.status()?;
        if found != expected {
            return Err(HarnessError::UnexpectedStatus { expected, found });
        }
        Ok(())
    }
}
