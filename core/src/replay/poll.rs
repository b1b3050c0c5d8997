//! Condition poller
//!
//! Observers never block on a signal that the producer would have to send.
//! Instead they re-evaluate a predicate over published state with a bounded
//! sleep between attempts, and give up after a timeout. The producer is never
//! aware that anyone is waiting.

use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::config::PollConfig;
use crate::error::HarnessError;

/// Block the calling thread until `predicate` returns `true`.
///
/// The predicate is evaluated immediately; if it already holds, this returns
/// without sleeping. Otherwise it sleeps at most `interval` between
/// evaluations. Once `timeout` has elapsed without the predicate holding, this
/// fails with [`HarnessError::Timeout`], after at least `timeout` and at most
/// `timeout + interval`. A zero timeout evaluates exactly once.
///
/// The predicate may run many times and must not have side effects. Panics
/// inside it propagate to the caller.
pub fn wait_until<P>(
    mut predicate: P,
    interval: Duration,
    timeout: Duration,
) -> Result<(), HarnessError>
where
    P: FnMut() -> bool,
{
    try_wait_until(|| Ok::<bool, HarnessError>(predicate()), interval, timeout)
}

/// Like [`wait_until`], for predicates that can fail.
///
/// An `Err` from the predicate is returned immediately and never retried.
pub fn try_wait_until<P, E>(
    mut predicate: P,
    interval: Duration,
    timeout: Duration,
) -> Result<(), E>
where
    P: FnMut() -> Result<bool, E>,
    E: From<HarnessError>,
{
    let start = Instant::now();
    let mut attempts = 0u64;

    loop {
        attempts += 1;
        if predicate()? {
            trace!(attempts, elapsed = ?start.elapsed(), "wait condition met");
            return Ok(());
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            trace!(attempts, ?elapsed, "wait condition timed out");
            return Err(HarnessError::Timeout {
                waited: elapsed,
                timeout,
            }
            .into());
        }

        // Never sleep past the deadline by more than one interval.
        let nap = interval.min(timeout - elapsed);
        if nap.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(nap);
        }
    }
}

/// Poll interval and timeout bundled for repeated waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    /// Sleep between predicate evaluations
    pub interval: Duration,
    /// Give up after this long
    pub timeout: Duration,
}

impl Poller {
    /// Create a poller with explicit timings
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Same interval, different timeout
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// See [`wait_until`]
    pub fn wait_until<P>(&self, predicate: P) -> Result<(), HarnessError>
    where
        P: FnMut() -> bool,
    {
        wait_until(predicate, self.interval, self.timeout)
    }

    /// See [`try_wait_until`]
    pub fn try_wait_until<P, E>(&self, predicate: P) -> Result<(), E>
    where
        P: FnMut() -> Result<bool, E>,
        E: From<HarnessError>,
    {
        try_wait_until(predicate, self.interval, self.timeout)
    }
}

impl Default for Poller {
    fn default() -> Self {
        PollConfig::default().into()
    }
}

impl From<PollConfig> for Poller {
    fn from(config: PollConfig) -> Self {
        Self::new(config.interval(), config.timeout())
    }
}
