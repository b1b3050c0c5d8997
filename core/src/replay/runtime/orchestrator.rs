//! Test orchestration
//!
//! A [`ReplayTest`] owns one [`ReplayHost`], runs one or more observer closures
//! on their own threads and collects their verdicts. Observers only read the
//! session and the simulation view; the one thing they may write is a
//! shutdown request.
//!
//! The simulation can run either on a background thread (observers on other
//! threads, the calling thread only joins) or on the calling thread itself
//! with every observer on a worker thread. Both placements go through the same
//! polling primitive, so the assertions do not depend on which thread is the
//! "main" one.

use std::any::Any;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tracing::{debug, error, info};

use super::host::{HostHandle, ReplayHost};
use super::simulation::Simulation;
use crate::error::HarnessError;
use crate::replay::poll::Poller;
use crate::replay::session::ReplaySession;
use crate::replay::status::ReplayStatus;
use crate::replay::tracker::StatusTracker;

/// Which thread drives the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationPlacement {
    /// Simulation on a spawned producer thread
    #[default]
    Background,
    /// Simulation on the thread calling [`ReplayTest::run`]
    Foreground,
}

/// Everything an observer thread gets to work with.
pub struct ObserverContext<V> {
    name: String,
    poller: Poller,
    tracker: StatusTracker,
    host: HostHandle<V>,
}

impl<V> ObserverContext<V> {
    fn new(name: String, poller: Poller, host: HostHandle<V>) -> Self {
        Self {
            name,
            poller,
            tracker: StatusTracker::new(host.session().clone()),
            host,
        }
    }

    /// Observer name (also its thread name suffix)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulation query handle
    pub fn view(&self) -> &V {
        self.host.view()
    }

    /// The poller this observer waits with
    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    /// The replay session
    pub fn session(&self) -> &ReplaySession {
        self.host.session()
    }

    /// Current status (fails on regression)
    pub fn status(&self) -> Result<ReplayStatus, HarnessError> {
        self.tracker.status()
    }

    /// Current progress (fails on regression)
    pub fn progress(&self) -> Result<u64, HarnessError> {
        self.tracker.progress()
    }

    /// Wait for an arbitrary predicate
    pub fn wait_until<P>(&self, predicate: P) -> Result<(), HarnessError>
    where
        P: FnMut() -> bool,
    {
        self.poller.wait_until(predicate)
    }

    /// Wait for a predicate that may itself fail
    pub fn try_wait_until<P>(&self, predicate: P) -> Result<(), HarnessError>
    where
        P: FnMut() -> Result<bool, HarnessError>,
    {
        self.poller.try_wait_until(predicate)
    }

    /// Wait until the status reaches `target` (or later)
    pub fn wait_for_status(&self, target: ReplayStatus) -> Result<ReplayStatus, HarnessError> {
        debug!(observer = %self.name, %target, "waiting for status");
        self.tracker.wait_for_status(&self.poller, target)
    }

    /// Wait until at least `applied` events have taken effect
    pub fn wait_for_progress(&self, applied: u64) -> Result<u64, HarnessError> {
        debug!(observer = %self.name, applied, "waiting for checkpoint");
        self.tracker.wait_for_progress(&self.poller, applied)
    }

    /// Fail unless the status is exactly `expected`
    pub fn expect_status(&self, expected: ReplayStatus) -> Result<(), HarnessError> {
        self.tracker.expect_status(expected)
    }

    /// Stop the host and wait for the producer to exit
    pub fn shutdown(&self) {
        self.host.shutdown();
    }

    /// True while the producer loop is alive
    pub fn host_running(&self) -> bool {
        self.host.is_running()
    }
}

/// Fail with [`HarnessError::Assertion`] unless `actual == expected`.
pub fn expect_eq<T: PartialEq + Debug>(what: &str, actual: T, expected: T) -> Result<(), HarnessError> {
    if actual == expected {
        Ok(())
    } else {
        Err(HarnessError::Assertion(format!(
            "{}: expected {:?}, got {:?}",
            what, expected, actual
        )))
    }
}

/// Fail with [`HarnessError::Assertion`] if `actual == unexpected`.
pub fn expect_ne<T: PartialEq + Debug>(
    what: &str,
    actual: T,
    unexpected: T,
) -> Result<(), HarnessError> {
    if actual != unexpected {
        Ok(())
    } else {
        Err(HarnessError::Assertion(format!(
            "{}: expected anything but {:?}",
            what, unexpected
        )))
    }
}

/// Fail with [`HarnessError::Assertion`] unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), HarnessError> {
    if condition {
        Ok(())
    } else {
        Err(HarnessError::Assertion(message.into()))
    }
}

type ObserverFn<V> = Box<dyn FnOnce(&ObserverContext<V>) -> Result<(), HarnessError> + Send>;

/// Requests host shutdown when an observer ends: immediately if it failed,
/// otherwise once the last observer is done.
struct ObserverExit<V> {
    host: HostHandle<V>,
    remaining: Arc<AtomicUsize>,
    failed: bool,
}

impl<V> Drop for ObserverExit<V> {
    fn drop(&mut self) {
        let failed = self.failed || thread::panicking();
        let last = self.remaining.fetch_sub(1, Ordering::AcqRel) == 1;
        if failed || last {
            self.host.shutdown();
        }
    }
}

/// One replay test: a host, a recording and a set of observers.
pub struct ReplayTest<S: Simulation> {
    host: ReplayHost<S>,
    observers: Vec<(String, ObserverFn<S::View>)>,
    placement: SimulationPlacement,
    poller: Poller,
}

impl<S: Simulation> ReplayTest<S> {
    pub fn new(host: ReplayHost<S>) -> Self {
        Self {
            host,
            observers: Vec::new(),
            placement: SimulationPlacement::default(),
            poller: Poller::default(),
        }
    }

    /// Add an observer. It runs on its own thread named `observer-<name>`.
    pub fn observer<F>(mut self, name: impl Into<String>, observer: F) -> Self
    where
        F: FnOnce(&ObserverContext<S::View>) -> Result<(), HarnessError> + Send + 'static,
    {
        self.observers.push((name.into(), Box::new(observer)));
        self
    }

    /// Choose where the simulation runs
    pub fn placement(mut self, placement: SimulationPlacement) -> Self {
        self.placement = placement;
        self
    }

    /// Poll timings used by every observer
    pub fn poller(mut self, poller: Poller) -> Self {
        self.poller = poller;
        self
    }

    /// The host under test
    pub fn host(&self) -> &ReplayHost<S> {
        &self.host
    }

    /// Replay `recording` and run every observer against it.
    ///
    /// With no observers registered, the test just waits for playback to
    /// finish.
    ///
    /// Returns the first observer failure (in registration order), then any
    /// producer failure. The producer has exited by the time this returns.
    pub fn run(self, recording: &str) -> Result<(), HarnessError> {
        let Self {
            host,
            mut observers,
            placement,
            poller,
        } = self;

        // Without observers nobody would stop a foreground host; wait for
        // playback to finish instead.
        if observers.is_empty() {
            observers.push((
                "completion".to_string(),
                Box::new(|ctx: &ObserverContext<S::View>| {
                    ctx.wait_for_status(ReplayStatus::ReplayFinished).map(drop)
                }),
            ));
        }

        // Load failures abort before any thread exists.
        let loaded = host.load(recording)?;
        info!(
            recording,
            observers = observers.len(),
            ?placement,
            "starting replay test"
        );

        let remaining = Arc::new(AtomicUsize::new(observers.len()));
        let mut threads = Vec::with_capacity(observers.len());
        for (name, observer) in observers {
            let context = ObserverContext::new(name.clone(), poller, host.handle());
            let exit = ObserverExit {
                host: host.handle(),
                remaining: remaining.clone(),
                failed: false,
            };
            let spawned = thread::Builder::new()
                .name(format!("observer-{}", name))
                .spawn(move || run_observer(context, exit, observer));
            match spawned {
                Ok(handle) => threads.push((name, handle)),
                Err(e) => {
                    host.shutdown();
                    join_observers(threads);
                    return Err(HarnessError::Spawn(e));
                }
            }
        }

        let launched = host.launch(
            recording,
            loaded,
            placement == SimulationPlacement::Foreground,
        );
        if launched.is_err() {
            host.shutdown();
        }

        let verdicts = join_observers(threads);
        host.shutdown();

        if let Some(err) = verdicts.into_iter().find_map(Result::err) {
            return Err(err);
        }
        launched?;
        if let Some(message) = host.producer_error() {
            return Err(HarnessError::Simulation(message));
        }
        Ok(())
    }
}

fn run_observer<V>(
    context: ObserverContext<V>,
    mut exit: ObserverExit<V>,
    observer: ObserverFn<V>,
) -> Result<(), HarnessError> {
    let result = observer(&context);
    if let Err(e) = &result {
        error!(observer = %context.name, "observer failed: {}", e);
        exit.failed = true;
    }
    result
}

fn join_observers(
    threads: Vec<(String, thread::JoinHandle<Result<(), HarnessError>>)>,
) -> Vec<Result<(), HarnessError>> {
    threads
        .into_iter()
        .map(|(name, handle)| match handle.join() {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(observer = %name, "observer panicked: {}", message);
                Err(HarnessError::ObserverPanicked { name, message })
            }
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run `f`, turning a panic into [`HarnessError::ObserverPanicked`].
///
/// For assertions inside predicates or helpers that prefer `assert!` over
/// returning errors, when the caller wants a `Result` on the same thread.
pub fn catch_assertion<T>(name: &str, f: impl FnOnce() -> T) -> Result<T, HarnessError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| HarnessError::ObserverPanicked {
        name: name.to_string(),
        message: panic_message(payload.as_ref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_helpers() {
        expect_eq("answer", 42, 42).unwrap();
        let err = expect_eq("answer", 41, 42).unwrap_err();
        assert_eq!(err.to_string(), "assertion failed: answer: expected 42, got 41");

        expect_ne("name", "a", "b").unwrap();
        assert!(matches!(
            expect_ne("name", "a", "a"),
            Err(HarnessError::Assertion(_))
        ));

        ensure(true, "fine").unwrap();
        assert!(matches!(ensure(false, "nope"), Err(HarnessError::Assertion(m)) if m == "nope"));
    }

    #[test]
    fn test_catch_assertion() {
        assert_eq!(catch_assertion("ok", || 5).unwrap(), 5);

        let err = catch_assertion("bad", || assert_eq!(1, 2, "numbers differ")).unwrap_err();
        match err {
            HarnessError::ObserverPanicked { name, message } => {
                assert_eq!(name, "bad");
                assert!(message.contains("numbers differ"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_panic_message_variants() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7u32);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
