//! Replay host controller
//!
//! Owns the producer side of a replay: loads a named recording, drives the
//! simulation through it (publishing status and progress as it goes) and
//! tears the producer down on request from any thread.
//!
//! ```text
//! open(name) ──► NOT_ACTIVATED ──► PREPARING_REPLAY ──► REPLAYING ──► REPLAY_FINISHED
//!                                  prepare()            apply() × N    idle() until shutdown
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::player::Player;
use super::simulation::Simulation;
use crate::config::HostConfig;
use crate::error::HarnessError;
use crate::replay::poll::wait_until;
use crate::replay::session::ReplaySession;
use crate::replay::source::RecordingSource;
use crate::replay::status::ReplayStatus;
use crate::replay::types::Recording;

/// Name given to the background producer thread
pub const PRODUCER_THREAD_NAME: &str = "replay-host";

/// Longest single sleep in the producer loop, so a shutdown request is
/// noticed promptly even at slow tick rates.
const MAX_NAP: Duration = Duration::from_millis(5);

/// Idle step used after playback when the host is unpaced
const IDLE_INTERVAL: Duration = Duration::from_millis(1);

/// How long `shutdown` waits for a producer it cannot join directly
const SHUTDOWN_WAIT: Duration = Duration::from_secs(10);

/// State shared between the host, its handles and the producer thread.
struct HostShared {
    session: ReplaySession,
    producer: Mutex<Option<JoinHandle<()>>>,
    running: AtomicBool,
    opened: AtomicBool,
    error: Mutex<Option<String>>,
}

impl HostShared {
    fn shutdown(&self) {
        if self.session.request_shutdown() {
            info!(
                status = %self.session.status(),
                progress = self.session.progress(),
                "replay host shutdown requested"
            );
        }

        // The producer notices the request on its next iteration; it cannot
        // wait for itself.
        if self.session.is_producer_thread() {
            return;
        }

        let handle = lock(&self.producer).take();
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            error!("replay producer thread panicked");
            self.record_error("producer thread panicked".to_string());
        }

        // Foreground producers (and concurrent shutdown callers that lost
        // the race for the join handle) are waited on by polling.
        if self.running.load(Ordering::Acquire)
            && wait_until(
                || !self.running.load(Ordering::Acquire),
                Duration::from_millis(1),
                SHUTDOWN_WAIT,
            )
            .is_err()
        {
            warn!("replay producer still running {:?} after shutdown", SHUTDOWN_WAIT);
        }
    }

    fn record_error(&self, message: String) {
        let mut slot = lock(&self.error);
        if slot.is_none() {
            *slot = Some(message);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| {
        warn!("replay host mutex poisoned; continuing");
        e.into_inner()
    })
}

/// Drives one simulation through one recording.
///
/// Created idle; [`open`](Self::open) starts the single session this host
/// will ever run. Dropping the host shuts it down.
pub struct ReplayHost<S: Simulation> {
    shared: Arc<HostShared>,
    simulation: Mutex<Option<S>>,
    view: S::View,
    source: Arc<dyn RecordingSource>,
    config: HostConfig,
}

impl<S: Simulation> ReplayHost<S> {
    /// Create a host for `simulation`, resolving recordings through `source`.
    pub fn new<R>(simulation: S, source: R, config: HostConfig) -> Self
    where
        R: RecordingSource + 'static,
    {
        let view = simulation.view();
        Self {
            shared: Arc::new(HostShared {
                session: ReplaySession::new(),
                producer: Mutex::new(None),
                running: AtomicBool::new(false),
                opened: AtomicBool::new(false),
                error: Mutex::new(None),
            }),
            simulation: Mutex::new(Some(simulation)),
            view,
            source: Arc::new(source),
            config,
        }
    }

    /// Load `name` and start replaying it.
    ///
    /// With `wait_for_completion` the simulation runs on the calling thread
    /// and this returns once the host has been shut down (from another
    /// thread). Otherwise the simulation runs on a new thread and this returns
    /// immediately.
    ///
    /// A missing or corrupt recording fails with [`HarnessError::Load`]
    /// before any state is published. A host that was shut down before
    /// `open` returns `Ok` without starting: the status stays
    /// `NOT_ACTIVATED` and the simulation is never prepared.
    pub fn open(&self, name: &str, wait_for_completion: bool) -> Result<(), HarnessError> {
        let recording = self.load(name)?;
        self.launch(name, recording, wait_for_completion)
    }

    /// Resolve a recording without touching session state.
    pub(crate) fn load(&self, name: &str) -> Result<Recording, HarnessError> {
        if self.shared.opened.load(Ordering::Acquire) {
            return Err(HarnessError::AlreadyOpen);
        }
        let recording = self.source.load(name).map_err(|e| {
            error!("failed to load recording '{}': {}", name, e);
            e
        })?;
        if !recording.events.is_tick_ordered() {
            return Err(crate::error::LoadError::Corrupt(format!(
                "recording '{}' has decreasing ticks",
                name
            ))
            .into());
        }
        Ok(recording)
    }

    /// Start the producer for an already loaded recording.
    pub(crate) fn launch(
        &self,
        name: &str,
        recording: Recording,
        wait_for_completion: bool,
    ) -> Result<(), HarnessError> {
        if self.shared.opened.swap(true, Ordering::AcqRel) {
            return Err(HarnessError::AlreadyOpen);
        }
        if self.shared.session.shutdown_requested() {
            info!("replay '{}' not started: host already shut down", name);
            return Ok(());
        }
        let simulation = lock(&self.simulation)
            .take()
            .ok_or(HarnessError::AlreadyOpen)?;

        let producer = Producer {
            shared: self.shared.clone(),
            simulation,
            player: Player::new(recording, self.config.tick_duration()),
            idle_interval: self.config.tick_duration().unwrap_or(IDLE_INTERVAL),
        };

        // Published before the producer starts so `is_running` never reports
        // a freshly opened host as stopped.
        self.shared.running.store(true, Ordering::Release);
        self.shared.session.begin(name);

        if wait_for_completion {
            debug!("running replay '{}' on the calling thread", name);
            return producer.run();
        }

        let spawned = thread::Builder::new()
            .name(PRODUCER_THREAD_NAME.into())
            .spawn(move || {
                // Failures are recorded in the shared error slot.
                let _ = producer.run();
            });
        match spawned {
            Ok(handle) => {
                *lock(&self.shared.producer) = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::Release);
                Err(HarnessError::Spawn(e))
            }
        }
    }

    /// Stop the producer and wait for it to exit.
    ///
    /// Safe to call any number of times, from any thread, at any point in the
    /// lifecycle. Called during `REPLAYING` it aborts playback; no further
    /// status transitions happen.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }

    /// True while the producer loop is alive
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// The session this host publishes to
    pub fn session(&self) -> &ReplaySession {
        &self.shared.session
    }

    /// Current status
    pub fn status(&self) -> ReplayStatus {
        self.shared.session.status()
    }

    /// Events applied so far
    pub fn progress(&self) -> u64 {
        self.shared.session.progress()
    }

    /// Observer query handle onto the simulation
    pub fn view(&self) -> &S::View {
        &self.view
    }

    /// First error the producer stopped on, if any
    pub fn producer_error(&self) -> Option<String> {
        lock(&self.shared.error).clone()
    }

    /// Cloneable handle for observer threads
    pub fn handle(&self) -> HostHandle<S::View> {
        HostHandle {
            shared: self.shared.clone(),
            view: self.view.clone(),
        }
    }
}

impl<S: Simulation> Drop for ReplayHost<S> {
    fn drop(&mut self) {
        if self.shared.opened.load(Ordering::Acquire) {
            self.shared.shutdown();
        }
    }
}

/// Observer-side handle to a [`ReplayHost`].
///
/// Gives access to the session, the simulation view and shutdown, without
/// owning the host.
pub struct HostHandle<V> {
    shared: Arc<HostShared>,
    view: V,
}

impl<V: Clone> Clone for HostHandle<V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            view: self.view.clone(),
        }
    }
}

impl<V> HostHandle<V> {
    /// See [`ReplayHost::shutdown`]
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }

    /// True while the producer loop is alive
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// The session the host publishes to
    pub fn session(&self) -> &ReplaySession {
        &self.shared.session
    }

    /// Simulation query handle
    pub fn view(&self) -> &V {
        &self.view
    }

    /// First error the producer stopped on, if any
    pub fn producer_error(&self) -> Option<String> {
        lock(&self.shared.error).clone()
    }
}

/// Producer-side loop state. Lives on whichever thread runs the simulation.
struct Producer<S: Simulation> {
    shared: Arc<HostShared>,
    simulation: S,
    player: Player,
    idle_interval: Duration,
}

/// Clears the producer registration however the loop exits, panics included.
struct ProducerExit<'a>(&'a HostShared);

impl Drop for ProducerExit<'_> {
    fn drop(&mut self) {
        self.0.session.clear_producer();
        self.0.running.store(false, Ordering::Release);
        debug!("replay producer exited");
    }
}

impl<S: Simulation> Producer<S> {
    fn run(mut self) -> Result<(), HarnessError> {
        let shared = self.shared.clone();
        shared.session.register_producer();
        let _exit = ProducerExit(&shared);

        let result = self.play();
        if let Err(e) = &result {
            error!(
                status = %shared.session.status(),
                progress = shared.session.progress(),
                "replay producer stopped: {}",
                e
            );
            let message = match e {
                HarnessError::Simulation(message) => message.clone(),
                other => other.to_string(),
            };
            shared.record_error(message);
        }
        result
    }

    fn play(&mut self) -> Result<(), HarnessError> {
        let session = self.shared.session.clone();
        let recording = self.player.recording();

        self.simulation
            .prepare(&recording.header, recording.initial_state())
            .map_err(|e| HarnessError::Simulation(format!("prepare failed: {:#}", e)))?;

        if session.shutdown_requested() {
            info!("replay aborted before playback started");
            return Ok(());
        }

        session.status_register().set(ReplayStatus::Replaying);
        info!(events = self.player.event_count(), "replaying");
        self.player.start();

        while let Some(event) = self.player.peek() {
            if let Some(due) = self.player.due_at(event.tick)
                && !self.sleep_until(due)
            {
                break;
            }
            if session.shutdown_requested() {
                break;
            }

            let index = self.player.applied();
            self.simulation
                .apply(event)
                .map_err(|e| HarnessError::Simulation(format!("event {}: {:#}", index, e)))?;
            self.player.advance();
            // Published only after the event's effects are in place.
            session.progress_counter().increment();
        }

        if !self.player.is_complete() {
            info!(
                applied = self.player.applied(),
                total = self.player.event_count(),
                "replay aborted by shutdown"
            );
            return Ok(());
        }

        session.status_register().set(ReplayStatus::ReplayFinished);
        info!(events = self.player.event_count(), "replay finished");

        while !session.shutdown_requested() {
            self.simulation
                .idle()
                .map_err(|e| HarnessError::Simulation(format!("idle failed: {:#}", e)))?;
            self.sleep_until(Instant::now() + self.idle_interval);
        }

        Ok(())
    }

    /// Sleep until `deadline` in short naps. Returns `false` if shutdown was
    /// requested meanwhile.
    fn sleep_until(&self, deadline: Instant) -> bool {
        loop {
            if self.shared.session.shutdown_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(MAX_NAP));
        }
    }
}
