//! Poll-loop runtime
//!
//! Owns the bus, the input interpreter and the shared tracker, and wires the
//! reactors at boot. The platform calls [`Runtime::handle_signal`] for every
//! raw input and [`Runtime::poll`] on each loop iteration; neither blocks.

use crate::reactors::{DisplayReactor, TransportReactor};
use crate::shared::{drive, SharedTracker, TrackerSubscriber};
use pocket_core::{
    AudioTransport, Clock, EventKind, FileStore, InputMode, PlayerConfig, Renderer, TrackProbe,
};
use pocket_events::EventBus;
use pocket_input::{InputInterpreter, RawSignal};
use pocket_playback::{PlaybackError, Tracker};
use pocket_storage::{PersistenceEngine, StateFormat};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Platform services handed to the runtime at boot
pub struct Collaborators {
    pub store: Rc<dyn FileStore>,
    pub probe: Rc<dyn TrackProbe>,
    pub renderer: Box<dyn Renderer>,
    pub transport: Box<dyn AudioTransport>,
    pub clock: Rc<dyn Clock>,
}

/// The assembled player core
pub struct Runtime {
    config: PlayerConfig,
    clock: Rc<dyn Clock>,
    bus: EventBus,
    input: InputInterpreter,
    tracker: SharedTracker,
    last_tick_ms: u64,
    next_tick_ms: u64,
}

impl Runtime {
    /// Load state, wire subscribers, restore the bookmark and wake the screen
    ///
    /// The state file format follows its extension (YAML unless `.json`).
    pub fn boot(
        config: PlayerConfig,
        state_path: impl Into<PathBuf>,
        collaborators: Collaborators,
    ) -> Self {
        let Collaborators {
            store,
            probe,
            renderer,
            transport,
            clock,
        } = collaborators;

        let state_path = state_path.into();
        let format = StateFormat::from_path(&state_path);
        let mut engine = PersistenceEngine::new(store, state_path, format);
        engine.load();

        let tracker: SharedTracker = Rc::new(RefCell::new(Tracker::new(&config, engine, probe)));
        let bus = EventBus::new(Rc::clone(&clock));

        // Tracker first so reactors see the updated session
        bus.subscribe(
            TrackerSubscriber::FILTER,
            Rc::new(TrackerSubscriber::new(Rc::clone(&tracker), &bus)),
        );
        bus.subscribe(
            TransportReactor::FILTER,
            Rc::new(TransportReactor::new(Rc::clone(&tracker), &bus, transport)),
        );
        bus.subscribe(
            DisplayReactor::FILTER,
            Rc::new(DisplayReactor::new(Rc::clone(&tracker), renderer)),
        );

        let now = clock.now_ms();
        let mut runtime = Self {
            input: InputInterpreter::new(&config),
            next_tick_ms: now.saturating_add(config.playback.tick_interval_ms),
            last_tick_ms: now,
            config,
            clock,
            bus,
            tracker,
        };

        match runtime.drive(Tracker::resume_from_bookmark) {
            Ok(true) => {}
            Ok(false) => debug!("Nothing to resume"),
            Err(e) => warn!("Could not resume: {}", e),
        }

        runtime.wake();
        info!(subscribers = runtime.bus.subscriber_count(), "Runtime booted");
        runtime
    }

    /// Classify one raw signal and publish whatever it produced
    pub fn handle_signal(&mut self, signal: RawSignal) {
        let now = self.clock.now_ms();
        self.input.handle(signal, now);
        self.publish_input();
    }

    /// Fire due deadlines and the periodic heartbeat
    pub fn poll(&mut self) {
        let now = self.clock.now_ms();
        self.input.poll(now);
        self.publish_input();

        if now >= self.next_tick_ms {
            let elapsed_ms = now - self.last_tick_ms;
            self.last_tick_ms = now;
            self.next_tick_ms = now.saturating_add(self.config.playback.tick_interval_ms);
            self.bus.emit(EventKind::PeriodicTick { elapsed_ms });
        }
    }

    /// Wake the screen from outside the input path
    pub fn wake(&mut self) {
        let now = self.clock.now_ms();
        self.input.wake(now);
        self.publish_input();
    }

    /// Put the screen to sleep from outside the input path
    pub fn sleep(&mut self) {
        let now = self.clock.now_ms();
        self.input.sleep(now);
        self.publish_input();
    }

    /// Call into the tracker and publish what it queued
    ///
    /// Menu actions (play a folder, a playlist, seek) go through here.
    pub fn drive<T>(&self, f: impl FnOnce(&mut Tracker) -> T) -> T {
        drive(&self.tracker, &self.bus, f)
    }

    /// Delete played podcasts, if `storage.delete_played` allows it
    pub fn purge_played(&self) -> Result<Vec<PathBuf>, PlaybackError> {
        let enabled = self.config.storage.delete_played;
        self.drive(|tracker| tracker.purge_played(enabled))
    }

    /// Earliest time `poll` has something to do
    pub fn next_deadline(&self) -> u64 {
        self.input
            .next_deadline()
            .map_or(self.next_tick_ms, |deadline| deadline.min(self.next_tick_ms))
    }

    pub fn mode(&self) -> InputMode {
        self.input.mode()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn tracker(&self) -> &SharedTracker {
        &self.tracker
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    fn publish_input(&mut self) {
        for event in self.input.drain_events() {
            self.bus.publish(&event);
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("mode", &self.mode())
            .field("bus", &self.bus)
            .field("next_tick_ms", &self.next_tick_ms)
            .finish_non_exhaustive()
    }
}
