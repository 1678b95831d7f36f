//! Shared tracker handle and its bus subscriber

use pocket_core::{Event, EventFilter, EventKind};
use pocket_events::{EventBus, Subscriber, WeakEventBus};
use pocket_playback::Tracker;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// The one tracker, shared by the runtime and the reactors
pub type SharedTracker = Rc<RefCell<Tracker>>;

/// Run `f` on the tracker, then publish the events it queued
///
/// The borrow ends before anything is published, so subscribers reacting
/// to those events can borrow the tracker themselves.
pub fn drive<T>(tracker: &SharedTracker, bus: &EventBus, f: impl FnOnce(&mut Tracker) -> T) -> T {
    let (output, events) = {
        let mut tracker = tracker.borrow_mut();
        let output = f(&mut tracker);
        (output, tracker.drain_events())
    };

    for kind in events {
        bus.emit(kind);
    }
    output
}

/// Feeds bus events the tracker must follow
///
/// Track changes, pause state and ticks can originate anywhere (another
/// reactor, the runtime's heartbeat); the tracker applies them idempotently.
pub struct TrackerSubscriber {
    tracker: SharedTracker,
    bus: WeakEventBus,
}

impl TrackerSubscriber {
    pub const FILTER: EventFilter = EventFilter::TRACK_CHANGED
        .union(EventFilter::PLAYBACK_PAUSED)
        .union(EventFilter::PLAYBACK_RESUMED)
        .union(EventFilter::PERIODIC_TICK);

    pub fn new(tracker: SharedTracker, bus: &EventBus) -> Self {
        Self {
            tracker,
            bus: bus.downgrade(),
        }
    }
}

impl Subscriber for TrackerSubscriber {
    fn handle(&self, event: &Event) -> anyhow::Result<()> {
        let Some(bus) = self.bus.upgrade() else {
            return Ok(());
        };

        match &event.kind {
            EventKind::TrackChanged { path } => {
                drive(&self.tracker, &bus, |t| t.adopt_track(path));
            }
            EventKind::PlaybackPaused => drive(&self.tracker, &bus, |t| t.set_paused(true)),
            EventKind::PlaybackResumed => drive(&self.tracker, &bus, |t| t.set_paused(false)),
            EventKind::PeriodicTick { elapsed_ms } => {
                drive(&self.tracker, &bus, |t| t.on_tick(*elapsed_ms));
            }
            other => trace!(kind = ?other, "Not for the tracker"),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tracker"
    }
}
