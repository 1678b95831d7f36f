use crate::keymap::menu_action;
use crate::shared::SharedTracker;
use pocket_core::{Event, EventFilter, EventKind, Renderer, ScreenState};
use pocket_events::Subscriber;
use std::cell::RefCell;

/// Keeps the screen in step with the session and forwards menu input
pub struct DisplayReactor {
    tracker: SharedTracker,
    renderer: RefCell<Box<dyn Renderer>>,
}

impl DisplayReactor {
    pub const FILTER: EventFilter = EventFilter::SCREEN
        .union(EventFilter::PLAYBACK)
        .union(EventFilter::PERIODIC_TICK)
        .union(EventFilter::PERSISTENCE_STATUS)
        .union(EventFilter::ROTARY_TURN)
        .union(EventFilter::BUTTON_DOUBLE_TAP)
        .union(EventFilter::BUTTON_LONG_PRESS);

    pub fn new(tracker: SharedTracker, renderer: Box<dyn Renderer>) -> Self {
        Self {
            tracker,
            renderer: RefCell::new(renderer),
        }
    }

    fn snapshot(&self) -> ScreenState {
        let tracker = self.tracker.borrow();
        ScreenState::awake(tracker.session(), tracker.is_unsaved())
    }
}

impl Subscriber for DisplayReactor {
    fn handle(&self, event: &Event) -> anyhow::Result<()> {
        if let Some(action) = menu_action(event) {
            self.renderer.borrow_mut().navigate(action)?;
            return Ok(());
        }

        let screen = match event.kind {
            EventKind::ScreenSleep => ScreenState::Off,
            EventKind::ScreenWake
            | EventKind::TrackChanged { .. }
            | EventKind::PlaybackPaused
            | EventKind::PlaybackResumed
            | EventKind::PeriodicTick { .. }
            | EventKind::PersistenceStatus { .. }
                if event.mode.is_screen_on() =>
            {
                self.snapshot()
            }
            _ => return Ok(()),
        };

        self.renderer.borrow_mut().render(&screen)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "display"
    }
}
