use crate::keymap::{transport_action, TransportAction};
use crate::shared::{drive, SharedTracker};
use pocket_core::{AudioTransport, Event, EventFilter, EventKind};
use pocket_events::{EventBus, Subscriber, WeakEventBus};
use pocket_playback::Tracker;
use std::cell::RefCell;
use tracing::debug;

/// Drives the audio transport and turns buttons into tracker calls
pub struct TransportReactor {
    tracker: SharedTracker,
    bus: WeakEventBus,
    transport: RefCell<Box<dyn AudioTransport>>,
}

impl TransportReactor {
    pub const FILTER: EventFilter = EventFilter::BUTTONS
        .union(EventFilter::VOLUME_ADJUST)
        .union(EventFilter::PLAYBACK);

    pub fn new(tracker: SharedTracker, bus: &EventBus, transport: Box<dyn AudioTransport>) -> Self {
        Self {
            tracker,
            bus: bus.downgrade(),
            transport: RefCell::new(transport),
        }
    }

    fn apply(&self, action: TransportAction) -> anyhow::Result<()> {
        let Some(bus) = self.bus.upgrade() else {
            return Ok(());
        };

        let outcome = match action {
            TransportAction::TogglePause => {
                drive(&self.tracker, &bus, Tracker::toggle_pause).map(|_| ())
            }
            TransportAction::SkipForward => drive(&self.tracker, &bus, Tracker::skip_forward),
            TransportAction::SkipBackward => drive(&self.tracker, &bus, Tracker::skip_backward),
            TransportAction::AdjustVolume(delta) => {
                self.transport.borrow_mut().adjust_volume(delta)?;
                Ok(())
            }
        };

        // Nothing loaded or nowhere to go: the press simply has no effect
        if let Err(e) = outcome {
            debug!(?action, "Ignored: {}", e);
        }
        Ok(())
    }

    /// Load the current file at the tracker's position
    fn load(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let (offset, paused) = {
            let tracker = self.tracker.borrow();
            tracker
                .session()
                .filter(|s| s.file_path == path)
                .map_or((0, false), |s| (s.position_seconds, s.is_paused))
        };

        let mut transport = self.transport.borrow_mut();
        transport.play(path, offset)?;
        if paused {
            transport.pause()?;
        }
        Ok(())
    }
}

impl Subscriber for TransportReactor {
    fn handle(&self, event: &Event) -> anyhow::Result<()> {
        if let Some(action) = transport_action(event) {
            return self.apply(action);
        }

        match &event.kind {
            EventKind::TrackChanged { path } => self.load(path)?,
            EventKind::PlaybackPaused => self.transport.borrow_mut().pause()?,
            EventKind::PlaybackResumed => self.transport.borrow_mut().resume()?,
            _ => {}
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "transport"
    }
}
