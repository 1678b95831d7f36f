//! Bus events
//!
//! Events are emitted by the input interpreter (classified input, screen
//! transitions), by the playback tracker (track and pause changes,
//! persistence status) and by the runtime poll loop (periodic ticks).

use super::InputMode;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Physical rotation of the encoder, independent of the configured sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotaryDirection {
    Clockwise,
    CounterClockwise,
}

/// Event variants carried on the bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Single tap (no second tap inside the double-tap window)
    ButtonPress,

    /// Two taps inside the double-tap window
    ButtonDoubleTap,

    /// Button held past the long-press threshold
    ButtonLongPress,

    /// Encoder motion
    RotaryTurn {
        /// Physical rotation
        direction: RotaryDirection,
        /// Semantic change, sign set by `inputs.rotary_encoder_direction`
        delta: i32,
    },

    /// Encoder motion reinterpreted as volume while the screen is off
    VolumeAdjust { delta: i32 },

    /// Display woke up
    ScreenWake,

    /// Display went to sleep
    ScreenSleep,

    /// A new playback session is active
    TrackChanged { path: PathBuf },

    /// Playback entered the paused state
    PlaybackPaused,

    /// Playback left the paused state
    PlaybackResumed,

    /// Poll-loop heartbeat
    PeriodicTick {
        /// Time since the previous tick
        elapsed_ms: u64,
    },

    /// Whether playback state is currently failing to persist
    PersistenceStatus { unsaved: bool },
}

impl EventKind {
    /// The filter bit matching this variant
    pub fn filter(&self) -> EventFilter {
        match self {
            Self::ButtonPress => EventFilter::BUTTON_PRESS,
            Self::ButtonDoubleTap => EventFilter::BUTTON_DOUBLE_TAP,
            Self::ButtonLongPress => EventFilter::BUTTON_LONG_PRESS,
            Self::RotaryTurn { .. } => EventFilter::ROTARY_TURN,
            Self::VolumeAdjust { .. } => EventFilter::VOLUME_ADJUST,
            Self::ScreenWake => EventFilter::SCREEN_WAKE,
            Self::ScreenSleep => EventFilter::SCREEN_SLEEP,
            Self::TrackChanged { .. } => EventFilter::TRACK_CHANGED,
            Self::PlaybackPaused => EventFilter::PLAYBACK_PAUSED,
            Self::PlaybackResumed => EventFilter::PLAYBACK_RESUMED,
            Self::PeriodicTick { .. } => EventFilter::PERIODIC_TICK,
            Self::PersistenceStatus { .. } => EventFilter::PERSISTENCE_STATUS,
        }
    }

    /// Whether this variant is a classified user input
    pub fn is_input(&self) -> bool {
        EventFilter::INPUT.contains(self.filter())
    }
}

bitflags! {
    /// Set of event kinds a subscriber wants to receive
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventFilter: u16 {
        const BUTTON_PRESS = 1 << 0;
        const BUTTON_DOUBLE_TAP = 1 << 1;
        const BUTTON_LONG_PRESS = 1 << 2;
        const ROTARY_TURN = 1 << 3;
        const VOLUME_ADJUST = 1 << 4;
        const SCREEN_WAKE = 1 << 5;
        const SCREEN_SLEEP = 1 << 6;
        const TRACK_CHANGED = 1 << 7;
        const PLAYBACK_PAUSED = 1 << 8;
        const PLAYBACK_RESUMED = 1 << 9;
        const PERIODIC_TICK = 1 << 10;
        const PERSISTENCE_STATUS = 1 << 11;

        const BUTTONS = Self::BUTTON_PRESS.bits()
            | Self::BUTTON_DOUBLE_TAP.bits()
            | Self::BUTTON_LONG_PRESS.bits();
        const INPUT = Self::BUTTONS.bits()
            | Self::ROTARY_TURN.bits()
            | Self::VOLUME_ADJUST.bits();
        const SCREEN = Self::SCREEN_WAKE.bits() | Self::SCREEN_SLEEP.bits();
        const PLAYBACK = Self::TRACK_CHANGED.bits()
            | Self::PLAYBACK_PAUSED.bits()
            | Self::PLAYBACK_RESUMED.bits();
    }
}

/// A timestamped, immutable bus event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Milliseconds since boot
    pub timestamp_ms: u64,
    /// Input mode in effect once this event has been applied
    pub mode: InputMode,
    pub kind: EventKind,
}

impl Event {
    pub fn new(kind: EventKind, timestamp_ms: u64, mode: InputMode) -> Self {
        Self {
            timestamp_ms,
            mode,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_maps_to_one_filter_bit() {
        let kinds = [
            EventKind::ButtonPress,
            EventKind::ButtonDoubleTap,
            EventKind::ButtonLongPress,
            EventKind::RotaryTurn {
                direction: RotaryDirection::Clockwise,
                delta: 1,
            },
            EventKind::VolumeAdjust { delta: -1 },
            EventKind::ScreenWake,
            EventKind::ScreenSleep,
            EventKind::TrackChanged {
                path: PathBuf::from("/music/a.mp3"),
            },
            EventKind::PlaybackPaused,
            EventKind::PlaybackResumed,
            EventKind::PeriodicTick { elapsed_ms: 1000 },
            EventKind::PersistenceStatus { unsaved: true },
        ];

        let mut seen = EventFilter::empty();
        for kind in &kinds {
            let bit = kind.filter();
            assert_eq!(bit.bits().count_ones(), 1, "{kind:?}");
            assert!(!seen.intersects(bit), "{kind:?} shares a bit");
            seen |= bit;
        }
    }

    #[test]
    fn input_group_covers_classified_input_only() {
        assert!(EventKind::ButtonDoubleTap.is_input());
        assert!(EventKind::VolumeAdjust { delta: 2 }.is_input());
        assert!(!EventKind::ScreenWake.is_input());
        assert!(!EventKind::PeriodicTick { elapsed_ms: 1 }.is_input());
    }
}
