//! Input classification state machine

use crate::RawSignal;
use pocket_core::config::{EncoderDirection, ScreenOffRotary, WakeTrigger};
use pocket_core::{Event, EventKind, InputMode, PlayerConfig, RotaryDirection};
use tracing::{debug, trace};

/// Tap-classification axis of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapState {
    /// No press in progress
    Idle,
    /// Button down, long-press window open
    Held { pressed_at: u64 },
    /// First tap released, double-tap window open (anchored at the first press)
    AwaitingSecondTap { first_pressed_at: u64 },
}

/// Timing and mapping knobs, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterSettings {
    pub double_tap_ms: u64,
    pub long_press_ms: u64,
    pub encoder_direction: EncoderDirection,
    pub screen_off_rotary: ScreenOffRotary,
    pub screen_timeout_ms: u64,
    pub wake_on: WakeTrigger,
}

impl From<&PlayerConfig> for InterpreterSettings {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            double_tap_ms: config.inputs.double_tap_threshold_ms,
            long_press_ms: config.inputs.long_press_threshold_ms,
            encoder_direction: config.inputs.rotary_encoder_direction,
            screen_off_rotary: config.inputs.screen_off_rotary,
            screen_timeout_ms: config.screen.timeout_seconds.saturating_mul(1000),
            wake_on: config.screen.wake_on,
        }
    }
}

/// Mode-aware classifier for the single button and rotary encoder
///
/// Starts with the screen off; the runtime wakes it at boot.
#[derive(Debug)]
pub struct InputInterpreter {
    settings: InterpreterSettings,
    mode: InputMode,
    tap: TapState,
    /// Screen timeout deadline, only set while the screen is on
    screen_deadline: Option<u64>,
    pending_events: Vec<Event>,
}

impl InputInterpreter {
    pub fn new(config: &PlayerConfig) -> Self {
        Self::with_settings(InterpreterSettings::from(config))
    }

    pub fn with_settings(settings: InterpreterSettings) -> Self {
        Self {
            settings,
            mode: InputMode::ScreenOff,
            tap: TapState::Idle,
            screen_deadline: None,
            pending_events: Vec::new(),
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn tap_state(&self) -> TapState {
        self.tap
    }

    pub fn settings(&self) -> &InterpreterSettings {
        &self.settings
    }

    /// Take the events classified since the last drain
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events)
    }

    /// Earliest pending deadline, so the poll loop knows when to come back
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.tap_deadline(), self.screen_deadline) {
            (Some(tap), Some(screen)) => Some(tap.min(screen)),
            (tap, screen) => tap.or(screen),
        }
    }

    /// Feed one raw signal observed at `now_ms`
    pub fn handle(&mut self, signal: RawSignal, now_ms: u64) {
        // Settle anything that expired before this signal arrived
        self.poll(now_ms);

        if self.mode == InputMode::ScreenOff && self.wakes_screen(signal) {
            debug!(?signal, "Wake signal consumed");
            self.wake_up(now_ms);
            return;
        }

        match signal {
            RawSignal::ButtonDown => self.press(now_ms),
            RawSignal::ButtonUp => self.release(now_ms),
            RawSignal::Rotary { steps } => self.rotate(steps, now_ms),
        }
    }

    /// Fire every deadline that has passed, in time order
    pub fn poll(&mut self, now_ms: u64) {
        loop {
            let tap_due = self.tap_deadline().filter(|&at| at <= now_ms);
            let screen_due = self.screen_deadline.filter(|&at| at <= now_ms);

            match (tap_due, screen_due) {
                (Some(tap), Some(screen)) if screen < tap => self.enter_sleep(screen),
                (Some(tap), _) => self.expire_tap(tap),
                (None, Some(screen)) => self.enter_sleep(screen),
                (None, None) => break,
            }
        }
    }

    /// Explicit wake from outside the input path
    pub fn wake(&mut self, now_ms: u64) {
        self.poll(now_ms);
        if self.mode == InputMode::ScreenOff {
            self.wake_up(now_ms);
        } else {
            self.touch(now_ms);
        }
    }

    /// Explicit sleep from outside the input path
    pub fn sleep(&mut self, now_ms: u64) {
        self.poll(now_ms);
        if self.mode == InputMode::ScreenOn {
            self.enter_sleep(now_ms);
        }
    }

    fn wakes_screen(&self, signal: RawSignal) -> bool {
        match self.settings.wake_on {
            WakeTrigger::AnySignal => match signal {
                RawSignal::ButtonDown => true,
                RawSignal::Rotary { steps } => steps != 0,
                // The tail of a press is never a user action on its own
                RawSignal::ButtonUp => false,
            },
            WakeTrigger::LongPress => false,
        }
    }

    fn tap_deadline(&self) -> Option<u64> {
        match self.tap {
            TapState::Idle => None,
            TapState::Held { pressed_at } => {
                Some(pressed_at.saturating_add(self.settings.long_press_ms))
            }
            TapState::AwaitingSecondTap { first_pressed_at } => {
                Some(first_pressed_at.saturating_add(self.settings.double_tap_ms))
            }
        }
    }

    fn press(&mut self, now_ms: u64) {
        self.touch(now_ms);
        match self.tap {
            TapState::AwaitingSecondTap { first_pressed_at }
                if now_ms.saturating_sub(first_pressed_at) < self.settings.double_tap_ms =>
            {
                self.tap = TapState::Idle;
                self.classify(EventKind::ButtonDoubleTap, now_ms);
            }
            _ => self.tap = TapState::Held { pressed_at: now_ms },
        }
    }

    fn release(&mut self, now_ms: u64) {
        self.touch(now_ms);
        // Holds past the long-press threshold were already classified by poll()
        if let TapState::Held { pressed_at } = self.tap {
            if now_ms.saturating_sub(pressed_at) >= self.settings.double_tap_ms {
                // Held through the whole double-tap window
                self.tap = TapState::Idle;
                self.classify(EventKind::ButtonPress, now_ms);
            } else {
                self.tap = TapState::AwaitingSecondTap {
                    first_pressed_at: pressed_at,
                };
            }
        }
    }

    fn rotate(&mut self, steps: i32, now_ms: u64) {
        if steps == 0 {
            return;
        }

        let direction = if steps > 0 {
            RotaryDirection::Clockwise
        } else {
            RotaryDirection::CounterClockwise
        };
        let delta = match self.settings.encoder_direction {
            EncoderDirection::ClockwiseIncrease => steps,
            EncoderDirection::ClockwiseDecrease => steps.saturating_neg(),
        };

        match (self.mode, self.settings.screen_off_rotary) {
            (InputMode::ScreenOn, _) => {
                self.classify(EventKind::RotaryTurn { direction, delta }, now_ms);
            }
            (InputMode::ScreenOff, ScreenOffRotary::Volume) => {
                self.classify(EventKind::VolumeAdjust { delta }, now_ms);
            }
            (InputMode::ScreenOff, ScreenOffRotary::Suppress) => {
                trace!(delta, "Rotary motion suppressed while screen is off");
            }
        }
    }

    fn expire_tap(&mut self, at: u64) {
        let kind = match self.tap {
            TapState::Idle => return,
            TapState::Held { .. } => EventKind::ButtonLongPress,
            TapState::AwaitingSecondTap { .. } => EventKind::ButtonPress,
        };
        self.tap = TapState::Idle;
        self.classify(kind, at);
    }

    fn classify(&mut self, kind: EventKind, at: u64) {
        if kind == EventKind::ButtonLongPress
            && self.mode == InputMode::ScreenOff
            && self.settings.wake_on == WakeTrigger::LongPress
        {
            debug!("Long press consumed as wake");
            self.wake_up(at);
            return;
        }

        debug!(?kind, mode = ?self.mode, at, "Classified input");
        self.touch(at);
        self.pending_events.push(Event::new(kind, at, self.mode));
    }

    /// Restart the screen timeout
    fn touch(&mut self, at: u64) {
        if self.mode == InputMode::ScreenOn {
            self.screen_deadline = Some(at.saturating_add(self.settings.screen_timeout_ms));
        }
    }

    fn wake_up(&mut self, at: u64) {
        self.mode = InputMode::ScreenOn;
        self.tap = TapState::Idle;
        self.screen_deadline = Some(at.saturating_add(self.settings.screen_timeout_ms));
        debug!(at, "Screen wake");
        self.pending_events
            .push(Event::new(EventKind::ScreenWake, at, self.mode));
    }

    fn enter_sleep(&mut self, at: u64) {
        self.mode = InputMode::ScreenOff;
        self.screen_deadline = None;
        if self.settings.wake_on == WakeTrigger::AnySignal {
            // A press started on the menu must not turn into a media action
            self.tap = TapState::Idle;
        }
        debug!(at, "Screen sleep");
        self.pending_events
            .push(Event::new(EventKind::ScreenSleep, at, self.mode));
    }
}
