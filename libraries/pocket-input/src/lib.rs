//! Pocket Player - Input Interpretation
//!
//! Turns raw button and rotary encoder signals into classified bus events.
//!
//! The interpreter is an explicit state machine with two orthogonal axes:
//! - **Mode**: `ScreenOn` (menu navigation) vs `ScreenOff` (media control)
//! - **Tap**: `Idle`, `Held`, `AwaitingSecondTap`
//!
//! Every timer (double-tap window, long-press window, screen timeout) is a
//! deadline checked by [`InputInterpreter::poll`]; nothing blocks. The
//! interpreter decides *which* event is worth emitting but never what the
//! application does with it.
//!
//! # Example
//!
//! ```rust
//! use pocket_core::{EventKind, PlayerConfig};
//! use pocket_input::{InputInterpreter, RawSignal};
//!
//! let mut input = InputInterpreter::new(&PlayerConfig::default());
//! input.wake(0);
//!
//! input.handle(RawSignal::ButtonDown, 1_000);
//! input.handle(RawSignal::ButtonUp, 1_060);
//! input.handle(RawSignal::ButtonDown, 1_200);
//! input.handle(RawSignal::ButtonUp, 1_260);
//!
//! let kinds: Vec<EventKind> = input.drain_events().into_iter().map(|e| e.kind).collect();
//! assert_eq!(kinds, vec![EventKind::ScreenWake, EventKind::ButtonDoubleTap]);
//! ```

mod interpreter;
mod signal;

pub use interpreter::{InputInterpreter, InterpreterSettings, TapState};
pub use signal::RawSignal;
