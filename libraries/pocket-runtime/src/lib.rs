//! Pocket Player - Runtime
//!
//! Single-threaded coordination layer: raw input goes through the
//! interpreter onto the bus, where the tracker and the subsystem reactors
//! pick it up.
//!
//! ```text
//! RawSignal -> InputInterpreter -> EventBus -> TrackerSubscriber -> Tracker -> PersistenceEngine
//!                                           -> TransportReactor  -> AudioTransport
//!                                           -> DisplayReactor    -> Renderer
//! ```
//!
//! Everything runs on the poll loop. Timers are deadlines, dispatch is
//! synchronous, and the only variable-latency step is the state file write.

pub mod keymap;
pub mod reactors;
mod runtime;
mod shared;

pub use keymap::{menu_action, transport_action, TransportAction};
pub use reactors::{DisplayReactor, TransportReactor};
pub use runtime::{Collaborators, Runtime};
pub use shared::{drive, SharedTracker, TrackerSubscriber};
