//! Subsystem reactors
//!
//! Bus subscribers that translate events into collaborator calls. They hold
//! no authoritative state and read a fresh tracker snapshot per event.

mod display;
mod transport;

pub use display::DisplayReactor;
pub use transport::TransportReactor;
