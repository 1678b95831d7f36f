//! Pocket Player Core
//!
//! Platform-agnostic types, configuration, errors and collaborator traits
//! shared by every Pocket Player library.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Event`, `InputMode`, `PlaybackSession`, `PersistedState`, etc.
//! - **Configuration**: `PlayerConfig`, loaded with per-key default substitution
//! - **Collaborator Traits**: `FileStore`, `TrackProbe`, `Renderer`, `AudioTransport`, `Clock`
//! - **Error Handling**: Unified `PocketError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use pocket_core::types::{PersistedState, StateDelta};
//! use std::path::PathBuf;
//!
//! let mut state = PersistedState::default();
//! state.apply(StateDelta::AppendToPlaylist {
//!     name: "Commute".to_string(),
//!     path: PathBuf::from("/music/song.mp3"),
//! });
//!
//! assert_eq!(state.playlists["Commute"].len(), 1);
//! ```

#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::PlayerConfig;
pub use error::{PocketError, Result};
pub use traits::{AudioTransport, FileStore, Renderer, TrackProbe};

pub use types::{
    Bookmark, Event, EventFilter, EventKind, InputMode, MediaKind, MenuAction, NowPlaying,
    PersistedState, PlaybackSession, RotaryDirection, ScreenState, StateDelta, TrackMetadata,
};
