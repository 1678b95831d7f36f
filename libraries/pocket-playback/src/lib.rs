//! Pocket Player - Playback Session Tracking
//!
//! Platform-agnostic owner of "what is playing".
//!
//! # Features
//!
//! - One active session at a time, replaced only after the outgoing
//!   position has been flushed to storage
//! - Queue navigation that skips files missing from the card
//! - Podcast resume points and the latched "played" flag
//! - Periodic bookmarks, pause flushes and write retries
//! - Playlist management through the persistence engine
//!
//! # Example
//!
//! ```rust
//! use pocket_core::{MediaKind, PlayerConfig, TrackProbe};
//! use pocket_playback::Tracker;
//! use pocket_storage::{MemoryFileStore, PersistenceEngine, StateFormat};
//! use std::path::{Path, PathBuf};
//! use std::rc::Rc;
//!
//! struct Probe;
//!
//! impl TrackProbe for Probe {
//!     fn duration_seconds(&self, _path: &Path) -> Option<u32> {
//!         Some(180)
//!     }
//!
//!     fn media_kind(&self, _path: &Path) -> MediaKind {
//!         MediaKind::Music
//!     }
//! }
//!
//! let store = MemoryFileStore::new();
//! store.insert("/music/a.mp3", "audio");
//! store.insert("/music/b.mp3", "audio");
//!
//! let mut engine = PersistenceEngine::new(Rc::new(store), "/state.yaml", StateFormat::Yaml);
//! engine.load();
//!
//! let mut tracker = Tracker::new(&PlayerConfig::default(), engine, Rc::new(Probe));
//! tracker
//!     .play(vec![PathBuf::from("/music/a.mp3"), PathBuf::from("/music/b.mp3")], 0)
//!     .unwrap();
//! tracker.on_tick(20_000);
//! tracker.skip_forward().unwrap();
//!
//! let bookmark = tracker.engine().state().current_track.clone().unwrap();
//! assert_eq!(bookmark.path, PathBuf::from("/music/b.mp3"));
//! ```

mod error;
mod tracker;

pub use error::{PlaybackError, Result};
pub use tracker::{Tracker, TrackerSettings, UNSAVED_AFTER_FAILURES};
