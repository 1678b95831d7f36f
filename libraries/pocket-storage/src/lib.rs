//! Pocket Player - Storage
//!
//! Crash-safe persistence of bookmarks, podcast progress and playlists.
//!
//! # Write protocol
//!
//! 1. Merge the delta into the in-memory root
//! 2. Serialize the whole root and write it to `<file>.tmp`
//! 3. Rename `<file>.tmp` over `<file>`
//!
//! A failed step leaves the previous file untouched and the engine dirty;
//! [`PersistenceEngine::retry`] rewrites the full root later.
//!
//! # Example
//!
//! ```rust
//! use pocket_core::StateDelta;
//! use pocket_storage::{MemoryFileStore, PersistenceEngine, StateFormat};
//! use std::path::PathBuf;
//! use std::rc::Rc;
//!
//! let store = MemoryFileStore::new();
//! let mut engine = PersistenceEngine::new(Rc::new(store.clone()), "/state.yaml", StateFormat::Yaml);
//! engine.load();
//!
//! engine
//!     .save(StateDelta::Bookmark {
//!         path: PathBuf::from("/music/a.mp3"),
//!         position_seconds: 42,
//!     })
//!     .unwrap();
//!
//! let mut reloaded = PersistenceEngine::new(Rc::new(store), "/state.yaml", StateFormat::Yaml);
//! assert_eq!(reloaded.load().current_track.as_ref().unwrap().position_seconds, 42);
//! ```

mod engine;
mod error;
mod file_store;
mod format;
mod memory;

pub use engine::PersistenceEngine;
pub use error::{Result, StorageError};
pub use file_store::LocalFileStore;
pub use format::StateFormat;
pub use memory::MemoryFileStore;
