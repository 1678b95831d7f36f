//! Persistence engine
//!
//! Owns the in-memory [`PersistedState`] root and is the only writer of the
//! state file. Every commit serializes the full root to `<file>.tmp` and
//! renames it over `<file>`, so a power cut leaves either the previous or
//! the new version on the card, never a torn one.

use crate::error::{Result, StorageError};
use crate::format::StateFormat;
use pocket_core::{FileStore, PersistedState, PocketError, StateDelta, TrackMetadata};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Single writer of the playback state file
pub struct PersistenceEngine {
    store: Rc<dyn FileStore>,
    path: PathBuf,
    tmp_path: PathBuf,
    format: StateFormat,
    state: PersistedState,
    /// In-memory root holds changes the file does not
    dirty: bool,
    consecutive_failures: u32,
}

impl PersistenceEngine {
    pub fn new(store: Rc<dyn FileStore>, path: impl Into<PathBuf>, format: StateFormat) -> Self {
        let path = path.into();
        Self {
            store,
            tmp_path: sibling(&path, ".tmp"),
            path,
            format,
            state: PersistedState::default(),
            dirty: false,
            consecutive_failures: 0,
        }
    }

    /// Read the state file into memory
    ///
    /// Never fails: a missing, unreadable or unparseable file yields the
    /// default state, which is written back straight away. An unparseable
    /// file is first moved aside to `<file>.corrupt`. A leftover `<file>.tmp`
    /// from an interrupted commit is discarded.
    pub fn load(&mut self) -> &PersistedState {
        self.discard_stale_tmp();

        let loaded = match self.store.read_file(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => {
                info!("Playback state at {:?} is blank, starting fresh", self.path);
                None
            }
            Ok(bytes) => match self.format.decode(&bytes) {
                Ok(state) => Some(state),
                Err(e) => {
                    warn!(
                        "{}",
                        PocketError::StorageReadFailed(format!("{}: {e}", self.path.display()))
                    );
                    self.quarantine();
                    None
                }
            },
            Err(e) if e.is_not_found() => {
                info!("No playback state at {:?}, starting fresh", self.path);
                None
            }
            Err(e) => {
                warn!("{}", StorageError::read(&self.path, &e));
                None
            }
        };

        match loaded {
            Some(state) => {
                info!(
                    podcasts = state.podcasts.len(),
                    playlists = state.playlists.len(),
                    "Loaded playback state from {:?}",
                    self.path
                );
                self.state = state;
                self.dirty = false;
            }
            None => {
                self.state = PersistedState::default();
                self.dirty = true;
                if let Err(e) = self.commit() {
                    warn!("Could not write default state: {}", e);
                }
            }
        }

        &self.state
    }

    /// Merge one delta and commit
    ///
    /// Skips the write when nothing changed and nothing is pending. On
    /// failure the change stays in memory and the engine stays dirty.
    pub fn save(&mut self, delta: StateDelta) -> Result<()> {
        self.save_all(std::iter::once(delta))
    }

    /// Merge several deltas and commit them in one write
    pub fn save_all(&mut self, deltas: impl IntoIterator<Item = StateDelta>) -> Result<()> {
        let mut changed = false;
        for delta in deltas {
            changed |= self.state.apply(delta);
        }

        if !changed && !self.dirty {
            debug!("State unchanged, skipping write");
            return Ok(());
        }

        self.dirty = true;
        self.commit()
    }

    /// Rewrite the full root if an earlier commit failed
    pub fn retry(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        debug!(
            failures = self.consecutive_failures,
            "Retrying state write"
        );
        self.commit()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Commits that failed since the last successful one
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Read-only view of the in-memory root
    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn podcast(&self, path: &Path) -> Option<&TrackMetadata> {
        self.state.podcast(path)
    }

    /// Playlist names, sorted
    pub fn playlists(&self) -> Vec<&str> {
        self.state.playlists.keys().map(String::as_str).collect()
    }

    /// Playlist entries whose file still exists
    ///
    /// Stale references are skipped with a warning but stay in the file.
    pub fn playlist_entries(&self, name: &str) -> Vec<PathBuf> {
        let Some(entries) = self.state.playlists.get(name) else {
            return Vec::new();
        };

        entries
            .iter()
            .filter(|path| {
                let present = self.store.exists(path);
                if !present {
                    warn!(
                        playlist = name,
                        "{}",
                        PocketError::InvalidQueueReference((*path).clone())
                    );
                }
                present
            })
            .cloned()
            .collect()
    }

    /// Delete every played podcast file and forget its metadata
    ///
    /// Only allowed when `storage.delete_played` is on. `keep` is the file
    /// currently loaded; it stays until a later purge. Files that cannot be
    /// deleted keep their metadata. Returns the paths that were purged.
    pub fn purge_played(&mut self, enabled: bool, keep: Option<&Path>) -> Result<Vec<PathBuf>> {
        if !enabled {
            return Err(StorageError::PurgeDisabled);
        }

        let played: Vec<PathBuf> = self
            .state
            .podcasts
            .values()
            .filter(|meta| meta.played)
            .filter(|meta| {
                let active = keep == Some(meta.file_path.as_path());
                if active {
                    debug!("Keeping {:?}, still loaded", meta.file_path);
                }
                !active
            })
            .map(|meta| meta.file_path.clone())
            .collect();

        let mut purged = Vec::new();
        let mut deltas = Vec::new();
        for path in played {
            match self.store.remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => debug!("{:?} already gone", path),
                Err(e) => {
                    warn!("Could not delete {:?}: {}", path, e);
                    continue;
                }
            }
            if self
                .state
                .current_track
                .as_ref()
                .is_some_and(|bookmark| bookmark.path == path)
            {
                deltas.push(StateDelta::ClearBookmark);
            }
            deltas.push(StateDelta::ForgetPodcast { path: path.clone() });
            purged.push(path);
        }

        info!(count = purged.len(), "Purged played podcasts");
        self.save_all(deltas)?;
        Ok(purged)
    }

    /// Collaborator used for all file access
    pub fn store(&self) -> Rc<dyn FileStore> {
        Rc::clone(&self.store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> StateFormat {
        self.format
    }

    fn commit(&mut self) -> Result<()> {
        match self.write_through() {
            Ok(()) => {
                if self.consecutive_failures > 0 {
                    info!(
                        after = self.consecutive_failures,
                        "State write recovered"
                    );
                }
                self.dirty = false;
                self.consecutive_failures = 0;
                debug!("Committed playback state to {:?}", self.path);
                Ok(())
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(failures = self.consecutive_failures, "State write failed: {}", e);
                Err(e)
            }
        }
    }

    fn write_through(&self) -> Result<()> {
        let bytes = self.format.encode(&self.state)?;
        self.store
            .write_file(&self.tmp_path, &bytes)
            .map_err(|e| StorageError::write(&self.tmp_path, e))?;
        self.store
            .rename(&self.tmp_path, &self.path)
            .map_err(|e| StorageError::write(&self.path, e))?;
        Ok(())
    }

    fn discard_stale_tmp(&self) {
        if !self.store.exists(&self.tmp_path) {
            return;
        }
        warn!("Discarding interrupted write {:?}", self.tmp_path);
        if let Err(e) = self.store.remove_file(&self.tmp_path) {
            warn!("Could not remove {:?}: {}", self.tmp_path, e);
        }
    }

    fn quarantine(&self) {
        let corrupt = sibling(&self.path, ".corrupt");
        match self.store.rename(&self.path, &corrupt) {
            Ok(()) => warn!("Unreadable state preserved as {:?}", corrupt),
            Err(e) => warn!("Could not preserve unreadable state: {}", e),
        }
    }
}

impl std::fmt::Debug for PersistenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceEngine")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("dirty", &self.dirty)
            .field("consecutive_failures", &self.consecutive_failures)
            .finish_non_exhaustive()
    }
}
