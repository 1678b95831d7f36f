//! Playback session tracker
//!
//! Owns the single active [`PlaybackSession`] and the persistence engine.
//! Reactors call the transport methods directly after interpreting an
//! input event; the tracker itself knows nothing about buttons.
//!
//! The tracker never publishes. Events it wants announced are queued and
//! taken with [`Tracker::drain_events`] once the caller has released its
//! borrow, so a subscriber reacting to them can borrow the tracker again.

use crate::error::{PlaybackError, Result};
use pocket_core::{
    EventKind, FileStore, MediaKind, PlaybackSession, PlayerConfig, PocketError, StateDelta,
    TrackProbe,
};
use pocket_storage::PersistenceEngine;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Consecutive failed writes before the "unsaved" indicator is raised
pub const UNSAVED_AFTER_FAILURES: u32 = 2;

/// Timing knobs taken from `playback.*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    pub played_threshold_seconds: u32,
    pub bookmark_interval_ms: u64,
    pub restart_threshold_seconds: u32,
}

impl From<&PlayerConfig> for TrackerSettings {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            played_threshold_seconds: config.playback.played_threshold_seconds,
            bookmark_interval_ms: u64::from(config.playback.bookmark_interval_seconds) * 1000,
            restart_threshold_seconds: config.playback.restart_threshold_seconds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Forward,
    Backward,
}

/// Owner of the active playback session
pub struct Tracker {
    settings: TrackerSettings,
    engine: PersistenceEngine,
    probe: Rc<dyn TrackProbe>,
    session: Option<PlaybackSession>,

    /// Sub-second playback time not yet folded into the position
    position_remainder_ms: u64,
    /// Active playback since the last periodic save
    since_save_ms: u64,
    /// Whether the unsaved indicator is currently raised
    unsaved: bool,

    pending_events: Vec<EventKind>,
}

impl Tracker {
    /// Create a tracker over an already loaded persistence engine
    pub fn new(config: &PlayerConfig, engine: PersistenceEngine, probe: Rc<dyn TrackProbe>) -> Self {
        Self {
            settings: TrackerSettings::from(config),
            engine,
            probe,
            session: None,
            position_remainder_ms: 0,
            since_save_ms: 0,
            unsaved: false,
            pending_events: Vec::new(),
        }
    }

    // ===== Session Lifecycle =====

    /// Restore the bookmarked track, paused
    ///
    /// Announced as a plain track change; the session snapshot already
    /// says it is paused. Returns false when there is no bookmark or its
    /// file is gone.
    pub fn resume_from_bookmark(&mut self) -> Result<bool> {
        let Some(bookmark) = self.engine.state().current_track.clone() else {
            info!("No bookmark to resume");
            return Ok(false);
        };

        if !self.store().exists(&bookmark.path) {
            warn!("{}", PocketError::InvalidQueueReference(bookmark.path));
            return Ok(false);
        }

        let mut session = self.build_session(vec![bookmark.path], 0);
        session.position_seconds = session.clamp_position(i64::from(bookmark.position_seconds));
        session.is_paused = true;
        info!(
            path = ?session.file_path,
            position = session.position_seconds,
            "Resuming from bookmark"
        );

        let path = session.file_path.clone();
        self.install(session);
        self.pending_events.push(EventKind::TrackChanged { path });
        Ok(true)
    }

    /// Start playing `queue` at `index`
    ///
    /// Missing files are skipped forward from `index`.
    pub fn play(&mut self, queue: Vec<PathBuf>, index: usize) -> Result<()> {
        if queue.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }
        if index >= queue.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }

        let index = self
            .find_playable(&queue, Some(index), Step::Forward)
            .ok_or(PlaybackError::EndOfQueue)?;
        self.replace_session(queue, index, true);
        Ok(())
    }

    /// Play a stored playlist from the top, skipping stale entries
    pub fn play_playlist(&mut self, name: &str) -> Result<()> {
        let entries = self.engine.playlist_entries(name);
        self.play(entries, 0)
    }

    /// Move to the next playable queue entry
    pub fn skip_forward(&mut self) -> Result<()> {
        let session = self.session.as_ref().ok_or(PlaybackError::NoSession)?;
        let next = self
            .find_playable(&session.queue, session.queue_index.checked_add(1), Step::Forward)
            .ok_or(PlaybackError::EndOfQueue)?;

        let queue = session.queue.clone();
        self.replace_session(queue, next, true);
        Ok(())
    }

    /// Restart the track, or go to the previous entry near its start
    pub fn skip_backward(&mut self) -> Result<()> {
        let session = self.session.as_ref().ok_or(PlaybackError::NoSession)?;

        let previous = if session.position_seconds > self.settings.restart_threshold_seconds {
            None
        } else {
            self.find_playable(&session.queue, session.queue_index.checked_sub(1), Step::Backward)
        };

        match previous {
            Some(index) => {
                let queue = session.queue.clone();
                self.replace_session(queue, index, true);
            }
            None => self.restart(),
        }
        Ok(())
    }

    /// Flip pause; pausing is a save point
    ///
    /// Returns the new paused state.
    pub fn toggle_pause(&mut self) -> Result<bool> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoSession)?;
        session.is_paused = !session.is_paused;
        let paused = session.is_paused;

        if paused {
            debug!("Paused, flushing");
            self.flush();
            self.pending_events.push(EventKind::PlaybackPaused);
        } else {
            debug!("Resumed");
            self.pending_events.push(EventKind::PlaybackResumed);
        }
        Ok(paused)
    }

    /// Apply a pause state announced by someone else
    ///
    /// Idempotent; queues no events since the caller already published one.
    pub fn set_paused(&mut self, paused: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_paused == paused {
            return;
        }
        session.is_paused = paused;
        if paused {
            self.flush();
        }
    }

    /// Jump by `seconds` (negative rewinds), clamped to the track
    ///
    /// Returns the new position.
    pub fn seek_relative(&mut self, seconds: i32) -> Result<u32> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoSession)?;
        let target = i64::from(session.position_seconds) + i64::from(seconds);
        session.position_seconds = session.clamp_position(target);
        let position = session.position_seconds;
        let path = session.file_path.clone();

        self.position_remainder_ms = 0;
        debug!(position, "Seek");
        self.check_played();
        // Same path: the transport reloads at the new offset
        self.pending_events.push(EventKind::TrackChanged { path });
        Ok(position)
    }

    /// Take the decoder's position as authoritative
    pub fn sync_position(&mut self, seconds: u32) -> Result<()> {
        let session = self.session.as_mut().ok_or(PlaybackError::NoSession)?;
        session.position_seconds = session.clamp_position(i64::from(seconds));
        self.position_remainder_ms = 0;
        self.check_played();
        Ok(())
    }

    /// Adopt a track announced on the bus
    ///
    /// Ignored when it is already the current file. Otherwise the outgoing
    /// session is flushed and the path becomes current, inside the current
    /// queue when it is part of it.
    pub fn adopt_track(&mut self, path: &Path) {
        let (queue, index) = match &self.session {
            Some(session) if session.file_path == path => return,
            Some(session) => match session.queue.iter().position(|p| p == path) {
                Some(index) => (session.queue.clone(), index),
                None => (vec![path.to_path_buf()], 0),
            },
            None => (vec![path.to_path_buf()], 0),
        };
        self.replace_session(queue, index, false);
    }

    /// Advance playback by one heartbeat
    ///
    /// Retries a failed write, folds elapsed time into the position, saves
    /// every bookmark interval and moves on when the track has ended.
    pub fn on_tick(&mut self, elapsed_ms: u64) {
        let playing = self.session.as_ref().is_some_and(|s| !s.is_paused);
        if !playing {
            self.retry_if_dirty();
            return;
        }

        self.advance(elapsed_ms);
        self.check_played();

        if self.session.as_ref().is_some_and(PlaybackSession::is_finished) {
            self.finish_track();
        } else if self.since_save_ms >= self.settings.bookmark_interval_ms {
            debug!("Periodic bookmark");
            self.flush();
        } else {
            self.retry_if_dirty();
        }
    }

    // ===== Persisted State =====

    /// Clear a podcast's played flag
    pub fn mark_unplayed(&mut self, path: &Path) {
        self.persist([StateDelta::MarkUnplayed {
            path: path.to_path_buf(),
        }]);
    }

    pub fn create_playlist(&mut self, name: &str) {
        self.persist([StateDelta::CreatePlaylist {
            name: name.to_string(),
        }]);
    }

    pub fn add_to_playlist(&mut self, name: &str, path: &Path) {
        self.persist([StateDelta::AppendToPlaylist {
            name: name.to_string(),
            path: path.to_path_buf(),
        }]);
    }

    pub fn remove_from_playlist(&mut self, name: &str, index: usize) {
        self.persist([StateDelta::RemoveFromPlaylist {
            name: name.to_string(),
            index,
        }]);
    }

    pub fn delete_playlist(&mut self, name: &str) {
        self.persist([StateDelta::DeletePlaylist {
            name: name.to_string(),
        }]);
    }

    pub fn playlists(&self) -> Vec<String> {
        self.engine
            .playlists()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Playlist entries that still exist on the card
    pub fn playlist_entries(&self, name: &str) -> Vec<PathBuf> {
        self.engine.playlist_entries(name)
    }

    /// Delete played podcast files; see [`PersistenceEngine::purge_played`]
    ///
    /// The current session's file is spared, otherwise its next flush would
    /// bring back the bookmark and metadata of a deleted file.
    pub fn purge_played(&mut self, enabled: bool) -> Result<Vec<PathBuf>> {
        let active = self.session.as_ref().map(|s| s.file_path.clone());
        let result = self.engine.purge_played(enabled, active.as_deref());
        self.update_unsaved();
        Ok(result?)
    }

    // ===== Queries =====

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Whether the unsaved indicator is raised
    pub fn is_unsaved(&self) -> bool {
        self.unsaved
    }

    pub fn engine(&self) -> &PersistenceEngine {
        &self.engine
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Take the events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<EventKind> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn store(&self) -> Rc<dyn FileStore> {
        self.engine.store()
    }

    /// Flush the outgoing session, then build and install the new one
    fn replace_session(&mut self, queue: Vec<PathBuf>, index: usize, announce: bool) {
        // Outgoing resume point must be durable before the new session exists
        self.flush();

        let session = self.build_session(queue, index);
        let path = session.file_path.clone();
        info!(
            path = ?path,
            kind = ?session.media_kind,
            position = session.position_seconds,
            "Track changed"
        );
        self.install(session);
        self.persist(self.session_deltas());

        if announce {
            self.pending_events.push(EventKind::TrackChanged { path });
        }
    }

    fn build_session(&self, queue: Vec<PathBuf>, index: usize) -> PlaybackSession {
        let file_path = queue[index].clone();
        let media_kind = self.probe.media_kind(&file_path);
        let duration_seconds = self.probe.duration_seconds(&file_path).unwrap_or(0);

        // Podcasts resume where they left off unless already played
        let position_seconds = match media_kind {
            MediaKind::Podcast => self
                .engine
                .podcast(&file_path)
                .filter(|meta| !meta.played)
                .map_or(0, |meta| meta.position_seconds),
            MediaKind::Music => 0,
        };

        let mut session = PlaybackSession {
            media_kind,
            file_path,
            position_seconds: 0,
            duration_seconds,
            queue,
            queue_index: index,
            is_paused: false,
        };
        session.position_seconds = session.clamp_position(i64::from(position_seconds));
        session
    }

    fn install(&mut self, session: PlaybackSession) {
        self.session = Some(session);
        self.position_remainder_ms = 0;
        self.since_save_ms = 0;
    }

    fn restart(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.position_seconds = 0;
        let path = session.file_path.clone();
        self.position_remainder_ms = 0;
        debug!(?path, "Restarting track");
        self.pending_events.push(EventKind::TrackChanged { path });
    }

    fn advance(&mut self, elapsed_ms: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        self.since_save_ms += elapsed_ms;
        self.position_remainder_ms += elapsed_ms;
        let whole_seconds = self.position_remainder_ms / 1000;
        self.position_remainder_ms %= 1000;

        let target = i64::from(session.position_seconds).saturating_add(whole_seconds as i64);
        session.position_seconds = session.clamp_position(target);
    }

    /// Latch `played` the first time a podcast gets near its end
    fn check_played(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if session.media_kind != MediaKind::Podcast
            || !session.is_near_end(self.settings.played_threshold_seconds)
        {
            return;
        }
        let already = self
            .engine
            .podcast(&session.file_path)
            .is_some_and(|meta| meta.played);
        if already {
            return;
        }

        info!(path = ?session.file_path, "Podcast played");
        self.persist(self.session_deltas());
    }

    fn finish_track(&mut self) {
        match self.skip_forward() {
            Ok(()) => debug!("Advanced to next track"),
            Err(_) => {
                info!("End of queue");
                if let Some(session) = self.session.as_mut() {
                    session.is_paused = true;
                }
                self.flush();
                self.pending_events.push(EventKind::PlaybackPaused);
            }
        }
    }

    /// Persist the current session's resume point
    fn flush(&mut self) {
        let deltas = self.session_deltas();
        if !deltas.is_empty() {
            self.persist(deltas);
        }
        self.since_save_ms = 0;
    }

    fn session_deltas(&self) -> Vec<StateDelta> {
        let Some(session) = &self.session else {
            return Vec::new();
        };

        let mut deltas = vec![StateDelta::Bookmark {
            path: session.file_path.clone(),
            position_seconds: session.position_seconds,
        }];
        if session.media_kind == MediaKind::Podcast {
            deltas.push(StateDelta::PodcastProgress {
                path: session.file_path.clone(),
                position_seconds: session.position_seconds,
                finished: session.is_near_end(self.settings.played_threshold_seconds),
            });
        }
        deltas
    }

    /// Write through the engine; failures are kept for retry
    fn persist(&mut self, deltas: impl IntoIterator<Item = StateDelta>) {
        if let Err(e) = self.engine.save_all(deltas) {
            debug!("Save deferred: {}", e);
        }
        self.update_unsaved();
    }

    fn retry_if_dirty(&mut self) {
        if self.engine.is_dirty() {
            if let Err(e) = self.engine.retry() {
                debug!("Retry failed: {}", e);
            }
            self.update_unsaved();
        }
    }

    fn update_unsaved(&mut self) {
        let unsaved = self.engine.consecutive_failures() >= UNSAVED_AFTER_FAILURES;
        if unsaved != self.unsaved {
            self.unsaved = unsaved;
            if unsaved {
                warn!("Playback state could not be saved");
            } else {
                info!("Playback state saved again");
            }
            self.pending_events
                .push(EventKind::PersistenceStatus { unsaved });
        }
    }

    /// First playable queue index from `start` in `step` direction
    fn find_playable(&self, queue: &[PathBuf], start: Option<usize>, step: Step) -> Option<usize> {
        let store = self.store();
        let mut index = start?;
        loop {
            let path = queue.get(index)?;
            if store.exists(path) {
                return Some(index);
            }
            warn!("{}", PocketError::InvalidQueueReference(path.clone()));
            index = match step {
                Step::Forward => index.checked_add(1)?,
                Step::Backward => index.checked_sub(1)?,
            };
        }
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("session", &self.session)
            .field("unsaved", &self.unsaved)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
