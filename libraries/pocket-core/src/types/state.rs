//! Persisted playback state
//!
//! The on-disk root written by the persistence engine. Callers never
//! rewrite it wholesale; they describe changes as [`StateDelta`]s which
//! are merged into the in-memory root before it is serialized.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resume point for the last played file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub path: PathBuf,
    pub position_seconds: u32,
}

/// Per-podcast progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub file_path: PathBuf,
    pub position_seconds: u32,
    /// Set near the end of the episode; only `MarkUnplayed` clears it
    #[serde(default)]
    pub played: bool,
}

impl TrackMetadata {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            position_seconds: 0,
            played: false,
        }
    }
}

/// On-disk root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub current_track: Option<Bookmark>,

    /// Keyed by file path, stored on disk as a list
    #[serde(default, with = "podcast_list")]
    pub podcasts: BTreeMap<PathBuf, TrackMetadata>,

    /// Playlist name -> ordered file references (duplicates allowed)
    #[serde(default)]
    pub playlists: BTreeMap<String, Vec<PathBuf>>,
}

/// A partial update to [`PersistedState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateDelta {
    /// Record the resume point of the current file
    Bookmark { path: PathBuf, position_seconds: u32 },

    /// Forget the resume point
    ClearBookmark,

    /// Record podcast progress; `finished` latches the played flag
    PodcastProgress {
        path: PathBuf,
        position_seconds: u32,
        finished: bool,
    },

    MarkPlayed { path: PathBuf },

    /// The only way `played` goes back to false
    MarkUnplayed { path: PathBuf },

    /// Drop a podcast's metadata entirely
    ForgetPodcast { path: PathBuf },

    CreatePlaylist { name: String },

    /// Append a reference, creating the playlist if needed
    AppendToPlaylist { name: String, path: PathBuf },

    RemoveFromPlaylist { name: String, index: usize },

    DeletePlaylist { name: String },
}

impl PersistedState {
    /// Look up a podcast's progress
    pub fn podcast(&self, path: &Path) -> Option<&TrackMetadata> {
        self.podcasts.get(path)
    }

    /// Merge a delta, returning whether anything changed
    pub fn apply(&mut self, delta: StateDelta) -> bool {
        match delta {
            StateDelta::Bookmark {
                path,
                position_seconds,
            } => {
                let bookmark = Bookmark {
                    path,
                    position_seconds,
                };
                if self.current_track.as_ref() == Some(&bookmark) {
                    return false;
                }
                self.current_track = Some(bookmark);
                true
            }
            StateDelta::ClearBookmark => self.current_track.take().is_some(),
            StateDelta::PodcastProgress {
                path,
                position_seconds,
                finished,
            } => {
                let entry = self
                    .podcasts
                    .entry(path.clone())
                    .or_insert_with(|| TrackMetadata::new(path));
                let before = (entry.position_seconds, entry.played);
                entry.position_seconds = position_seconds;
                entry.played |= finished;
                before != (entry.position_seconds, entry.played)
            }
            StateDelta::MarkPlayed { path } => {
                let entry = self
                    .podcasts
                    .entry(path.clone())
                    .or_insert_with(|| TrackMetadata::new(path));
                !std::mem::replace(&mut entry.played, true)
            }
            StateDelta::MarkUnplayed { path } => self
                .podcasts
                .get_mut(&path)
                .is_some_and(|entry| std::mem::replace(&mut entry.played, false)),
            StateDelta::ForgetPodcast { path } => self.podcasts.remove(&path).is_some(),
            StateDelta::CreatePlaylist { name } => {
                if self.playlists.contains_key(&name) {
                    return false;
                }
                self.playlists.insert(name, Vec::new());
                true
            }
            StateDelta::AppendToPlaylist { name, path } => {
                self.playlists.entry(name).or_default().push(path);
                true
            }
            StateDelta::RemoveFromPlaylist { name, index } => {
                match self.playlists.get_mut(&name) {
                    Some(entries) if index < entries.len() => {
                        entries.remove(index);
                        true
                    }
                    _ => false,
                }
            }
            StateDelta::DeletePlaylist { name } => self.playlists.remove(&name).is_some(),
        }
    }
}

mod podcast_list {
    use super::TrackMetadata;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    pub fn serialize<S: Serializer>(
        podcasts: &BTreeMap<PathBuf, TrackMetadata>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(podcasts.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<PathBuf, TrackMetadata>, D::Error> {
        let list = Vec::<TrackMetadata>::deserialize(deserializer)?;
        Ok(list
            .into_iter()
            .map(|entry| (entry.file_path.clone(), entry))
            .collect())
    }
}
