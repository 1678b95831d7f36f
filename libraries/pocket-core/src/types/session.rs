//! The active playback session

use super::Bookmark;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What kind of media a file is
///
/// Only podcasts get per-file resume positions and a played flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Music,
    Podcast,
}

/// What is playing, where, and in which queue
///
/// Owned by the playback tracker; everything else only sees clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSession {
    pub media_kind: MediaKind,

    /// File currently loaded
    pub file_path: PathBuf,

    /// Resume position within `file_path`
    pub position_seconds: u32,

    /// Track length, 0 when the probe could not tell
    pub duration_seconds: u32,

    /// Ordered play queue (contains `file_path` at `queue_index`)
    pub queue: Vec<PathBuf>,

    /// Index of `file_path` inside `queue`
    pub queue_index: usize,

    pub is_paused: bool,
}

impl PlaybackSession {
    /// Seconds left before the end of the track, if the duration is known
    pub fn remaining_seconds(&self) -> Option<u32> {
        (self.duration_seconds > 0).then(|| self.duration_seconds.saturating_sub(self.position_seconds))
    }

    /// Whether the remaining runtime is below `threshold_seconds`
    ///
    /// Always false when the duration is unknown.
    pub fn is_near_end(&self, threshold_seconds: u32) -> bool {
        self.remaining_seconds()
            .is_some_and(|remaining| remaining < threshold_seconds)
    }

    /// Whether playback has run off the end of the track
    pub fn is_finished(&self) -> bool {
        self.duration_seconds > 0 && self.position_seconds >= self.duration_seconds
    }

    /// Clamp a position into `[0, duration]` (unbounded when unknown)
    pub fn clamp_position(&self, position_seconds: i64) -> u32 {
        let upper = if self.duration_seconds > 0 {
            i64::from(self.duration_seconds)
        } else {
            i64::from(u32::MAX)
        };
        position_seconds.clamp(0, upper) as u32
    }

    /// The persisted resume point for this session
    pub fn bookmark(&self) -> Bookmark {
        Bookmark {
            path: self.file_path.clone(),
            position_seconds: self.position_seconds,
        }
    }
}
