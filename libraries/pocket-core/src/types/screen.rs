//! What the display reactor hands to the renderer

use super::{MediaKind, PlaybackSession};
use std::path::PathBuf;

/// Screen contents requested from the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenState {
    /// Display asleep
    Off,
    /// Awake with nothing loaded
    Idle { unsaved: bool },
    /// Awake showing the current session
    NowPlaying(NowPlaying),
}

/// Snapshot of the session for the now-playing screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub path: PathBuf,
    pub media_kind: MediaKind,
    pub position_seconds: u32,
    pub duration_seconds: u32,
    pub is_paused: bool,
    /// Persistence is failing; show the "unsaved" indicator
    pub unsaved: bool,
}

impl ScreenState {
    /// Build the awake screen from an optional session snapshot
    pub fn awake(session: Option<&PlaybackSession>, unsaved: bool) -> Self {
        match session {
            Some(session) => Self::NowPlaying(NowPlaying {
                path: session.file_path.clone(),
                media_kind: session.media_kind,
                position_seconds: session.position_seconds,
                duration_seconds: session.duration_seconds,
                is_paused: session.is_paused,
                unsaved,
            }),
            None => Self::Idle { unsaved },
        }
    }
}

/// Menu navigation requests forwarded to the menu collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Move the cursor by `delta` entries
    Scroll(i32),
    Select,
    Back,
}
