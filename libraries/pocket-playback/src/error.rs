//! Error types for playback session tracking

use pocket_core::PocketError;
use pocket_storage::StorageError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No session is active
    #[error("No track loaded")]
    NoSession,

    /// Queue or playlist has no entries
    #[error("Queue is empty")]
    EmptyQueue,

    /// No playable entry left in the requested direction
    #[error("End of queue")]
    EndOfQueue,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Storage operation requested by the caller failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

impl From<PlaybackError> for PocketError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::Storage(e) => e.into(),
            other => PocketError::playback(other.to_string()),
        }
    }
}
