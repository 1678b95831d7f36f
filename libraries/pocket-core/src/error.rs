/// Core error types for Pocket Player
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `PocketError`
pub type Result<T> = std::result::Result<T, PocketError>;

/// Core error type for Pocket Player
///
/// None of these are fatal to a running session: each one has a recovery
/// path (defaults, retry, skip) and is only logged or surfaced as an
/// indicator.
#[derive(Error, Debug)]
pub enum PocketError {
    /// A config key was present but unusable; the default is substituted
    #[error("Invalid config value for `{key}`: {reason}")]
    ConfigInvalid { key: String, reason: String },

    /// The playback state file could not be located or parsed
    #[error("Storage read failed: {0}")]
    StorageReadFailed(String),

    /// The playback state file could not be written
    #[error("Storage write failed: {0}")]
    StorageWriteFailed(String),

    /// An event subscriber returned an error or panicked
    #[error("Subscriber `{subscriber}` failed: {reason}")]
    SubscriberFailure { subscriber: String, reason: String },

    /// A queue or playlist entry points at a file that no longer exists
    #[error("Missing file referenced by queue or playlist: {}", .0.display())]
    InvalidQueueReference(PathBuf),

    /// A transport request could not be carried out (no session, end of queue)
    #[error("Playback error: {0}")]
    Playback(String),

    /// A renderer, transport or probe call failed
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PocketError {
    /// Create a config error
    pub fn config_invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a subscriber failure
    pub fn subscriber(subscriber: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SubscriberFailure {
            subscriber: subscriber.into(),
            reason: reason.into(),
        }
    }

    /// Create a playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Create a collaborator error
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }

    /// Whether this is an I/O "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(err) if err.kind() == std::io::ErrorKind::NotFound)
    }
}
