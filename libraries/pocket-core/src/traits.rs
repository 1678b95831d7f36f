/// Collaborator traits
///
/// The runtime core never touches hardware directly. Storage, decoding,
/// audio output and rendering are provided by the platform through these
/// synchronous interfaces; tests substitute fakes.
use crate::error::Result;
use crate::types::{MediaKind, MenuAction, ScreenState};
use std::path::Path;

/// Byte-level file access on the SD card
///
/// Methods take `&self` so one store can be shared between the persistence
/// engine and the playback tracker's reference checks.
pub trait FileStore {
    /// Read a whole file
    ///
    /// # Errors
    /// Returns `PocketError::Io` with `NotFound` when the file is missing
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Create or truncate a file and write `bytes`, durable on return
    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Atomically replace `to` with `from`
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Delete a file
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Whether a file exists
    fn exists(&self, path: &Path) -> bool;
}

/// Cheap per-file facts supplied by the decoder/metadata layer
pub trait TrackProbe {
    /// Track length in whole seconds, `None` when unknown
    fn duration_seconds(&self, path: &Path) -> Option<u32>;

    /// Whether the file is music or a podcast episode
    fn media_kind(&self, path: &Path) -> MediaKind;
}

/// Display and menu-tree collaborator
pub trait Renderer {
    /// Draw a screen
    fn render(&mut self, state: &ScreenState) -> Result<()>;

    /// Forward a navigation request to the menu tree
    fn navigate(&mut self, action: MenuAction) -> Result<()>;
}

/// Audio decode/output collaborator
pub trait AudioTransport {
    /// Load `path` and start playing from `offset_seconds`
    fn play(&mut self, path: &Path, offset_seconds: u32) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn resume(&mut self) -> Result<()>;

    /// Step the output volume by `delta` notches
    fn adjust_volume(&mut self, delta: i32) -> Result<()>;
}
