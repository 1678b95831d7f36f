//! Domain types shared across the runtime

mod event;
mod input;
mod screen;
mod session;
mod state;

pub use event::{Event, EventFilter, EventKind, RotaryDirection};
pub use input::InputMode;
pub use screen::{MenuAction, NowPlaying, ScreenState};
pub use session::{MediaKind, PlaybackSession};
pub use state::{Bookmark, PersistedState, StateDelta, TrackMetadata};
