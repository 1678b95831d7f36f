//! Input event to action mapping
//!
//! | Event            | Screen off    | Screen on      |
//! |------------------|---------------|----------------|
//! | ButtonPress      | toggle pause  | toggle pause   |
//! | ButtonDoubleTap  | skip forward  | menu select    |
//! | ButtonLongPress  | skip backward | menu back      |
//! | RotaryTurn       | -             | menu scroll    |
//! | VolumeAdjust     | volume        | volume         |

use pocket_core::{Event, EventKind, InputMode, MenuAction};

/// What the transport reactor does for an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    TogglePause,
    SkipForward,
    SkipBackward,
    AdjustVolume(i32),
}

pub fn transport_action(event: &Event) -> Option<TransportAction> {
    match (event.mode, &event.kind) {
        (_, EventKind::ButtonPress) => Some(TransportAction::TogglePause),
        (InputMode::ScreenOff, EventKind::ButtonDoubleTap) => Some(TransportAction::SkipForward),
        (InputMode::ScreenOff, EventKind::ButtonLongPress) => Some(TransportAction::SkipBackward),
        (_, EventKind::VolumeAdjust { delta }) => Some(TransportAction::AdjustVolume(*delta)),
        _ => None,
    }
}

pub fn menu_action(event: &Event) -> Option<MenuAction> {
    if !event.mode.is_screen_on() {
        return None;
    }
    match &event.kind {
        EventKind::RotaryTurn { delta, .. } => Some(MenuAction::Scroll(*delta)),
        EventKind::ButtonDoubleTap => Some(MenuAction::Select),
        EventKind::ButtonLongPress => Some(MenuAction::Back),
        _ => None,
    }
}
