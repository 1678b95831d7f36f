use serde::{Deserialize, Serialize};

/// Process-wide input mode
///
/// Decides how raw button and rotary signals are reinterpreted: menu
/// navigation while the screen is on, media control while it is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputMode {
    /// Display asleep; inputs act as media controls
    #[default]
    ScreenOff,
    /// Display awake; inputs navigate the menu
    ScreenOn,
}

impl InputMode {
    pub fn is_screen_on(self) -> bool {
        self == Self::ScreenOn
    }
}
