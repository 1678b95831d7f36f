//! Player configuration
//!
//! Loaded once at boot with the `config` crate. Every key is read on its
//! own: a missing key silently takes its default, a present-but-invalid key
//! logs a `ConfigInvalid` warning and takes its default. A missing or
//! malformed file yields the full default config. Startup never fails here.

use crate::error::PocketError;
use ::config::{Config, ConfigError, File, FileFormat};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;
use tracing::{info, warn};

/// Which encoder rotation counts as "increase"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncoderDirection {
    #[default]
    ClockwiseIncrease,
    ClockwiseDecrease,
}

/// What encoder motion does while the screen is off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenOffRotary {
    /// Emit `VolumeAdjust`
    #[default]
    Volume,
    /// Drop the motion
    Suppress,
}

/// Which input wakes a sleeping screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WakeTrigger {
    /// Any raw signal wakes the screen and is consumed
    #[default]
    AnySignal,
    /// Buttons stay media controls; only a long press wakes
    LongPress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSettings {
    pub double_tap_threshold_ms: u64,
    pub long_press_threshold_ms: u64,
    pub rotary_encoder_direction: EncoderDirection,
    pub screen_off_rotary: ScreenOffRotary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSettings {
    pub timeout_seconds: u64,
    pub wake_on: WakeTrigger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Allow the explicit "delete played podcasts" operation
    pub delete_played: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// A podcast with less than this left is marked played
    pub played_threshold_seconds: u32,
    /// Active playback between periodic bookmark saves
    pub bookmark_interval_seconds: u32,
    /// Skip-backward restarts the track after this much playback
    pub restart_threshold_seconds: u32,
    /// Period of the `PeriodicTick` heartbeat
    pub tick_interval_ms: u64,
}

/// Complete player configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub inputs: InputSettings,
    pub screen: ScreenSettings,
    pub storage: StorageSettings,
    pub playback: PlaybackSettings,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            inputs: InputSettings {
                double_tap_threshold_ms: 300,
                long_press_threshold_ms: 800,
                rotary_encoder_direction: EncoderDirection::ClockwiseIncrease,
                screen_off_rotary: ScreenOffRotary::Volume,
            },
            screen: ScreenSettings {
                timeout_seconds: 30,
                wake_on: WakeTrigger::AnySignal,
            },
            storage: StorageSettings {
                delete_played: false,
            },
            playback: PlaybackSettings {
                played_threshold_seconds: 5,
                bookmark_interval_seconds: 10,
                restart_threshold_seconds: 3,
                tick_interval_ms: 1000,
            },
        }
    }
}

impl PlayerConfig {
    /// Load configuration from a file; the format follows the extension
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No config at {:?}, using defaults", path);
            return Self::default();
        }

        match Config::builder().add_source(File::from(path)).build() {
            Ok(source) => {
                info!("Loaded config from {:?}", path);
                Self::from_source(&source)
            }
            Err(e) => {
                warn!("Config file {:?} unreadable ({}), using defaults", path, e);
                Self::default()
            }
        }
    }

    /// Parse configuration from an in-memory document
    pub fn parse(contents: &str, format: FileFormat) -> Self {
        match Config::builder()
            .add_source(File::from_str(contents, format))
            .build()
        {
            Ok(source) => Self::from_source(&source),
            Err(e) => {
                warn!("Config document malformed ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Read every key independently, substituting defaults
    pub fn from_source(source: &Config) -> Self {
        let d = Self::default();
        Self {
            inputs: InputSettings {
                double_tap_threshold_ms: positive(
                    source,
                    "inputs.double_tap_threshold_ms",
                    d.inputs.double_tap_threshold_ms,
                ),
                long_press_threshold_ms: positive(
                    source,
                    "inputs.long_press_threshold_ms",
                    d.inputs.long_press_threshold_ms,
                ),
                rotary_encoder_direction: setting(
                    source,
                    "inputs.rotary_encoder_direction",
                    d.inputs.rotary_encoder_direction,
                ),
                screen_off_rotary: setting(
                    source,
                    "inputs.screen_off_rotary",
                    d.inputs.screen_off_rotary,
                ),
            },
            screen: ScreenSettings {
                timeout_seconds: positive(source, "screen.timeout_seconds", d.screen.timeout_seconds),
                wake_on: setting(source, "screen.wake_on", d.screen.wake_on),
            },
            storage: StorageSettings {
                delete_played: setting(source, "storage.delete_played", d.storage.delete_played),
            },
            playback: PlaybackSettings {
                played_threshold_seconds: setting(
                    source,
                    "playback.played_threshold_seconds",
                    d.playback.played_threshold_seconds,
                ),
                bookmark_interval_seconds: positive(
                    source,
                    "playback.bookmark_interval_seconds",
                    d.playback.bookmark_interval_seconds,
                ),
                restart_threshold_seconds: setting(
                    source,
                    "playback.restart_threshold_seconds",
                    d.playback.restart_threshold_seconds,
                ),
                tick_interval_ms: positive(
                    source,
                    "playback.tick_interval_ms",
                    d.playback.tick_interval_ms,
                ),
            },
        }
    }
}

fn setting<T>(source: &Config, key: &str, default: T) -> T
where
    T: DeserializeOwned + Debug,
{
    match source.get::<T>(key) {
        Ok(value) => value,
        Err(ConfigError::NotFound(_)) => default,
        Err(e) => {
            let err = PocketError::config_invalid(key, e.to_string());
            warn!("{}, using default {:?}", err, default);
            default
        }
    }
}

/// Like `setting`, but zero is rejected too
fn positive<T>(source: &Config, key: &str, default: T) -> T
where
    T: DeserializeOwned + Debug + Default + PartialEq + Copy,
{
    let value = setting(source, key, default);
    if value == T::default() {
        let err = PocketError::config_invalid(key, "must be greater than zero");
        warn!("{}, using default {:?}", err, default);
        return default;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = PlayerConfig::parse("", FileFormat::Yaml);
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn reads_known_keys() {
        let config = PlayerConfig::parse(
            r#"
inputs:
  double_tap_threshold_ms: 250
  long_press_threshold_ms: 1000
  rotary_encoder_direction: clockwise-decrease
screen:
  timeout_seconds: 12
  wake_on: long-press
storage:
  delete_played: true
"#,
            FileFormat::Yaml,
        );

        assert_eq!(config.inputs.double_tap_threshold_ms, 250);
        assert_eq!(config.inputs.long_press_threshold_ms, 1000);
        assert_eq!(
            config.inputs.rotary_encoder_direction,
            EncoderDirection::ClockwiseDecrease
        );
        assert_eq!(config.screen.timeout_seconds, 12);
        assert_eq!(config.screen.wake_on, WakeTrigger::LongPress);
        assert!(config.storage.delete_played);
        // Untouched keys keep defaults
        assert_eq!(config.playback.played_threshold_seconds, 5);
    }

    #[test]
    fn invalid_keys_fall_back_individually() {
        let config = PlayerConfig::parse(
            r#"
inputs:
  double_tap_threshold_ms: "soon"
  long_press_threshold_ms: 0
  rotary_encoder_direction: sideways
screen:
  timeout_seconds: 45
"#,
            FileFormat::Yaml,
        );

        let defaults = PlayerConfig::default();
        assert_eq!(config.inputs.double_tap_threshold_ms, 300);
        assert_eq!(config.inputs.long_press_threshold_ms, 800);
        assert_eq!(
            config.inputs.rotary_encoder_direction,
            defaults.inputs.rotary_encoder_direction
        );
        // The valid sibling key still applies
        assert_eq!(config.screen.timeout_seconds, 45);
    }

    #[test]
    fn malformed_document_yields_defaults() {
        let config = PlayerConfig::parse("inputs: [unclosed", FileFormat::Yaml);
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlayerConfig::load(&dir.path().join("player.yaml"));
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn load_reads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "screen:\n  timeout_seconds: 60").unwrap();

        let config = PlayerConfig::load(&path);
        assert_eq!(config.screen.timeout_seconds, 60);
    }
}
