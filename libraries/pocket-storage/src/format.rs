//! Byte formats for the state file

use crate::error::Result;
use pocket_core::PersistedState;
use std::path::Path;

/// Serialization used for the state file
///
/// YAML is what the device writes; JSON is accepted for host tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFormat {
    #[default]
    Yaml,
    Json,
}

impl StateFormat {
    /// Pick a format from the file extension, defaulting to YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    pub fn encode(self, state: &PersistedState) -> Result<Vec<u8>> {
        let bytes = match self {
            Self::Yaml => serde_yaml::to_string(state)?.into_bytes(),
            Self::Json => serde_json::to_vec_pretty(state)?,
        };
        Ok(bytes)
    }

    /// Parse a state file; a blank file is an empty state
    pub fn decode(self, bytes: &[u8]) -> Result<PersistedState> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(PersistedState::default());
        }

        let state = match self {
            Self::Yaml => serde_yaml::from_slice(bytes)?,
            Self::Json => serde_json::from_slice(bytes)?,
        };
        Ok(state)
    }
}
