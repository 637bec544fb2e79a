/// Engine configuration, loadable from RON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::channel::DEFAULT_CHANNEL_NAME;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Settings shared by every tab of one world.
///
/// All fields are optional in the RON form; anything omitted takes the
/// default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmConfig {
    /// Broadcast topic the tabs meet on.
    pub channel_name: String,
    /// Overrides the world's own start room.
    pub start_room: Option<String>,
    pub starting_hp: u32,
    /// Fixed RNG seed for narration; random when absent.
    pub seed: Option<u64>,
    /// World RON file; the embedded world when absent.
    pub world_path: Option<PathBuf>,
    /// Phrase book RON file; the embedded book when absent.
    pub phrases_path: Option<PathBuf>,
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            start_room: None,
            starting_hp: 100,
            seed: None,
            world_path: None,
            phrases_path: None,
        }
    }
}

impl RealmConfig {
    pub fn load_from_ron(path: &Path) -> Result<RealmConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<RealmConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(RealmConfig::parse_ron("()").unwrap(), RealmConfig::default());
    }

    #[test]
    fn partial_config_overrides() {
        let cfg = RealmConfig::parse_ron(r#"(channel_name: "test-realm", seed: Some(7))"#).unwrap();
        assert_eq!(cfg.channel_name, "test-realm");
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.starting_hp, 100);
        assert!(cfg.world_path.is_none());
    }

    #[test]
    fn bad_config_is_an_error() {
        assert!(matches!(
            RealmConfig::parse_ron("(starting_hp: \"lots\")"),
            Err(ConfigError::Ron(_))
        ));
    }
}
