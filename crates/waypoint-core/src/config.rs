//! Navigator configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use waypoint_render::DEFAULT_TRANSITION;

use crate::error::CoreError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Oldest screens are evicted once the stack reaches this size
    pub max_stack_size: Option<usize>,
    /// Transition run on every screen change
    pub transition_key: String,
    /// Suffix stripped from type names to derive template names. When unset
    /// the resolver keeps its own suffix.
    pub view_suffix: Option<String>,
    /// Registered type shown when the URL names no bookmarkable screen
    pub default_screen: Option<String>,
    /// Registered type shown for history entries whose screen is gone
    pub expired_screen: Option<String>,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_stack_size == Some(0) {
            return Err(CoreError::Config(
                "max_stack_size must be at least 1".to_string(),
            ));
        }

        if self.transition_key.is_empty() {
            return Err(CoreError::Config("transition_key is empty".to_string()));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_stack_size: None,
            transition_key: DEFAULT_TRANSITION.to_string(),
            view_suffix: None,
            default_screen: None,
            expired_screen: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{"max_stack_size": 20, "default_screen": "HomeModel"}"#)
            .unwrap();

        assert_eq!(config.max_stack_size, Some(20));
        assert_eq!(config.default_screen.as_deref(), Some("HomeModel"));
        assert_eq!(config.transition_key, "default");
        assert_eq!(config.view_suffix, None);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            Config::from_json(r#"{"max_stack_size": 0}"#),
            Err(CoreError::Config(_))
        ));
        assert!(matches!(
            Config::from_json("{not json"),
            Err(CoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_load() {
        let dir = std::env::temp_dir();

        let missing = dir.join(format!("waypoint-{}.json", uuid::Uuid::new_v4()));
        assert_eq!(Config::load(&missing).unwrap(), Config::default());

        let path = dir.join(format!("waypoint-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"transition_key": "slide"}"#).unwrap();
        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.transition_key, "slide");
    }
}
