//! # World Configuration
//!
//! Tuning knobs for a world, loaded once at startup from TOML:
//!
//! ```toml
//! entity_capacity_hint = 100000
//! query_cache = true
//! max_component_types = 64
//! ```
//!
//! Missing keys fall back to [`WorldConfig::default`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Configuration for one world instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Number of entities to reserve directory space for.
    pub entity_capacity_hint: usize,
    /// Cache archetype scans in component stores.
    pub query_cache: bool,
    /// Upper bound on registered component types, entity pseudo-type included.
    pub max_component_types: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity_hint: 1024,
            query_cache: true,
            max_component_types: 256,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `max_component_types` is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_component_types == 0 {
            return Err(ConfigError::Invalid(
                "max_component_types must leave room for the entity pseudo-type".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_keys() {
        let config = WorldConfig::from_toml_str("query_cache = false").unwrap();
        assert!(!config.query_cache);
        assert_eq!(config.entity_capacity_hint, 1024);
        assert_eq!(config.max_component_types, 256);
    }

    #[test]
    fn test_full_config() {
        let config = WorldConfig::from_toml_str(
            "entity_capacity_hint = 100000\nquery_cache = true\nmax_component_types = 64\n",
        )
        .unwrap();
        assert_eq!(
            config,
            WorldConfig {
                entity_capacity_hint: 100_000,
                query_cache: true,
                max_component_types: 64,
            }
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = WorldConfig::from_toml_str("bucket_size = 32").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_component_types_rejected() {
        let err = WorldConfig::from_toml_str("max_component_types = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = WorldConfig::load("/nonexistent/cairn/world.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("cairn_world_{}.toml", std::process::id()));
        fs::write(&path, "entity_capacity_hint = 64\n").unwrap();

        let config = WorldConfig::load(&path).unwrap();
        assert_eq!(config.entity_capacity_hint, 64);

        fs::remove_file(&path).unwrap();
    }
}
