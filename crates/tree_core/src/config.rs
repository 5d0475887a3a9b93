//! Engine configuration
//!
//! ```toml
//! [limits]
//! max_depth = 32
//! max_nodes = 65535
//!
//! [codec]
//! include_names = true
//! ```
//!
//! Every section and key is optional; missing values take their defaults.

use crate::codec::CodecConfig;
use crate::errors::{Result, TreeError};
use crate::validation::{ValidationLimits, HARD_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Limits and codec settings shared by the builder, decoders and tools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: ValidationLimits,
    pub codec: CodecConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| TreeError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| {
            TreeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;

        info!(
            max_depth = config.limits.max_depth,
            max_nodes = config.limits.max_nodes,
            include_names = config.codec.include_names,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| TreeError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_toml_string()?)?;
        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Reject limits the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        if limits.max_depth == 0 || limits.max_depth > HARD_MAX_DEPTH {
            return Err(TreeError::Config(format!(
                "limits.max_depth must be in 1..={HARD_MAX_DEPTH}, got {}",
                limits.max_depth
            )));
        }
        if limits.max_nodes == 0 || limits.max_nodes > u32::MAX as usize {
            return Err(TreeError::Config(format!(
                "limits.max_nodes must be in 1..={}, got {}",
                u32::MAX,
                limits.max_nodes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES};
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.limits.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.limits.max_nodes, DEFAULT_MAX_NODES);
        assert!(config.codec.include_names);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document() {
        let config = EngineConfig::from_toml_str("[limits]\nmax_depth = 16\n").unwrap();
        assert_eq!(config.limits.max_depth, 16);
        assert_eq!(config.limits.max_nodes, DEFAULT_MAX_NODES);
        assert!(config.codec.include_names);

        let config = EngineConfig::from_toml_str("[codec]\ninclude_names = false\n").unwrap();
        assert!(!config.codec.include_names);
        assert_eq!(config.limits.max_depth, DEFAULT_MAX_DEPTH);

        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_rejects_bad_limits() {
        for doc in [
            "[limits]\nmax_depth = 0\n",
            "[limits]\nmax_depth = 256\n",
            "[limits]\nmax_nodes = 0\n",
        ] {
            assert!(matches!(
                EngineConfig::from_toml_str(doc),
                Err(TreeError::Config(_))
            ));
        }
        assert!(EngineConfig::from_toml_str("[limits]\nmax_depth = 255\n").is_ok());
        assert!(matches!(
            EngineConfig::from_toml_str("[limits\n"),
            Err(TreeError::Config(_))
        ));
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("engine.toml");

        let mut config = EngineConfig::default();
        config.limits.max_depth = 20;
        config.codec.include_names = false;
        config.save_to_file(&config_path).unwrap();

        let loaded = EngineConfig::load_from_file(&config_path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = tempdir().unwrap();
        assert!(matches!(
            EngineConfig::load_from_file(temp_dir.path().join("absent.toml")),
            Err(TreeError::Config(_))
        ));
    }
}
