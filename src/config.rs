//! Configuration management for schematic
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schematic.toml)
//! - Environment variables (SCHEMATIC__*)
//!
//! ## Example config file (schematic.toml):
//! ```toml
//! [compiler]
//! cache = true
//! empty_schema = "reject"
//!
//! [logging]
//! filter = "schematic=debug"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchematicConfig {
    /// Schema compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Logging settings for the command-line tools
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Schema compiler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Reuse compiled schemas for the same raw schema object
    #[serde(default = "default_true")]
    pub cache: bool,

    /// What to do with a schema that declares no properties
    #[serde(default)]
    pub empty_schema: EmptySchemaPolicy,
}

/// Handling of schemas without properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmptySchemaPolicy {
    /// Fail compilation
    #[default]
    Reject,
    /// Compile to a disabled schema that accepts nothing
    Disable,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber` filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_true() -> bool {
    true
}

fn default_filter() -> String {
    "warn".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            cache: true,
            empty_schema: EmptySchemaPolicy::Reject,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl SchematicConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["schematic.toml", ".schematic.toml", "config/schematic.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "schematic", "schematic") {
            let xdg_config = config_dir.config_dir().join("schematic.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMATIC__COMPILER__EMPTY_SCHEMA=disable
        builder = builder.add_source(
            Environment::with_prefix("SCHEMATIC")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchematicConfig::default();
        assert!(config.compiler.cache);
        assert_eq!(config.compiler.empty_schema, EmptySchemaPolicy::Reject);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_serialize_config() {
        let config = SchematicConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[compiler]"));
        assert!(toml_str.contains("[logging]"));
        assert!(toml_str.contains("empty_schema = \"reject\""));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SchematicConfig = toml::from_str("[compiler]\nempty_schema = \"disable\"\n").unwrap();
        assert_eq!(config.compiler.empty_schema, EmptySchemaPolicy::Disable);
        assert!(config.compiler.cache);
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schematic.toml");
        let path = path.to_str().unwrap();

        let mut config = SchematicConfig::default();
        config.compiler.cache = false;
        config.compiler.empty_schema = EmptySchemaPolicy::Disable;
        config.save(path).unwrap();

        let loaded = SchematicConfig::load_from(Some(path)).unwrap();
        assert!(!loaded.compiler.cache);
        assert_eq!(loaded.compiler.empty_schema, EmptySchemaPolicy::Disable);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(SchematicConfig::load_from(path.to_str()).is_err());
    }
}
