//! Generation settings loaded from TOML.
//!
//! ```toml
//! output_name = "people"
//! word_size = 8
//! text_method = "String"
//! handle_start = -1
//! reject_ambiguous_constructors = true
//! ```
//!
//! Every key is optional. Unknown keys are rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crossbind_core::is_exported;
use crossbind_registry::BuildOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("word_size must be 4 or 8, got {0}")]
    InvalidWordSize(u8),

    #[error("handle_start must be negative, got {0}")]
    InvalidHandleStart(i64),

    #[error("text_method must be an exported method name, got '{0}'")]
    InvalidTextMethod(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindConfig {
    /// Name of the generated module; the package name when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    /// Byte width of the platform-sized integer family on the wire.
    pub word_size: u8,
    /// Method recognized as a type's textual representation.
    pub text_method: String,
    /// First handle id issued by the process-wide bridge.
    pub handle_start: i64,
    pub reject_ambiguous_constructors: bool,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            output_name: None,
            word_size: 8,
            text_method: "String".to_string(),
            handle_start: -1,
            reject_ambiguous_constructors: true,
        }
    }
}

impl BindConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.word_size, 4 | 8) {
            return Err(ConfigError::InvalidWordSize(self.word_size));
        }
        if self.handle_start >= 0 {
            return Err(ConfigError::InvalidHandleStart(self.handle_start));
        }
        if !is_exported(&self.text_method) {
            return Err(ConfigError::InvalidTextMethod(self.text_method.clone()));
        }
        Ok(())
    }

    /// Generated module name for a package.
    pub fn output_name_for(&self, package: &str) -> String {
        self.output_name.clone().unwrap_or_else(|| package.to_string())
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            word_size: self.word_size,
            text_method: self.text_method.clone(),
            reject_ambiguous_constructors: self.reject_ambiguous_constructors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = BindConfig::from_toml_str("").unwrap();
        assert_eq!(config, BindConfig::default());
        assert_eq!(config.output_name_for("main"), "main");
        assert_eq!(config.build_options(), BuildOptions::default());
    }

    #[test]
    fn parses_all_keys() {
        let config = BindConfig::from_toml_str(
            r#"
            output_name = "people"
            word_size = 4
            text_method = "Describe"
            handle_start = -24
            reject_ambiguous_constructors = false
            "#,
        )
        .unwrap();
        assert_eq!(config.output_name_for("main"), "people");
        assert_eq!(config.word_size, 4);
        assert_eq!(config.handle_start, -24);
        assert!(!config.build_options().reject_ambiguous_constructors);
        assert_eq!(config.build_options().text_method, "Describe");
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            BindConfig::from_toml_str("verbose = true"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            BindConfig::from_toml_str("word_size = 2"),
            Err(ConfigError::InvalidWordSize(2))
        ));
        assert!(matches!(
            BindConfig::from_toml_str("handle_start = 0"),
            Err(ConfigError::InvalidHandleStart(0))
        ));
        assert!(matches!(
            BindConfig::from_toml_str("text_method = \"string\""),
            Err(ConfigError::InvalidTextMethod(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = BindConfig::load("/nonexistent/crossbind.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/crossbind.toml"));
    }
}
