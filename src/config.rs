//! Formatter configuration
//!
//! A [`FormatterConfig`] holds the placeholder prefix, the delimiter pair and
//! the user function registry. The textual settings can be loaded from TOML:
//!
//! ```toml
//! [formatter]
//! placeholder = "arg"
//! left-delimiter = "<<"
//! right-delimiter = ">>"
//! ```
//!
//! Keys that are absent keep their default value.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::functions::Functions;

/// Default placeholder prefix
pub const DEFAULT_PLACEHOLDER: &str = "p";

/// Default left delimiter
pub const DEFAULT_LEFT_DELIMITER: &str = "{";

/// Default right delimiter
pub const DEFAULT_RIGHT_DELIMITER: &str = "}";

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings owned by one [`Formatter`](crate::Formatter)
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Name of the automatic placeholder and prefix of positional ones
    pub placeholder: String,
    pub left_delimiter: String,
    pub right_delimiter: String,
    /// User functions; never read from or written to a file
    pub functions: Functions,
}

/// TOML structure for deserializing configs
#[derive(Deserialize)]
struct TomlConfig {
    formatter: Option<TomlFormatter>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct TomlFormatter {
    placeholder: Option<String>,
    left_delimiter: Option<String>,
    right_delimiter: Option<String>,
}

impl FormatterConfig {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load config from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(section) = parsed.formatter {
            if let Some(placeholder) = section.placeholder {
                config.placeholder = placeholder;
            }
            if let Some(left) = section.left_delimiter {
                config.left_delimiter = left;
            }
            if let Some(right) = section.right_delimiter {
                config.right_delimiter = right;
            }
        }

        Ok(config)
    }
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            left_delimiter: DEFAULT_LEFT_DELIMITER.to_string(),
            right_delimiter: DEFAULT_RIGHT_DELIMITER.to_string(),
            functions: Functions::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormatterConfig::default();
        assert_eq!(config.placeholder, "p");
        assert_eq!(config.left_delimiter, "{");
        assert_eq!(config.right_delimiter, "}");
        assert!(config.functions.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[formatter]
placeholder = "arg"
left-delimiter = "<<"
right-delimiter = ">>"
"#;
        let config = FormatterConfig::from_str(toml_str).expect("Should parse");
        assert_eq!(config.placeholder, "arg");
        assert_eq!(config.left_delimiter, "<<");
        assert_eq!(config.right_delimiter, ">>");
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let config = FormatterConfig::from_str("[formatter]\nplaceholder = \"x\"\n")
            .expect("Should parse");
        assert_eq!(config.placeholder, "x");
        assert_eq!(config.left_delimiter, "{");
    }

    #[test]
    fn test_empty_file() {
        let config = FormatterConfig::from_str("").expect("Should parse");
        assert_eq!(config.placeholder, "p");
    }

    #[test]
    fn test_empty_strings_are_kept() {
        let config = FormatterConfig::from_str("[formatter]\nplaceholder = \"\"\n")
            .expect("Should parse");
        assert_eq!(config.placeholder, "");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = FormatterConfig::from_str("[formatter]\ncolour = \"red\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = FormatterConfig::from_file(Path::new("/nonexistent/formatter.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
