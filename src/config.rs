//! Engine configuration.
//!
//! Settings are read from YAML. Every field has a default so an empty document
//! (or [`Config::default`]) yields a working configuration:
//!
//! ```yaml
//! logger:
//!   enable: true
//!   level: debug
//!   format: compact
//! namespace:
//!   base: http://example.org/ontology#
//! actions:
//!   default_relation: relatedTo
//!   datatype_class: String
//!   scan_raw_text: true
//! hierarchy:
//!   expand_object_targets: false
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::ontology::{Iri, IriError};

/// Top level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logger: Logger,
    pub namespace: NamespaceSettings,
    pub actions: ActionSettings,
    pub hierarchy: HierarchySettings,
}

impl Config {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a YAML configuration file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.namespace.base_iri()?;
        if self.actions.default_relation.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "`actions.default_relation` must not be empty".to_string(),
            ));
        }
        if self.actions.datatype_class.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "`actions.datatype_class` must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Logger {
    /// Enable log write to stdout
    pub enable: bool,

    /// Set the logger level.
    ///
    /// * options: `trace` | `debug` | `info` | `warn` | `error`
    pub level: LogLevel,

    /// Set the logger format.
    ///
    /// * options: `compact` | `pretty` | `json`
    pub format: LogFormat,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            enable: true,
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

/// Namespace used when minting class and property URIs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NamespaceSettings {
    pub base: String,
}

impl Default for NamespaceSettings {
    fn default() -> Self {
        Self {
            base: crate::rdf::DEFAULT_BASE.to_string(),
        }
    }
}

impl NamespaceSettings {
    /// Returns the validated base IRI.
    pub fn base_iri(&self) -> Result<Iri, ConfigError> {
        Iri::new(self.base.clone()).map_err(ConfigError::Namespace)
    }
}

/// Defaults applied while interpreting assistant actions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ActionSettings {
    /// Predicate used by `add_edge` when no label is supplied.
    pub default_relation: String,
    /// Label of the datatype marker node `add_property` targets when the
    /// action names no datatype.
    pub datatype_class: String,
    /// Scan unfenced text for action objects when no fenced block yields one.
    pub scan_raw_text: bool,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            default_relation: "relatedTo".to_string(),
            datatype_class: "String".to_string(),
            scan_raw_text: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HierarchySettings {
    /// Nest the direct properties of object-property targets below the row.
    pub expand_object_targets: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid namespace: {0}")]
    Namespace(IriError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_yaml_str("{}").expect("defaults");
        assert_eq!(config, Config::default());
        assert_eq!(config.actions.default_relation, "relatedTo");
        assert_eq!(config.namespace.base, "http://example.org/ontology#");
    }

    #[test]
    fn reads_partial_sections() {
        let config = Config::from_yaml_str(
            "logger:\n  level: debug\n  format: json\nhierarchy:\n  expand_object_targets: true\n",
        )
        .expect("valid config");
        assert_eq!(config.logger.level, LogLevel::Debug);
        assert_eq!(config.logger.format, LogFormat::Json);
        assert!(config.logger.enable);
        assert!(config.hierarchy.expand_object_targets);
    }

    #[test]
    fn rejects_invalid_namespace() {
        let err = Config::from_yaml_str("namespace:\n  base: not an iri\n").expect_err("invalid");
        assert!(matches!(err, ConfigError::Namespace(_)));
    }

    #[test]
    fn rejects_blank_default_relation() {
        let err = Config::from_yaml_str("actions:\n  default_relation: ' '\n").expect_err("blank");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
