//! ---
//! osp_section: "01-core-functionality"
//! osp_subsection: "module"
//! osp_type: "source"
//! osp_scope: "code"
//! osp_description: "Shared primitives for the OSP tooling."
//! osp_version: "v0.1.0"
//! osp_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::LogFormat;

fn default_indent() -> usize {
    2
}

fn default_xml_declaration() -> bool {
    true
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object for the OSP tooling.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OspConfig {
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`OspConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedOspConfig {
    pub config: OspConfig,
    /// `None` when no file was found and built-in defaults are in effect.
    pub source: Option<PathBuf>,
}

impl OspConfig {
    pub const ENV_CONFIG_PATH: &'static str = "OSP_CONFIG";

    /// Load configuration from disk, respecting the `OSP_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// Unlike an explicit `OSP_CONFIG` path, missing candidates are not an
    /// error: the defaults are returned instead.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedOspConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedOspConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(&path)?;
                return Ok(LoadedOspConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        debug!("no configuration file found, using defaults");
        Ok(LoadedOspConfig {
            config: OspConfig::default(),
            source: None,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<OspConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        if self.output.indent == 0 {
            return Err(anyhow!("output.indent must be at least 1"));
        }
        if let Some(path) = &self.schema.path {
            if !path.is_file() {
                return Err(anyhow!(
                    "schema.path {} does not exist or is not a file",
                    path.display()
                ));
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for OspConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: OspConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Location of the schema descriptor. The bundled descriptor is used when unset.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SchemaConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_indent")]
    pub indent: usize,
    #[serde(default = "default_xml_declaration")]
    pub xml_declaration: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            xml_declaration: default_xml_declaration(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
    #[serde(default)]
    pub to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
            to_file: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: OspConfig = "".parse().unwrap();
        assert_eq!(config, OspConfig::default());
        assert_eq!(config.output.indent, 2);
        assert!(config.output.xml_declaration);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn sections_override_defaults() {
        let config: OspConfig = r#"
            [output]
            indent = 4
            xml_declaration = false

            [logging]
            format = "structured-json"
            to_file = true
        "#
        .parse()
        .unwrap();
        assert_eq!(config.output.indent, 4);
        assert!(!config.output.xml_declaration);
        assert_eq!(config.logging.format, LogFormat::StructuredJson);
        assert!(config.logging.to_file);
    }

    #[test]
    fn zero_indent_is_rejected() {
        let err = "[output]\nindent = 0\n".parse::<OspConfig>().unwrap_err();
        assert!(err.to_string().contains("indent"));
    }

    #[test]
    fn missing_schema_file_is_rejected() {
        let err = "[schema]\npath = \"/nonexistent/osp.yaml\"\n"
            .parse::<OspConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("schema.path"));
    }

    #[test]
    fn first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let present = dir.path().join("ospctl.toml");
        fs::write(&present, "[output]\nindent = 3\n").unwrap();

        let loaded = OspConfig::load_with_source(&[missing, present.clone()]).unwrap();
        assert_eq!(loaded.source.as_deref(), Some(present.as_path()));
        assert_eq!(loaded.config.output.indent, 3);
    }

    #[test]
    fn no_candidates_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = OspConfig::load_with_source(&[dir.path().join("absent.toml")]).unwrap();
        assert!(loaded.source.is_none());
        assert_eq!(loaded.config, OspConfig::default());
    }
}
