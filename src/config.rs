//! @dose
//! purpose: Configuration file parsing for tokensmith.toml. Holds the manifest location,
//!     output paths, unit settings, the header text and the mode axes.
//!
//! when-editing:
//!     - !Config is loaded once per build and passed through the call chain
//!     - !An empty axis list means "derive axes from the manifest", not "no axes"
//!     - CLI flags override file values after loading (see cli::CommonOptions)
//!
//! invariants:
//!     - Config::load returns the default config if tokensmith.toml doesn't exist
//!     - A tokensmith.toml that exists but fails to parse is an error, never ignored
//!
//! gotchas:
//!     - Relative paths are resolved against the project root, not the config file
//!     - tokens_dir defaults to the manifest's directory

use crate::engine::UnitConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "tokensmith.toml";

pub const DEFAULT_HEADER: &str = "Do not edit directly, this file was auto-generated.";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure matching tokensmith.toml
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Manifest path (relative to root)
    pub manifest: PathBuf,

    /// Directory manifest entries are relative to
    pub tokens_dir: Option<PathBuf>,

    /// Selector for the default-mode block
    pub root_selector: String,

    /// Auto-generated header text for both artifacts
    pub header: String,

    /// Token types that get a mixin
    pub mixin_types: Vec<String>,

    pub output: OutputConfig,

    pub units: UnitConfig,

    /// Mode axes; empty derives them from the manifest
    #[serde(rename = "axis")]
    pub axes: Vec<AxisConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("src/tokens/manifest.json"),
            tokens_dir: None,
            root_selector: ":root".to_string(),
            header: DEFAULT_HEADER.to_string(),
            mixin_types: vec!["typography".to_string()],
            output: OutputConfig::default(),
            units: UnitConfig::default(),
            axes: Vec::new(),
        }
    }
}

/// Artifact paths
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub css: PathBuf,
    pub mixins: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            css: PathBuf::from("dist/css/tokens.css"),
            mixins: PathBuf::from("dist/scss/typography-mixins.scss"),
        }
    }
}

/// One variation axis: a multi-mode collection and how its modes are scoped
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AxisConfig {
    pub collection: String,

    /// Mode included in the root block
    pub default: String,

    /// Emission order for the other modes; unlisted modes follow in manifest order
    #[serde(default)]
    pub order: Vec<String>,

    /// Attribute in the mode selector (defaults to data-<collection>-mode)
    #[serde(default)]
    pub attribute: Option<String>,
}

impl AxisConfig {
    pub fn attribute(&self) -> String {
        self.attribute
            .clone()
            .unwrap_or_else(|| format!("data-{}-mode", self.collection))
    }
}

impl Config {
    /// Load configuration from tokensmith.toml in the given root directory
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: config_path,
            source,
        })
    }

    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.manifest)
    }

    pub fn tokens_dir(&self, root: &Path) -> PathBuf {
        match &self.tokens_dir {
            Some(dir) => root.join(dir),
            None => self
                .manifest_path(root)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
        }
    }

    pub fn css_path(&self, root: &Path) -> PathBuf {
        root.join(&self.output.css)
    }

    pub fn mixins_path(&self, root: &Path) -> PathBuf {
        root.join(&self.output.mixins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.manifest, PathBuf::from("src/tokens/manifest.json"));
        assert_eq!(config.root_selector, ":root");
        assert_eq!(config.mixin_types, vec!["typography"]);
        assert_eq!(config.units.output_unit, "rem");
        assert_eq!(config.units.base_px_font_size, 16.0);
        assert!(config.axes.is_empty());
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(temp_dir.path()).unwrap();
        assert_eq!(config.output.css, PathBuf::from("dist/css/tokens.css"));
        assert_eq!(
            config.tokens_dir(temp_dir.path()),
            temp_dir.path().join("src/tokens")
        );
    }

    #[test]
    fn test_load_basic_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"
manifest = "tokens/manifest.json"
tokens_dir = "tokens/files"
root_selector = ":root, .theme"

[output]
css = "build/tokens.css"

[units]
output_unit = "px"
"#;
        fs::write(temp_dir.path().join(CONFIG_FILE), config_content).unwrap();

        let config = Config::load(temp_dir.path()).unwrap();
        assert_eq!(config.root_selector, ":root, .theme");
        assert_eq!(config.css_path(temp_dir.path()), temp_dir.path().join("build/tokens.css"));
        // Unset keys keep their defaults
        assert_eq!(
            config.mixins_path(temp_dir.path()),
            temp_dir.path().join("dist/scss/typography-mixins.scss")
        );
        assert_eq!(config.units.output_unit, "px");
        assert_eq!(config.units.base_px_font_size, 16.0);
        assert_eq!(
            config.tokens_dir(temp_dir.path()),
            temp_dir.path().join("tokens/files")
        );
    }

    #[test]
    fn test_load_config_with_axes() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"
[[axis]]
collection = "color"
default = "light"
order = ["dark", "high-contrast"]

[[axis]]
collection = "radius"
default = "default"
attribute = "data-shape"
"#;
        fs::write(temp_dir.path().join(CONFIG_FILE), config_content).unwrap();

        let config = Config::load(temp_dir.path()).unwrap();
        assert_eq!(config.axes.len(), 2);
        assert_eq!(config.axes[0].collection, "color");
        assert_eq!(config.axes[0].order, vec!["dark", "high-contrast"]);
        assert_eq!(config.axes[0].attribute(), "data-color-mode");
        assert_eq!(config.axes[1].attribute(), "data-shape");
        assert!(config.axes[1].order.is_empty());
    }

    #[test]
    fn test_malformed_config_is_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE), "[[axis]]\ncollection = 3\n").unwrap();

        let err = Config::load(temp_dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
