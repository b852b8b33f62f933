//! @dose
//! purpose: The token manifest: which collections exist, which modes each collection has,
//!     and which token files feed every mode and every style group.
//!
//! when-editing:
//!     - !Collection, mode and style order is manifest order (serde_json preserve_order)
//!     - File entries are kept exactly as written; resolving them against the tokens
//!       directory is the planner's job
//!
//! invariants:
//!     - A manifest that fails to read or parse is fatal; there is no partial manifest
//!
//! gotchas:
//!     - `styles` may be absent in small manifests and defaults to empty

use serde::Deserialize;
use serde_json::Map;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A named variant of a collection and the files that define it
#[derive(Debug, Clone, PartialEq)]
pub struct Mode {
    pub name: String,
    pub files: Vec<String>,
}

/// Tokens sharing one variation axis
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub name: String,
    pub modes: Vec<Mode>,
}

impl Collection {
    pub fn mode(&self, name: &str) -> Option<&Mode> {
        self.modes.iter().find(|m| m.name == name)
    }

    pub fn mode_names(&self) -> Vec<&str> {
        self.modes.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn is_multi_mode(&self) -> bool {
        self.modes.len() > 1
    }
}

/// Mode-independent token group
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub name: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub collections: Vec<Collection>,
    pub styles: Vec<Style>,
}

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    collections: Map<String, serde_json::Value>,
    #[serde(default)]
    styles: Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawCollection {
    modes: Map<String, serde_json::Value>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse manifest JSON, keeping declaration order everywhere
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let raw: RawManifest = serde_json::from_str(content)?;

        let mut collections = Vec::with_capacity(raw.collections.len());
        for (name, value) in raw.collections {
            let raw_collection: RawCollection = serde_json::from_value(value)?;
            let mut modes = Vec::with_capacity(raw_collection.modes.len());
            for (mode_name, files) in raw_collection.modes {
                modes.push(Mode {
                    name: mode_name,
                    files: serde_json::from_value(files)?,
                });
            }
            collections.push(Collection { name, modes });
        }

        let mut styles = Vec::with_capacity(raw.styles.len());
        for (name, files) in raw.styles {
            styles.push(Style {
                name,
                files: serde_json::from_value(files)?,
            });
        }

        Ok(Self {
            collections,
            styles,
        })
    }

    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Every file entry the manifest mentions, in declaration order
    pub fn all_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = Vec::new();
        for collection in &self.collections {
            for mode in &collection.modes {
                files.extend(mode.files.iter().map(String::as_str));
            }
        }
        for style in &self.styles {
            files.extend(style.files.iter().map(String::as_str));
        }
        files
    }
}
