//! @dose
//! purpose: Turns a manifest plus axis settings into a build plan: the base file set, the
//!     resolved mode axes, and the ordered list of build targets (root first, then one per
//!     non-default mode per axis) plus the mixin pass.
//!
//! when-editing:
//!     - !Only multi-mode collections named by an axis are split; everything else is base
//!     - !Mode targets filter to their own mode's files; base files are loaded but not emitted
//!     - Every file is checked for existence here, before any target runs
//!
//! invariants:
//!     - Target order is deterministic: root, then axes in order, then modes in mode order
//!     - An empty file list for any declared mode or style fails the plan (EmptyMode / EmptyStyle)
//!     - Base files keep manifest order with duplicates removed
//!
//! gotchas:
//!     - A configured axis whose collection has a single mode is treated as base
//!     - With no configured axes, the default mode is "light", then "default", then the
//!       first mode declared

use super::ComposeError;
use crate::config::AxisConfig;
use crate::engine::TokenFilter;
use crate::types::{Collection, Manifest};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Inputs to planning that don't come from the manifest
#[derive(Debug, Clone)]
pub struct PlanSettings {
    pub tokens_dir: PathBuf,
    pub root_selector: String,
    /// Configured axes; empty derives them from the manifest
    pub axes: Vec<AxisConfig>,
    pub mixin_types: Vec<String>,
}

/// A multi-mode collection resolved against the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct ModeAxis {
    pub collection: String,
    pub attribute: String,
    pub default_mode: String,
    pub default_files: Vec<PathBuf>,
    /// Non-default modes in emission order
    pub modes: Vec<AxisMode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisMode {
    pub name: String,
    pub files: Vec<PathBuf>,
}

/// One selector + file-set resolution unit
#[derive(Debug, Clone, PartialEq)]
pub struct BuildTarget {
    /// Short identifier, e.g. `root` or `color:dark`
    pub label: String,
    pub selector: String,
    pub sources: Vec<PathBuf>,
    pub filter: TokenFilter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MixinPass {
    pub sources: Vec<PathBuf>,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildPlan {
    pub base_files: Vec<PathBuf>,
    pub axes: Vec<ModeAxis>,
    pub targets: Vec<BuildTarget>,
    pub mixins: MixinPass,
}

impl BuildPlan {
    /// Every distinct file any target reads
    pub fn all_files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = Vec::new();
        for target in &self.targets {
            for file in &target.sources {
                if !files.contains(&file.as_path()) {
                    files.push(file);
                }
            }
        }
        files
    }
}

pub fn plan_build(manifest: &Manifest, settings: &PlanSettings) -> Result<BuildPlan, ComposeError> {
    check_declared_files(manifest)?;

    let axis_configs = if settings.axes.is_empty() {
        derive_axes(manifest)
    } else {
        settings.axes.clone()
    };

    let mut axes: Vec<ModeAxis> = Vec::new();
    for axis in &axis_configs {
        let collection = manifest
            .collection(&axis.collection)
            .ok_or_else(|| ComposeError::UnknownCollection {
                collection: axis.collection.clone(),
            })?;

        if !collection.is_multi_mode() {
            debug!(
                collection = %collection.name,
                "single-mode collection configured as axis, treating as base"
            );
            continue;
        }

        axes.push(resolve_axis(collection, axis, &settings.tokens_dir)?);
    }

    let mut base_files: Vec<PathBuf> = Vec::new();
    for collection in &manifest.collections {
        if axes.iter().any(|a| a.collection == collection.name) {
            continue;
        }
        for mode in &collection.modes {
            push_files(&mut base_files, &mode.files, &settings.tokens_dir);
        }
    }
    for style in &manifest.styles {
        push_files(&mut base_files, &style.files, &settings.tokens_dir);
    }

    let mut targets = Vec::new();

    let mut root_sources = base_files.clone();
    for axis in &axes {
        append_unique(&mut root_sources, &axis.default_files);
    }
    targets.push(BuildTarget {
        label: "root".to_string(),
        selector: settings.root_selector.clone(),
        sources: root_sources,
        filter: TokenFilter::All,
    });

    for axis in &axes {
        for mode in &axis.modes {
            let mut sources = base_files.clone();
            append_unique(&mut sources, &mode.files);
            targets.push(BuildTarget {
                label: format!("{}:{}", axis.collection, mode.name),
                selector: format!("[{}='{}']", axis.attribute, mode.name),
                sources,
                filter: TokenFilter::FromFiles(mode.files.clone()),
            });
        }
    }

    let plan = BuildPlan {
        mixins: MixinPass {
            sources: base_files.clone(),
            types: settings.mixin_types.clone(),
        },
        base_files,
        axes,
        targets,
    };

    for file in plan.all_files() {
        if !file.is_file() {
            return Err(ComposeError::MissingFile {
                path: file.to_path_buf(),
            });
        }
    }

    Ok(plan)
}

/// Every declared mode and style must list at least one file
fn check_declared_files(manifest: &Manifest) -> Result<(), ComposeError> {
    for collection in &manifest.collections {
        if let Some(mode) = collection.modes.iter().find(|m| m.files.is_empty()) {
            return Err(ComposeError::EmptyMode {
                collection: collection.name.clone(),
                mode: mode.name.clone(),
            });
        }
    }
    match manifest.styles.iter().find(|s| s.files.is_empty()) {
        Some(style) => Err(ComposeError::EmptyStyle {
            style: style.name.clone(),
        }),
        None => Ok(()),
    }
}

/// Axes for every multi-mode collection, used when none are configured
pub fn derive_axes(manifest: &Manifest) -> Vec<AxisConfig> {
    manifest
        .collections
        .iter()
        .filter(|c| c.is_multi_mode())
        .map(|c| {
            let default = ["light", "default"]
                .into_iter()
                .find(|name| c.mode(name).is_some())
                .map(str::to_string)
                .unwrap_or_else(|| c.modes[0].name.clone());
            AxisConfig {
                collection: c.name.clone(),
                default,
                order: Vec::new(),
                attribute: None,
            }
        })
        .collect()
}

fn resolve_axis(
    collection: &Collection,
    axis: &AxisConfig,
    tokens_dir: &Path,
) -> Result<ModeAxis, ComposeError> {
    let default_mode =
        collection
            .mode(&axis.default)
            .ok_or_else(|| ComposeError::UnknownMode {
                collection: collection.name.clone(),
                mode: axis.default.clone(),
                available: collection.mode_names().join(", "),
            })?;

    for name in &axis.order {
        if collection.mode(name).is_none() {
            return Err(ComposeError::UnknownMode {
                collection: collection.name.clone(),
                mode: name.clone(),
                available: collection.mode_names().join(", "),
            });
        }
    }

    // Configured order first, then anything left in manifest order
    let mut ordered: Vec<&str> = axis
        .order
        .iter()
        .map(String::as_str)
        .filter(|name| *name != default_mode.name)
        .collect();
    for mode in &collection.modes {
        if mode.name != default_mode.name && !ordered.contains(&mode.name.as_str()) {
            ordered.push(&mode.name);
        }
    }

    let modes = ordered
        .into_iter()
        .filter_map(|name| collection.mode(name))
        .map(|mode| AxisMode {
            name: mode.name.clone(),
            files: resolve_files(&mode.files, tokens_dir),
        })
        .collect();

    Ok(ModeAxis {
        collection: collection.name.clone(),
        attribute: axis.attribute(),
        default_mode: default_mode.name.clone(),
        default_files: resolve_files(&default_mode.files, tokens_dir),
        modes,
    })
}

fn resolve_files(entries: &[String], tokens_dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::with_capacity(entries.len());
    push_files(&mut files, entries, tokens_dir);
    files
}

fn push_files(files: &mut Vec<PathBuf>, entries: &[String], tokens_dir: &Path) {
    for entry in entries {
        let path = tokens_dir.join(entry);
        if !files.contains(&path) {
            files.push(path);
        }
    }
}

fn append_unique(files: &mut Vec<PathBuf>, extra: &[PathBuf]) {
    for path in extra {
        if !files.contains(path) {
            files.push(path.clone());
        }
    }
}
