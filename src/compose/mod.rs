//! @dose
//! purpose: The composition orchestrator. Runs every build target of a plan in order
//!     through the engine, concatenates the scoped blocks behind one header, and runs the
//!     mixin pass over the base files.
//!
//! when-editing:
//!     - !Targets run strictly one after another; each builds its own fresh dictionary
//!     - !Any target failure aborts the whole composition; nothing is returned partially
//!     - Writing artifacts is the caller's job (see staging); compose never touches disk
//!
//! invariants:
//!     - Output block order equals plan target order
//!     - A token's name is the same in every block it appears in
//!
//! flows:
//!     - Plan: plan_build(manifest, settings) -> BuildPlan
//!     - Compose: for each target, engine.build(sources, css/variables spec) -> block
//!     - Mixins: engine.build(base files, scss/typography-mixins spec) -> mixin text

mod plan;
mod staging;

pub use plan::{
    derive_axes, plan_build, AxisMode, BuildPlan, BuildTarget, MixinPass, ModeAxis, PlanSettings,
};
pub use staging::StagedWrites;

use crate::engine::{Engine, EngineError, FileSpec, FormatOptions, TokenFilter};
use crate::formatter::{CssVariables, TypographyMixins};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Axis collection \"{collection}\" is not declared in the manifest")]
    UnknownCollection { collection: String },
    #[error("Collection \"{collection}\" has no mode \"{mode}\" (available: {available})")]
    UnknownMode {
        collection: String,
        mode: String,
        available: String,
    },
    #[error("Mode \"{mode}\" of collection \"{collection}\" lists no token files")]
    EmptyMode { collection: String, mode: String },
    #[error("Style \"{style}\" lists no token files")]
    EmptyStyle { style: String },
    #[error("Token file not found: {path}")]
    MissingFile { path: PathBuf },
    #[error("Build target {label} ({selector}) failed: {source}")]
    Target {
        label: String,
        selector: String,
        #[source]
        source: EngineError,
    },
    #[error("Mixin generation failed: {0}")]
    Mixins(#[source] EngineError),
}

/// One rendered block
#[derive(Debug, Clone)]
pub struct TargetOutput {
    pub label: String,
    pub selector: String,
    pub tokens: usize,
    pub block: String,
}

/// Both artifacts, in memory
#[derive(Debug, Clone)]
pub struct Composition {
    pub stylesheet: String,
    pub mixins: String,
    pub targets: Vec<TargetOutput>,
    pub mixin_count: usize,
    pub warnings: Vec<String>,
}

impl Composition {
    pub fn token_count(&self) -> usize {
        self.targets.iter().map(|t| t.tokens).sum()
    }
}

/// Stylesheet header comment
pub fn css_header(text: &str) -> String {
    format!("/**\n * {}\n */\n\n", text)
}

/// Run the plan end to end
pub fn compose(plan: &BuildPlan, engine: &Engine, header: &str) -> Result<Composition, ComposeError> {
    let mut warnings = Vec::new();
    let mut targets = Vec::with_capacity(plan.targets.len());

    for target in &plan.targets {
        debug!(
            label = %target.label,
            selector = %target.selector,
            files = target.sources.len(),
            "building target"
        );

        let spec = FileSpec {
            format: Arc::new(CssVariables),
            filter: target.filter.clone(),
            options: FormatOptions {
                selector: target.selector.clone(),
                header: header.to_string(),
            },
        };

        let output =
            engine
                .build(&target.sources, &spec)
                .map_err(|source| ComposeError::Target {
                    label: target.label.clone(),
                    selector: target.selector.clone(),
                    source,
                })?;

        warnings.extend(output.warnings);
        targets.push(TargetOutput {
            label: target.label.clone(),
            selector: target.selector.clone(),
            tokens: output.emitted,
            block: output.text,
        });
    }

    let mut stylesheet = css_header(header);
    let blocks: Vec<&str> = targets.iter().map(|t| t.block.as_str()).collect();
    stylesheet.push_str(&blocks.join("\n"));

    let mixin_spec = FileSpec {
        format: Arc::new(TypographyMixins),
        filter: TokenFilter::OfType(plan.mixins.types.clone()),
        options: FormatOptions {
            selector: String::new(),
            header: header.to_string(),
        },
    };
    let mixins = engine
        .build(&plan.mixins.sources, &mixin_spec)
        .map_err(ComposeError::Mixins)?;
    warnings.extend(mixins.warnings);

    Ok(Composition {
        stylesheet,
        mixins: mixins.text,
        targets,
        mixin_count: mixins.emitted,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Platform, UnitConfig};
    use crate::types::Manifest;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const HEADER: &str = "Do not edit directly, this file was auto-generated.";

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn fixture() -> (TempDir, Manifest) {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write(
            dir,
            "spacing.tokens.json",
            r#"{"spacing": {"$type": "number", "sm": {"$value": 4}}}"#,
        );
        write(
            dir,
            "color.light.tokens.json",
            r##"{"color": {"$type": "color", "primary": {"$value": "#111"}}}"##,
        );
        write(
            dir,
            "color.dark.tokens.json",
            r##"{"color": {"$type": "color", "primary": {"$value": "#eee"}}}"##,
        );
        let manifest = Manifest::parse(
            r#"{
                "collections": {
                    "spacing": {"modes": {"value": ["spacing.tokens.json"]}},
                    "color": {"modes": {
                        "light": ["color.light.tokens.json"],
                        "dark": ["color.dark.tokens.json"]
                    }}
                }
            }"#,
        )
        .unwrap();
        (temp_dir, manifest)
    }

    fn settings(dir: &Path) -> PlanSettings {
        PlanSettings {
            tokens_dir: dir.to_path_buf(),
            root_selector: ":root".to_string(),
            axes: Vec::new(),
            mixin_types: vec!["typography".to_string()],
        }
    }

    fn engine() -> Engine {
        Engine::new(Platform::standard(UnitConfig::default()))
    }

    #[test]
    fn test_root_and_dark_blocks() {
        let (dir, manifest) = fixture();
        let plan = plan_build(&manifest, &settings(dir.path())).unwrap();
        let composition = compose(&plan, &engine(), HEADER).unwrap();

        assert_eq!(
            composition.stylesheet,
            "/**\n * Do not edit directly, this file was auto-generated.\n */\n\n\
             :root {\n  --spacing-sm: 4;\n  --color-primary: #111;\n}\n\
             \n\
             [data-color-mode='dark'] {\n  --color-primary: #eee;\n}\n"
        );
        assert_eq!(composition.targets.len(), 2);
        assert_eq!(composition.token_count(), 3);
    }

    #[test]
    fn test_names_are_stable_across_targets() {
        let (dir, manifest) = fixture();
        let plan = plan_build(&manifest, &settings(dir.path())).unwrap();
        let composition = compose(&plan, &engine(), HEADER).unwrap();

        let declared = |block: &str| -> Vec<String> {
            block
                .lines()
                .filter_map(|l| l.trim().strip_prefix("--"))
                .filter_map(|l| l.split(':').next())
                .map(str::to_string)
                .collect()
        };
        let root = declared(&composition.targets[0].block);
        let dark = declared(&composition.targets[1].block);
        for name in &dark {
            assert!(root.contains(name), "{name} missing from root block");
        }
    }

    #[test]
    fn test_target_failure_aborts() {
        let (dir, manifest) = fixture();
        write(
            dir.path(),
            "color.dark.tokens.json",
            r#"{"color": {"$type": "color", "primary": {"$value": "{palette.missing}"}}}"#,
        );
        let plan = plan_build(&manifest, &settings(dir.path())).unwrap();

        let err = compose(&plan, &engine(), HEADER).unwrap_err();
        match err {
            ComposeError::Target { label, source, .. } => {
                assert_eq!(label, "color:dark");
                assert!(matches!(source, EngineError::BrokenReference { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_files_are_reread_per_composition() {
        let (dir, manifest) = fixture();
        let plan = plan_build(&manifest, &settings(dir.path())).unwrap();

        let first = compose(&plan, &engine(), HEADER).unwrap();
        write(
            dir.path(),
            "color.light.tokens.json",
            r##"{"color": {"$type": "color", "primary": {"$value": "#222"}}}"##,
        );
        let second = compose(&plan, &engine(), HEADER).unwrap();

        assert!(first.stylesheet.contains("--color-primary: #111;"));
        assert!(second.stylesheet.contains("--color-primary: #222;"));
    }

    #[test]
    fn test_mixins_from_base_files() {
        let (dir, _) = fixture();
        write(
            dir.path(),
            "typography.tokens.json",
            r#"{"text": {"body": {"$type": "typography", "$value": {
                "fontSize": "{spacing.sm}",
                "paragraphSpacing": "8px"
            }}}}"#,
        );
        let manifest = Manifest::parse(
            r#"{
                "collections": {"spacing": {"modes": {"value": ["spacing.tokens.json"]}}},
                "styles": {"typography": ["typography.tokens.json"]}
            }"#,
        )
        .unwrap();

        let plan = plan_build(&manifest, &settings(dir.path())).unwrap();
        let composition = compose(&plan, &engine(), HEADER).unwrap();

        assert_eq!(
            composition.mixins,
            "// Do not edit directly, this file was auto-generated.\n\n\
             @mixin text-body {\n  font-size: var(--spacing-sm);\n}\n"
        );
        assert_eq!(composition.mixin_count, 1);
        assert_eq!(composition.warnings.len(), 1);
        assert!(composition.warnings[0].contains("\"paragraphSpacing\""));
    }
}
