//! @dose
//! purpose: Implements the build command. Loads config and manifest, plans the build targets,
//!     composes both artifacts in memory and writes them through a staged commit.
//!
//! when-editing:
//!     - !Nothing is written unless the whole composition succeeded
//!     - !Both artifacts are staged first and renamed into place together
//!     - compose_project is shared with check and watch; keep it free of output side effects
//!
//! invariants:
//!     - A failed build leaves previously written artifacts untouched
//!     - Dry run never creates directories or files
//!
//! flows:
//!     - Load: tokensmith.toml -> Config (+ CLI overrides) -> Manifest
//!     - Compose: plan_build -> compose with a standard platform
//!     - Write: stage css + mixins -> commit

use crate::cli::BuildArgs;
use crate::compose::{compose, plan_build, BuildPlan, Composition, PlanSettings, StagedWrites};
use crate::config::Config;
use crate::engine::{Engine, Platform};
use crate::types::Manifest;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A planned and composed project, not yet written
pub struct ProjectBuild {
    pub plan: BuildPlan,
    pub composition: Composition,
}

/// Plan settings derived from config
pub fn plan_settings(config: &Config, root: &Path) -> PlanSettings {
    PlanSettings {
        tokens_dir: config.tokens_dir(root),
        root_selector: config.root_selector.clone(),
        axes: config.axes.clone(),
        mixin_types: config.mixin_types.clone(),
    }
}

/// Load the manifest, plan, and compose everything in memory
pub fn compose_project(config: &Config, root: &Path) -> Result<ProjectBuild> {
    let manifest_path = config.manifest_path(root);
    let manifest = Manifest::load(&manifest_path)?;

    let plan = plan_build(&manifest, &plan_settings(config, root))
        .with_context(|| format!("Failed to plan build from {}", manifest_path.display()))?;
    debug!(
        targets = plan.targets.len(),
        base_files = plan.base_files.len(),
        "planned build"
    );

    let engine = Engine::new(Platform::standard(config.units.clone()));
    let composition = compose(&plan, &engine, &config.header)?;

    Ok(ProjectBuild { plan, composition })
}

pub fn run_build(args: &BuildArgs, root: &Path, verbose: bool) -> Result<()> {
    let mut config = Config::load(root)?;
    args.apply(&mut config);

    let (css_path, mixins_path) = output_paths(&config, root)?;

    let build = compose_project(&config, root)?;
    let composition = &build.composition;

    if verbose {
        for target in &composition.targets {
            println!(
                "  {} ({}): {} tokens",
                target.label, target.selector, target.tokens
            );
        }
    }

    if args.dry_run {
        println!(
            "Would write {} ({} bytes)",
            css_path.display(),
            composition.stylesheet.len()
        );
        println!(
            "Would write {} ({} bytes)",
            mixins_path.display(),
            composition.mixins.len()
        );
    } else {
        write_artifacts(composition, &css_path, &mixins_path)?;
    }

    println!(
        "Targets: {}, Tokens: {}, Mixins: {}, Warnings: {}",
        composition.targets.len(),
        composition.token_count(),
        composition.mixin_count,
        composition.warnings.len()
    );

    Ok(())
}

/// Stylesheet and mixin paths, which must not be the same file
pub fn output_paths(config: &Config, root: &Path) -> Result<(PathBuf, PathBuf)> {
    let css = config.css_path(root);
    let mixins = config.mixins_path(root);
    if css == mixins {
        anyhow::bail!(
            "Stylesheet and mixin output are both {}; they must be different files",
            css.display()
        );
    }
    Ok((css, mixins))
}

/// Stage both artifacts and commit them together
pub fn write_artifacts(composition: &Composition, css_path: &Path, mixins_path: &Path) -> Result<()> {
    let mut staged = StagedWrites::new();
    staged
        .stage(css_path, &composition.stylesheet)
        .with_context(|| format!("Failed to write {}", css_path.display()))?;
    staged
        .stage(mixins_path, &composition.mixins)
        .with_context(|| format!("Failed to write {}", mixins_path.display()))?;

    for path in staged.commit().context("Failed to move artifacts into place")? {
        debug!(path = %path.display(), "wrote artifact");
    }
    Ok(())
}
