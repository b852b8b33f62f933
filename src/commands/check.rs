//! @dose
//! purpose: Implements the check command. Plans and composes the whole project in memory,
//!     prints the plan, and reports token files the manifest never mentions.
//!
//! when-editing:
//!     - !Check never writes artifacts
//!     - Unlisted token files are reported, not fatal, unless --strict
//!
//! invariants:
//!     - Any error that would fail `build` also fails `check`
//!
//! do-not:
//!     - Never fail on warnings unless --strict is specified
//!
//! gotchas:
//!     - The manifest itself is skipped when scanning for unlisted files
//!
//! flows:
//!     - Compose: compose_project (same path as build)
//!     - Report: plan summary, warnings, unlisted files

use crate::cli::CheckArgs;
use crate::commands::compose_project;
use crate::compose::BuildPlan;
use crate::config::Config;
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn run_check(args: &CheckArgs, root: &Path, verbose: bool) -> Result<()> {
    let mut config = Config::load(root)?;
    args.common.apply(&mut config);

    let build = compose_project(&config, root)?;
    let plan = &build.plan;
    let composition = &build.composition;

    print_plan(plan, root, verbose);

    for warning in &composition.warnings {
        println!("WARNING: {}", warning);
    }

    let unlisted = unlisted_token_files(plan, &config.tokens_dir(root), &config.manifest_path(root));
    for path in &unlisted {
        let shown = path.strip_prefix(root).unwrap_or(path);
        println!("WARNING: {} is not listed in the manifest", shown.display());
    }

    let warnings = composition.warnings.len() + unlisted.len();
    println!(
        "Targets: {}, Tokens: {}, Mixins: {}, Warnings: {}",
        composition.targets.len(),
        composition.token_count(),
        composition.mixin_count,
        warnings
    );

    if args.strict && warnings > 0 {
        anyhow::bail!("{} warning(s) in strict mode", warnings);
    }

    Ok(())
}

fn print_plan(plan: &BuildPlan, root: &Path, verbose: bool) {
    println!("Base files: {}", plan.base_files.len());
    for axis in &plan.axes {
        let others: Vec<&str> = axis.modes.iter().map(|m| m.name.as_str()).collect();
        println!(
            "Axis {}: default {}, modes [{}] via {}",
            axis.collection,
            axis.default_mode,
            others.join(", "),
            axis.attribute
        );
    }
    for target in &plan.targets {
        println!("Target {} -> {}", target.label, target.selector);
        if verbose {
            for source in &target.sources {
                let shown = source.strip_prefix(root).unwrap_or(source);
                println!("  {}", shown.display());
            }
        }
    }
}

/// `*.json` files under `tokens_dir` that no part of the plan reads
pub fn unlisted_token_files(plan: &BuildPlan, tokens_dir: &Path, manifest: &Path) -> Vec<PathBuf> {
    let listed: HashSet<&Path> = plan.all_files().into_iter().collect();

    let mut unlisted: Vec<PathBuf> = WalkDir::new(tokens_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter(|p| p != manifest && !listed.contains(p.as_path()))
        .collect();

    unlisted.sort();
    unlisted
}
