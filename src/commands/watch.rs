//! @dose
//! purpose: Implements the watch command that monitors token files, the manifest and
//!     tokensmith.toml, and rebuilds both artifacts after a debounce window.
//!
//! when-editing:
//!     - !Debouncing is critical for handling rapid file changes (editor saves)
//!     - !A failed rebuild is reported and watching continues
//!     - Config is reloaded on every rebuild so tokensmith.toml edits take effect
//!
//! invariants:
//!     - Initial build must complete before watching starts
//!     - Writes to the output artifacts never trigger a rebuild
//!
//! flows:
//!     - Initial: run_build once (errors are fatal here)
//!     - Watch: receive notify events, keep relevant paths, debounce
//!     - Rebuild: reload config, compose, write

use crate::cli::{BuildArgs, WatchArgs};
use crate::commands::{compose_project, output_paths, run_build, write_artifacts};
use crate::config::{Config, CONFIG_FILE};
use anyhow::Result;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::debug;

pub fn run_watch(args: &WatchArgs, root: &Path, verbose: bool) -> Result<()> {
    println!("Running initial build...");
    let build_args = BuildArgs {
        common: args.common.clone(),
        ..Default::default()
    };
    run_build(&build_args, root, verbose)?;

    let mut config = Config::load(root)?;
    args.common.apply(&mut config);

    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        notify::Config::default(),
    )?;

    let tokens_dir = config.tokens_dir(root);
    watcher.watch(&tokens_dir, RecursiveMode::Recursive)?;
    // Non-recursive root watch picks up tokensmith.toml and a manifest outside tokens_dir
    watcher.watch(root, RecursiveMode::NonRecursive)?;
    let manifest_path = config.manifest_path(root);
    if let Some(dir) = manifest_path.parent() {
        if !dir.starts_with(&tokens_dir) && dir != root && dir.exists() {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }
    }
    if verbose {
        println!("Watching: {}", tokens_dir.display());
    }

    println!("Watching for changes... (press Ctrl+C to stop)");

    let mut pending: HashSet<PathBuf> = HashSet::new();
    let mut last_event = Instant::now();
    let debounce = Duration::from_millis(args.debounce);
    let poll_interval = Duration::from_millis(50);

    loop {
        match rx.recv_timeout(poll_interval) {
            Ok(event) => {
                if collect_event(&event, &mut pending, &config, root) {
                    last_event = Instant::now();
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if !pending.is_empty() && last_event.elapsed() >= debounce {
                    if args.clear {
                        // Clear terminal (ANSI escape code)
                        print!("\x1B[2J\x1B[1;1H");
                    }
                    for path in pending.drain() {
                        let shown = path.strip_prefix(root).unwrap_or(&path);
                        println!("Changed: {}", shown.display());
                    }
                    match rebuild(args, root) {
                        Ok(summary) => println!("{}", summary),
                        Err(e) => eprintln!("Rebuild failed: {:#}", e),
                    }
                    // Pick up output path changes from a reloaded config
                    if let Ok(mut reloaded) = Config::load(root) {
                        args.common.apply(&mut reloaded);
                        config = reloaded;
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                println!("Watcher disconnected");
                break;
            }
        }
    }

    Ok(())
}

/// Queue the event's relevant paths; returns whether anything was queued
fn collect_event(event: &Event, pending: &mut HashSet<PathBuf>, config: &Config, root: &Path) -> bool {
    match &event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
        _ => return false,
    }

    let mut queued = false;
    for path in &event.paths {
        if is_relevant(path, config, root) {
            debug!(path = %path.display(), "change queued");
            pending.insert(path.clone());
            queued = true;
        }
    }
    queued
}

/// Token JSON, the manifest, or the config file; never our own artifacts or staged temp files
pub fn is_relevant(path: &Path, config: &Config, root: &Path) -> bool {
    if path == config.css_path(root) || path == config.mixins_path(root) {
        return false;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if name.starts_with('.') {
        return false;
    }
    if path == config.manifest_path(root) || path == root.join(CONFIG_FILE) {
        return true;
    }
    path.starts_with(config.tokens_dir(root)) && name.ends_with(".json")
}

fn rebuild(args: &WatchArgs, root: &Path) -> Result<String> {
    let mut config = Config::load(root)?;
    args.common.apply(&mut config);

    let (css_path, mixins_path) = output_paths(&config, root)?;

    let build = compose_project(&config, root)?;
    let composition = &build.composition;
    write_artifacts(composition, &css_path, &mixins_path)?;

    Ok(format!(
        "Rebuilt: {} targets, {} tokens, {} mixins, {} warnings",
        composition.targets.len(),
        composition.token_count(),
        composition.mixin_count,
        composition.warnings.len()
    ))
}
