//! @dose
//! purpose: This module defines the command-line interface for tokensmith using the clap derive
//!     macros. It specifies all commands (build, check, watch) and their arguments.
//!
//! when-editing:
//!     - !Each command struct must derive Args and be added to the Commands enum
//!     - !Global flags (root, verbose) are defined on Cli and propagate to all subcommands
//!     - Flags that mirror tokensmith.toml keys override the file after it is loaded
//!
//! invariants:
//!     - The Cli struct is the root parser that clap uses to parse command-line arguments
//!     - PathBuf is used for all file/directory path arguments
//!
//! do-not:
//!     - Never add positional arguments that could conflict with subcommands
//!
//! gotchas:
//!     - The --root flag is global but optional; defaults to current directory in main.rs
//!     - Relative --manifest / --css-out paths are resolved against the root, like config values

use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tokensmith")]
#[command(author, version, about = "Multi-mode design token composer for CSS and SCSS")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to project root (defaults to current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compose the stylesheet and typography mixins
    Build(BuildArgs),

    /// Plan and resolve everything without writing, reporting problems
    Check(CheckArgs),

    /// Watch token files and rebuild on change
    Watch(WatchArgs),
}

/// Options shared by every command
#[derive(Args, Clone, Default)]
pub struct CommonOptions {
    /// Manifest path, overriding tokensmith.toml
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,
}

impl CommonOptions {
    /// Apply these options on top of a loaded config
    pub fn apply(&self, config: &mut Config) {
        if let Some(manifest) = &self.manifest {
            config.manifest = manifest.clone();
        }
    }
}

#[derive(Args, Default)]
pub struct BuildArgs {
    /// Dry run - print what would be written without touching disk
    #[arg(long)]
    pub dry_run: bool,

    /// Stylesheet output path
    #[arg(long, value_name = "PATH")]
    pub css_out: Option<PathBuf>,

    /// Mixin file output path
    #[arg(long, value_name = "PATH")]
    pub mixins_out: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonOptions,
}

impl BuildArgs {
    pub fn apply(&self, config: &mut Config) {
        self.common.apply(config);
        if let Some(css) = &self.css_out {
            config.output.css = css.clone();
        }
        if let Some(mixins) = &self.mixins_out {
            config.output.mixins = mixins.clone();
        }
    }
}

#[derive(Args, Default)]
pub struct CheckArgs {
    /// Strict mode - treat warnings as errors
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Args, Default)]
pub struct WatchArgs {
    /// Debounce delay in milliseconds
    #[arg(long, default_value_t = 100)]
    pub debounce: u64,

    /// Clear screen before each rebuild
    #[arg(long)]
    pub clear: bool,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from(["tokensmith", "build"]).unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("Expected Build")
        };
        assert!(!args.dry_run);
        assert!(args.css_out.is_none());
        assert!(args.common.manifest.is_none());

        let cli = Cli::try_parse_from([
            "tokensmith",
            "build",
            "--dry-run",
            "--css-out",
            "out/tokens.css",
            "--manifest",
            "tokens/manifest.json",
        ])
        .unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("Expected Build")
        };
        assert!(args.dry_run);
        assert_eq!(args.css_out, Some(PathBuf::from("out/tokens.css")));
        assert_eq!(
            args.common.manifest,
            Some(PathBuf::from("tokens/manifest.json"))
        );
    }

    #[test]
    fn test_build_args_override_config() {
        let args = BuildArgs {
            css_out: Some(PathBuf::from("a.css")),
            common: CommonOptions {
                manifest: Some(PathBuf::from("m.json")),
            },
            ..Default::default()
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.output.css, PathBuf::from("a.css"));
        assert_eq!(config.manifest, PathBuf::from("m.json"));
        // Untouched
        assert_eq!(
            config.output.mixins,
            PathBuf::from("dist/scss/typography-mixins.scss")
        );
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["tokensmith", "check"]).unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("Expected Check")
        };
        assert!(!args.strict);

        let cli = Cli::try_parse_from(["tokensmith", "check", "--strict"]).unwrap();
        let Commands::Check(args) = cli.command else {
            panic!("Expected Check")
        };
        assert!(args.strict);
    }

    #[test]
    fn test_parse_watch() {
        let cli = Cli::try_parse_from(["tokensmith", "watch"]).unwrap();
        let Commands::Watch(args) = cli.command else {
            panic!("Expected Watch")
        };
        assert_eq!(args.debounce, 100);
        assert!(!args.clear);

        let cli =
            Cli::try_parse_from(["tokensmith", "watch", "--debounce", "250", "--clear"]).unwrap();
        let Commands::Watch(args) = cli.command else {
            panic!("Expected Watch")
        };
        assert_eq!(args.debounce, 250);
        assert!(args.clear);
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["tokensmith", "-v", "build"]).unwrap();
        assert!(cli.verbose);

        let cli = Cli::try_parse_from(["tokensmith", "check", "--root", "/tmp/project"]).unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/project")));
    }

    #[test]
    fn test_error_cases() {
        assert!(Cli::try_parse_from(["tokensmith"]).is_err());
        assert!(Cli::try_parse_from(["tokensmith", "generate"]).is_err());
        assert!(Cli::try_parse_from(["tokensmith", "watch", "--debounce", "soon"]).is_err());
    }
}
