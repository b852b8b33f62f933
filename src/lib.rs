//! @dose
//! purpose: This is the library crate root for tokensmith, exposing the public API for use as
//!     both a CLI tool and a library. It re-exports the composition entry points and the types
//!     that flow through them.
//!
//! when-editing:
//!     - !All public modules must be declared here with pub mod
//!     - Keep the re-export list organized by module
//!
//! invariants:
//!     - compose::plan_build + compose::compose is the whole pipeline; commands only add I/O
//!
//! gotchas:
//!     - The lib.rs is separate from main.rs - library consumers get lib, CLI gets main

pub mod cli;
pub mod commands;
pub mod compose;
pub mod config;
pub mod engine;
pub mod formatter;
pub mod reference;
pub mod types;

// Re-export main types for convenience
pub use cli::{BuildArgs, CheckArgs, Cli, Commands, WatchArgs};
pub use compose::{compose, plan_build, BuildPlan, ComposeError, Composition, PlanSettings};
pub use config::{Config, ConfigError};
pub use engine::{Dictionary, Engine, EngineError, Format, Platform, UnitConfig};
pub use reference::{resolve, Resolution};
pub use types::{Manifest, ManifestError, Token, TokenPath};
