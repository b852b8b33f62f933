//! @dose
//! purpose: The token resolution engine. Given an ordered list of token files and a file
//!     spec (format + token filter + options), it builds a fresh dictionary, selects tokens
//!     and renders them through the chosen format.
//!
//! when-editing:
//!     - !Transforms and formats are passed in through Platform and FileSpec on every build;
//!       there is no process-wide registry
//!     - !Every build reads its files again; nothing resolved is cached between builds
//!     - New output formats implement the Format trait and live in crate::formatter
//!
//! invariants:
//!     - The dictionary used by a format is always the full, unfiltered one; the filter
//!       only decides which tokens are emitted
//!     - Dictionary warnings (collisions) are carried into the build output
//!
//! gotchas:
//!     - FromFiles filtering compares paths exactly, so callers must pass the same
//!       PathBuf values they used as sources

mod dictionary;
mod transform;

pub use dictionary::Dictionary;
pub use transform::{standard_transforms, FnTransform, UnitConfig, ValueTransform};

use crate::types::Token;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to read token file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed token file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Token {token} references {{{reference}}}, which is not defined")]
    BrokenReference { token: String, reference: String },
    #[error("Circular reference: {}", .chain.join(" -> "))]
    CircularReference { chain: Vec<String> },
    #[error("Tokens {first} and {second} both produce the name --{name}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },
}

/// Value transforms plus unit settings shared by every file spec of a build
#[derive(Clone)]
pub struct Platform {
    transforms: Vec<Arc<dyn ValueTransform>>,
    units: UnitConfig,
}

impl Platform {
    /// Platform with the standard CSS transform chain
    pub fn standard(units: UnitConfig) -> Self {
        Self {
            transforms: standard_transforms(),
            units,
        }
    }

    /// Platform with no transforms; values pass through as written
    pub fn bare(units: UnitConfig) -> Self {
        Self {
            transforms: Vec::new(),
            units,
        }
    }

    /// Append a transform; it runs after the ones already registered
    pub fn with_transform(mut self, transform: Arc<dyn ValueTransform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn units(&self) -> &UnitConfig {
        &self.units
    }

    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Run every matching transform over `value` in registration order
    pub fn transform(&self, token: &Token, value: serde_json::Value) -> serde_json::Value {
        self.transforms
            .iter()
            .filter(|t| t.applies_to(token))
            .fold(value, |acc, t| t.transform(acc, &self.units))
    }
}

/// Which tokens a file spec emits
#[derive(Debug, Clone, PartialEq)]
pub enum TokenFilter {
    All,
    /// Tokens whose source file is one of these paths
    FromFiles(Vec<PathBuf>),
    /// Tokens whose type tag is one of these
    OfType(Vec<String>),
}

impl TokenFilter {
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Self::All => true,
            Self::FromFiles(files) => files.iter().any(|f| f == &token.file),
            Self::OfType(types) => types.iter().any(|t| token.is_type(t)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Scoping selector for stylesheet formats
    pub selector: String,
    /// Text of the auto-generated header, for formats that write one
    pub header: String,
}

/// Rendered text of one file spec
#[derive(Debug, Clone, Default)]
pub struct FormatOutput {
    pub text: String,
    /// Number of tokens that produced output
    pub emitted: usize,
    /// Recoverable problems, in the order they occurred
    pub warnings: Vec<String>,
}

/// Everything a format can see while rendering
pub struct FormatContext<'a> {
    pub dictionary: &'a Dictionary,
    /// Tokens selected by the filter, in dictionary order
    pub tokens: Vec<&'a Token>,
    pub platform: &'a Platform,
    pub options: &'a FormatOptions,
}

/// Output format contract
pub trait Format: Send + Sync {
    fn name(&self) -> &'static str;

    fn render(&self, ctx: &FormatContext<'_>) -> Result<FormatOutput, EngineError>;
}

/// One output: a format, the tokens it emits and its options
#[derive(Clone)]
pub struct FileSpec {
    pub format: Arc<dyn Format>,
    pub filter: TokenFilter,
    pub options: FormatOptions,
}

pub struct Engine {
    platform: Platform,
}

impl Engine {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Load `sources` into a fresh dictionary and render `file` from it
    pub fn build(&self, sources: &[PathBuf], file: &FileSpec) -> Result<FormatOutput, EngineError> {
        let dictionary = Dictionary::load(sources)?;
        self.render(&dictionary, file)
    }

    /// Render `file` from an already loaded dictionary
    pub fn render(
        &self,
        dictionary: &Dictionary,
        file: &FileSpec,
    ) -> Result<FormatOutput, EngineError> {
        let tokens: Vec<&Token> = dictionary
            .tokens()
            .iter()
            .filter(|t| file.filter.matches(t))
            .collect();

        debug!(
            format = file.format.name(),
            total = dictionary.len(),
            selected = tokens.len(),
            "rendering"
        );

        let ctx = FormatContext {
            dictionary,
            tokens,
            platform: &self.platform,
            options: &file.options,
        };

        let mut output = file.format.render(&ctx)?;
        if !dictionary.warnings().is_empty() {
            let mut warnings = dictionary.warnings().to_vec();
            warnings.append(&mut output.warnings);
            output.warnings = warnings;
        }
        Ok(output)
    }
}
