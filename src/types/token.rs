//! @dose
//! purpose: Core token types. A Token is one leaf design value read from a token file,
//!     carrying its dotted path, type tag, raw value, metadata and the file it came from.
//!
//! when-editing:
//!     - !canonical_name is the single naming function; reference fallback uses it too
//!     - The raw value is kept as serde_json::Value so composite records keep key order
//!
//! invariants:
//!     - A token's canonical name depends only on its path, never on the build target
//!     - Paths are never empty
//!
//! gotchas:
//!     - Kebab conversion splits camelCase segments: lineHeight becomes line-height

use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Description marker for dimensions that must be emitted without a unit
pub const UNITLESS_MARKER: &str = "unitless";

/// Hierarchical token path (e.g. `color.primary`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenPath(Vec<String>);

impl TokenPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Parse a dotted path as written inside a reference expression
    pub fn parse(dotted: &str) -> Self {
        Self(
            dotted
                .split('.')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Output identifier derived from the path
    pub fn canonical_name(&self) -> String {
        canonical_name(&self.0)
    }
}

impl fmt::Display for TokenPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Kebab-case each segment and join with `-`.
pub fn canonical_name<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| kebab_case(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn kebab_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    let mut prev: Option<char> = None;

    for ch in segment.chars() {
        if ch.is_alphanumeric() {
            if ch.is_uppercase() {
                // fooBar -> foo-bar, size2Xl -> size2-xl
                if matches!(prev, Some(p) if p.is_lowercase() || p.is_ascii_digit())
                    && !out.is_empty()
                    && !out.ends_with('-')
                {
                    out.push('-');
                }
                out.extend(ch.to_lowercase());
            } else {
                out.push(ch);
            }
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
        prev = Some(ch);
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// One resolved-from-file design token
#[derive(Debug, Clone)]
pub struct Token {
    pub path: TokenPath,
    /// `$type`, possibly inherited from an enclosing group
    pub token_type: Option<String>,
    /// `$value` exactly as written in the source file
    pub value: Value,
    /// `$description`
    pub description: Option<String>,
    /// File the token was read from
    pub file: PathBuf,
}

impl Token {
    pub fn name(&self) -> String {
        self.path.canonical_name()
    }

    pub fn is_type(&self, ty: &str) -> bool {
        self.token_type.as_deref() == Some(ty)
    }

    pub fn is_unitless(&self) -> bool {
        self.description.as_deref().map(str::trim) == Some(UNITLESS_MARKER)
    }

    /// True when the raw value is a structured record of sub-values
    pub fn is_composite(&self) -> bool {
        self.value.is_object()
    }
}

/// Render a JSON value as plain text (strings unquoted, arrays comma-joined)
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
