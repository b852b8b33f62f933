//! @dose
//! purpose: Reference resolution. Turns a raw token value that is a reference expression
//!     (`{dot.separated.path}`) into a custom-property reference to the target's canonical
//!     name, using one function with two explicit tiers.
//!
//! when-editing:
//!     - !Tier 1 is an exact dictionary lookup; tier 2 rebuilds the name from the path text
//!     - !Both tiers go through types::canonical_name, so they always agree on the name
//!     - Callers decide whether a tier-2 result is acceptable (stylesheets reject it,
//!       mixins accept it with a warning)
//!
//! invariants:
//!     - Non-reference values come back unchanged as text
//!     - `{group.sub.name}` yields `var(--group-sub-name)` from either tier
//!
//! gotchas:
//!     - A string with references embedded among other text is a literal with every
//!       reference substituted, not a reference itself

use crate::engine::Dictionary;
use crate::types::{value_text, TokenPath};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Whole-value reference: the entire string is `{path}`
static WHOLE_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{([^{}]+)\}$").unwrap());

/// Any reference inside a larger string
static EMBEDDED_REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

/// Outcome of resolving one raw value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Reference found in the dictionary; holds the target's canonical name
    Exact(String),
    /// Reference not found; name rebuilt from the path text without validation
    Syntactic(String),
    /// Not a reference
    Literal(String),
}

impl Resolution {
    /// Text to place in a declaration
    pub fn css(&self) -> String {
        match self {
            Self::Exact(name) | Self::Syntactic(name) => var_reference(name),
            Self::Literal(text) => text.clone(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Syntactic(_))
    }
}

pub fn var_reference(name: &str) -> String {
    format!("var(--{})", name)
}

/// Path inside a whole-value reference expression, if `raw` is one
pub fn parse_reference(raw: &str) -> Option<TokenPath> {
    let captures = WHOLE_REFERENCE.captures(raw.trim())?;
    let path = TokenPath::parse(&captures[1]);
    (!path.is_empty()).then_some(path)
}

/// Every reference path (as written) found anywhere in `value`
pub fn references_in(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_references(value, &mut found);
    found
}

fn collect_references(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for captures in EMBEDDED_REFERENCE.captures_iter(s) {
                found.push(captures[1].trim().to_string());
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, found)),
        Value::Object(map) => map.values().for_each(|v| collect_references(v, found)),
        _ => {}
    }
}

/// Resolve one dotted reference path: exact lookup first, then the syntactic rebuild
pub fn resolve_path(path: &TokenPath, dictionary: &Dictionary) -> Resolution {
    match dictionary.get(path) {
        Some(token) => Resolution::Exact(token.name()),
        None => Resolution::Syntactic(path.canonical_name()),
    }
}

/// Resolve a raw value to its output text
pub fn resolve(raw: &Value, dictionary: &Dictionary) -> Resolution {
    let Value::String(text) = raw else {
        return Resolution::Literal(value_text(raw));
    };

    if let Some(path) = parse_reference(text) {
        return resolve_path(&path, dictionary);
    }

    Resolution::Literal(substitute_in_str(text, dictionary))
}

/// Replace every reference in every string of `value` with its `var(--name)` form
pub fn substitute_references(value: &Value, dictionary: &Dictionary) -> Value {
    match value {
        Value::String(s) => Value::String(substitute_in_str(s, dictionary)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| substitute_references(v, dictionary))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_references(v, dictionary)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn substitute_in_str(text: &str, dictionary: &Dictionary) -> String {
    EMBEDDED_REFERENCE
        .replace_all(text, |captures: &regex::Captures<'_>| {
            resolve_path(&TokenPath::parse(&captures[1]), dictionary).css()
        })
        .into_owned()
}
