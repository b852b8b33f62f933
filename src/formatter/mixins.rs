//! @dose
//! purpose: The `scss/typography-mixins` format. Emits one `@mixin` per composite
//!     typography token, mapping each sub-property to a CSS property whose value is the
//!     resolved reference or literal.
//!
//! when-editing:
//!     - !TYPOGRAPHY_PROPERTIES is the only source of sub-property names; unknown keys are
//!       skipped with a warning, never fatal
//!     - !Reference misses fall back to the syntactic name with a warning; the mixin pass
//!       runs on base files only, so mode tokens are routinely absent
//!
//! invariants:
//!     - Mixins come out in token enumeration order; declarations in record key order
//!     - A token whose raw value is not a record yields exactly one placeholder comment
//!
//! do-not:
//!     - Never abort the batch for one bad token

use crate::engine::{EngineError, Format, FormatContext, FormatOutput};
use crate::reference::{resolve, Resolution};
use crate::types::Token;
use tracing::warn;

/// Typography sub-property -> CSS property
pub const TYPOGRAPHY_PROPERTIES: &[(&str, &str)] = &[
    ("fontFamily", "font-family"),
    ("fontWeight", "font-weight"),
    ("fontSize", "font-size"),
    ("lineHeight", "line-height"),
    ("letterSpacing", "letter-spacing"),
    ("fontStyle", "font-style"),
    ("textDecoration", "text-decoration"),
    ("textTransform", "text-transform"),
];

pub fn css_property(key: &str) -> Option<&'static str> {
    TYPOGRAPHY_PROPERTIES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, css)| *css)
}

pub struct TypographyMixins;

impl TypographyMixins {
    pub const NAME: &'static str = "scss/typography-mixins";
}

impl Format for TypographyMixins {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn render(&self, ctx: &FormatContext<'_>) -> Result<FormatOutput, EngineError> {
        let mut warnings = Vec::new();
        let mut emitted = 0;

        let mixins: Vec<String> = ctx
            .tokens
            .iter()
            .map(|token| match build_mixin(token, ctx, &mut warnings) {
                Some(mixin) => {
                    emitted += 1;
                    mixin
                }
                None => placeholder(token, &mut warnings),
            })
            .collect();

        let mut text = format!("// {}\n\n", ctx.options.header);
        text.push_str(&mixins.join("\n\n"));
        text.push('\n');

        Ok(FormatOutput {
            text,
            emitted,
            warnings,
        })
    }
}

fn record(warnings: &mut Vec<String>, message: String) {
    warn!("{}", message);
    warnings.push(message);
}

fn placeholder(token: &Token, warnings: &mut Vec<String>) -> String {
    let name = token.name();
    record(
        warnings,
        format!(
            "Skipping mixin \"{}\": expected a record value, got {}",
            name,
            kind_of(&token.value)
        ),
    );
    format!("// Warning: could not generate mixin for {}", name)
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "record",
    }
}

/// None when the raw value is not a record
fn build_mixin(
    token: &Token,
    ctx: &FormatContext<'_>,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let record_value = token.value.as_object()?;
    let name = token.name();

    let mut declarations = Vec::with_capacity(record_value.len());
    for (key, raw) in record_value {
        let Some(property) = css_property(key) else {
            record(
                warnings,
                format!("Unknown typography property \"{}\" in {}", key, name),
            );
            continue;
        };

        let resolution = resolve(raw, ctx.dictionary);
        if let Resolution::Syntactic(fallback) = &resolution {
            record(
                warnings,
                format!(
                    "Could not resolve reference for {}.{}: {} is not loaded, using --{}",
                    name,
                    key,
                    crate::types::value_text(raw),
                    fallback
                ),
            );
        }
        declarations.push(format!("  {}: {};", property, resolution.css()));
    }

    let mut mixin = format!("@mixin {} {{\n", name);
    for line in &declarations {
        mixin.push_str(line);
        mixin.push('\n');
    }
    mixin.push('}');
    Some(mixin)
}
