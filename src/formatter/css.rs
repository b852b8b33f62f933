//! @dose
//! purpose: The `css/variables` format. Renders the selected tokens as custom-property
//!     declarations inside one selector-scoped block, keeping references as `var(--x)`.
//!
//! when-editing:
//!     - !Every emitted token's references are checked first; a miss or a cycle fails the
//!       whole target
//!     - The block carries no header; the composer writes one header for the whole file
//!
//! invariants:
//!     - One declaration per selected token, in dictionary order
//!     - A token whose value is a whole reference is emitted as var(--target) untransformed
//!
//! gotchas:
//!     - References are resolved against the full dictionary, so a mode block can point at
//!       base tokens it does not itself emit

use crate::engine::{EngineError, Format, FormatContext, FormatOutput};
use crate::reference::{parse_reference, resolve_path, substitute_references};
use crate::types::{value_text, Token};
use serde_json::Value;

pub struct CssVariables;

impl CssVariables {
    pub const NAME: &'static str = "css/variables";
}

impl Format for CssVariables {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn render(&self, ctx: &FormatContext<'_>) -> Result<FormatOutput, EngineError> {
        let mut declarations = Vec::with_capacity(ctx.tokens.len());

        for token in &ctx.tokens {
            ctx.dictionary.check_references(token)?;
            declarations.push(format!("  --{}: {};", token.name(), css_value(token, ctx)));
        }

        let mut text = format!("{} {{\n", ctx.options.selector);
        for line in &declarations {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str("}\n");

        Ok(FormatOutput {
            text,
            emitted: declarations.len(),
            warnings: Vec::new(),
        })
    }
}

fn css_value(token: &Token, ctx: &FormatContext<'_>) -> String {
    if let Value::String(raw) = &token.value {
        if let Some(path) = parse_reference(raw) {
            return resolve_path(&path, ctx.dictionary).css();
        }
    }

    let substituted = substitute_references(&token.value, ctx.dictionary);
    value_text(&ctx.platform.transform(token, substituted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        Dictionary, Engine, FileSpec, FormatOptions, Platform, TokenFilter, UnitConfig,
    };
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    fn spec(selector: &str, filter: TokenFilter) -> FileSpec {
        FileSpec {
            format: Arc::new(CssVariables),
            filter,
            options: FormatOptions {
                selector: selector.to_string(),
                header: String::new(),
            },
        }
    }

    fn dictionary(sources: &[(&str, &str)]) -> Dictionary {
        let mut dict = Dictionary::new();
        for (file, content) in sources {
            dict.add_source(Path::new(file), content).unwrap();
        }
        dict
    }

    fn engine() -> Engine {
        Engine::new(Platform::standard(UnitConfig::default()))
    }

    #[test]
    fn test_renders_block_with_transforms() {
        let dict = dictionary(&[(
            "base.json",
            r##"{
                "spacing": {"$type": "dimension", "sm": {"$value": "4px"}},
                "color": {"$type": "color", "primary": {"$value": "#111"}}
            }"##,
        )]);

        let output = engine().render(&dict, &spec(":root", TokenFilter::All)).unwrap();
        assert_eq!(
            output.text,
            ":root {\n  --spacing-sm: 0.25rem;\n  --color-primary: #111;\n}\n"
        );
        assert_eq!(output.emitted, 2);
    }

    #[test]
    fn test_whole_reference_emits_var() {
        let dict = dictionary(&[(
            "base.json",
            r##"{
                "base": {"blue": {"$type": "color", "$value": "#00f"}},
                "color": {"link": {"$type": "color", "$value": "{base.blue}"}}
            }"##,
        )]);

        let output = engine().render(&dict, &spec(":root", TokenFilter::All)).unwrap();
        assert!(output.text.contains("  --color-link: var(--base-blue);\n"));
    }

    #[test]
    fn test_composite_with_reference() {
        let dict = dictionary(&[(
            "base.json",
            r##"{
                "color": {"border": {"$type": "color", "$value": "#ccc"}},
                "border": {"default": {"$type": "border", "$value": {
                    "color": "{color.border}", "width": "1px", "style": "solid"
                }}}
            }"##,
        )]);

        let output = engine().render(&dict, &spec(":root", TokenFilter::All)).unwrap();
        assert!(output
            .text
            .contains("  --border-default: 0.0625rem solid var(--color-border);\n"));
    }

    #[test]
    fn test_filter_emits_only_mode_tokens_but_resolves_against_all() {
        let dict = dictionary(&[
            ("base.json", r##"{"base": {"black": {"$type": "color", "$value": "#000"}}}"##),
            ("dark.json", r#"{"color": {"bg": {"$type": "color", "$value": "{base.black}"}}}"#),
        ]);

        let filter = TokenFilter::FromFiles(vec![PathBuf::from("dark.json")]);
        let output = engine()
            .render(&dict, &spec("[data-color-mode='dark']", filter))
            .unwrap();
        assert_eq!(
            output.text,
            "[data-color-mode='dark'] {\n  --color-bg: var(--base-black);\n}\n"
        );
    }

    #[test]
    fn test_broken_reference_fails() {
        let dict = dictionary(&[(
            "a.json",
            r#"{"color": {"bg": {"$type": "color", "$value": "{base.black}"}}}"#,
        )]);
        let err = engine()
            .render(&dict, &spec(":root", TokenFilter::All))
            .unwrap_err();
        assert!(matches!(err, EngineError::BrokenReference { .. }));
    }

    #[test]
    fn test_empty_selection_renders_empty_block() {
        let dict = dictionary(&[("a.json", r#"{"x": {"$value": 1}}"#)]);
        let output = engine()
            .render(&dict, &spec(".none", TokenFilter::FromFiles(Vec::new())))
            .unwrap();
        assert_eq!(output.text, ".none {\n}\n");
        assert_eq!(output.emitted, 0);
    }
}
