//! @dose
//! purpose: Value transforms that turn raw token values into CSS text. Each transform is a
//!     predicate over the token plus a pure mapping over its value; the standard chain
//!     covers dimensions, durations, colors, fonts and the composite CSS types.
//!
//! when-editing:
//!     - !Order matters: dimension/unitless must run before dimension/css
//!     - !Mappings must be pure: same value + units in, same value out
//!     - Composite transforms accept sub-values that are already `var(--x)` strings
//!
//! invariants:
//!     - A transform that cannot interpret a value returns it unchanged
//!
//! gotchas:
//!     - px values become rem only when output_unit is "rem"; other units pass through
//!     - Numbers are rounded to 4 decimals so 14/16 prints as 0.875, not 0.8750000001

use crate::types::{value_text, Token};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Unit conversion settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    pub output_unit: String,
    pub base_px_font_size: f64,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            output_unit: "rem".to_string(),
            base_px_font_size: 16.0,
        }
    }
}

/// A named value transform
pub trait ValueTransform: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this transform handles `token`
    fn applies_to(&self, token: &Token) -> bool;

    fn transform(&self, value: Value, units: &UnitConfig) -> Value;
}

/// Transform built from two plain functions
pub struct FnTransform {
    name: &'static str,
    filter: fn(&Token) -> bool,
    map: fn(Value, &UnitConfig) -> Value,
}

impl FnTransform {
    pub const fn new(
        name: &'static str,
        filter: fn(&Token) -> bool,
        map: fn(Value, &UnitConfig) -> Value,
    ) -> Self {
        Self { name, filter, map }
    }
}

impl ValueTransform for FnTransform {
    fn name(&self) -> &str {
        self.name
    }

    fn applies_to(&self, token: &Token) -> bool {
        (self.filter)(token)
    }

    fn transform(&self, value: Value, units: &UnitConfig) -> Value {
        (self.map)(value, units)
    }
}

/// The standard CSS chain, in application order
pub fn standard_transforms() -> Vec<Arc<dyn ValueTransform>> {
    vec![
        Arc::new(FnTransform::new(
            "dimension/unitless",
            |t| t.is_type("dimension") && t.is_unitless(),
            unitless,
        )),
        Arc::new(FnTransform::new(
            "dimension/css",
            |t| t.is_type("dimension"),
            |v, u| text_or(dimension_text(&v, u), v),
        )),
        Arc::new(FnTransform::new(
            "duration/css",
            |t| t.is_type("duration"),
            |v, _| text_or(duration_text(&v), v),
        )),
        Arc::new(FnTransform::new(
            "color/css",
            |t| t.is_type("color"),
            |v, _| text_or(color_text(&v), v),
        )),
        Arc::new(FnTransform::new(
            "fontFamily/css",
            |t| t.is_type("fontFamily"),
            |v, _| text_or(font_family_text(&v), v),
        )),
        Arc::new(FnTransform::new(
            "fontWeight/css",
            |t| t.is_type("fontWeight"),
            |v, _| text_or(font_weight_text(&v), v),
        )),
        Arc::new(FnTransform::new(
            "cubicBezier/css",
            |t| t.is_type("cubicBezier"),
            |v, _| text_or(cubic_bezier_text(&v), v),
        )),
        Arc::new(FnTransform::new(
            "shadow/css",
            |t| t.is_type("shadow"),
            |v, u| text_or(shadow_text(&v, u), v),
        )),
        Arc::new(FnTransform::new(
            "border/css",
            |t| t.is_type("border"),
            |v, u| text_or(border_text(&v, u), v),
        )),
        Arc::new(FnTransform::new(
            "strokeStyle/css",
            |t| t.is_type("strokeStyle"),
            |v, _| text_or(stroke_style_text(&v), v),
        )),
        Arc::new(FnTransform::new(
            "transition/css",
            |t| t.is_type("transition"),
            |v, _| text_or(transition_text(&v), v),
        )),
        Arc::new(FnTransform::new(
            "typography/css",
            |t| t.is_type("typography"),
            |v, u| text_or(typography_text(&v, u), v),
        )),
        Arc::new(FnTransform::new(
            "gradient/css",
            |t| t.is_type("gradient"),
            |v, _| text_or(gradient_text(&v), v),
        )),
    ]
}

fn text_or(text: Option<String>, original: Value) -> Value {
    match text {
        Some(text) => Value::String(text),
        None => original,
    }
}

fn unitless(value: Value, _units: &UnitConfig) -> Value {
    if let Some(inner) = value.as_object().and_then(|m| m.get("value")) {
        return Value::String(value_text(inner));
    }
    if value.is_object() {
        return value;
    }
    Value::String(value_text(&value))
}

/// Format a number without trailing zeros
pub fn format_number(n: f64) -> String {
    let rounded = (n * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{}", rounded)
}

fn convert_length(n: f64, unit: &str, units: &UnitConfig) -> String {
    if unit == "px" && units.output_unit == "rem" && units.base_px_font_size > 0.0 {
        format!("{}rem", format_number(n / units.base_px_font_size))
    } else {
        format!("{}{}", format_number(n), unit)
    }
}

fn dimension_text(value: &Value, units: &UnitConfig) -> Option<String> {
    match value {
        Value::Object(map) => {
            let inner = map.get("value")?;
            let unit = map.get("unit").and_then(Value::as_str).unwrap_or("px");
            match inner.as_f64() {
                Some(n) => Some(convert_length(n, unit, units)),
                None => Some(format!("{}{}", value_text(inner), unit)),
            }
        }
        Value::Number(n) => Some(convert_length(n.as_f64()?, "px", units)),
        Value::String(s) => {
            let px = s
                .trim()
                .strip_suffix("px")
                .and_then(|n| n.trim().parse::<f64>().ok());
            match px {
                Some(n) => Some(convert_length(n, "px", units)),
                None => Some(s.clone()),
            }
        }
        _ => None,
    }
}

fn duration_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            let inner = map.get("value")?;
            let unit = map.get("unit").and_then(Value::as_str).unwrap_or("ms");
            Some(format!("{}{}", value_text(inner), unit))
        }
        Value::Number(n) => Some(format!("{}ms", format_number(n.as_f64()?))),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn color_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            if let Some(hex) = map.get("hex").and_then(Value::as_str) {
                return Some(hex.to_string());
            }
            let components = map.get("components")?.as_array()?;
            let channels: Vec<String> = components
                .iter()
                .map(|c| match c.as_f64() {
                    Some(n) => format_number((n * 255.0).round()),
                    None => value_text(c),
                })
                .collect();
            match map.get("alpha").and_then(Value::as_f64) {
                Some(alpha) if alpha < 1.0 => Some(format!(
                    "rgb({} / {})",
                    channels.join(" "),
                    format_number(alpha)
                )),
                _ => Some(format!("rgb({})", channels.join(" "))),
            }
        }
        _ => None,
    }
}

fn quote_family(name: &str) -> String {
    let name = name.trim();
    let needs_quotes = name.contains(' ')
        && !name.starts_with('"')
        && !name.starts_with('\'')
        && !name.starts_with("var(");
    if needs_quotes {
        format!("'{}'", name)
    } else {
        name.to_string()
    }
}

fn font_family_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| quote_family(&value_text(v)))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::String(s) => Some(
            s.split(',')
                .map(quote_family)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

fn font_weight_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => {
            let weight = match s.trim().to_ascii_lowercase().as_str() {
                "thin" | "hairline" => "100",
                "extra-light" | "ultra-light" => "200",
                "light" => "300",
                "normal" | "regular" | "book" => "400",
                "medium" => "500",
                "semi-bold" | "demi-bold" => "600",
                "bold" => "700",
                "extra-bold" | "ultra-bold" => "800",
                "black" | "heavy" => "900",
                "extra-black" | "ultra-black" => "950",
                _ => return Some(s.clone()),
            };
            Some(weight.to_string())
        }
        _ => None,
    }
}

fn cubic_bezier_text(value: &Value) -> Option<String> {
    let points = value.as_array()?;
    if points.len() != 4 {
        return None;
    }
    let points: Vec<String> = points.iter().map(value_text).collect();
    Some(format!("cubic-bezier({})", points.join(", ")))
}

fn part(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).map(value_text)
}

fn length_part(map: &Map<String, Value>, key: &str, units: &UnitConfig) -> Option<String> {
    let value = map.get(key)?;
    dimension_text(value, units).or_else(|| Some(value_text(value)))
}

fn color_part(map: &Map<String, Value>, key: &str) -> Option<String> {
    let value = map.get(key)?;
    color_text(value).or_else(|| Some(value_text(value)))
}

fn single_shadow(value: &Value, units: &UnitConfig) -> Option<String> {
    let map = value.as_object()?;
    let mut parts = Vec::new();
    if map.get("inset").and_then(Value::as_bool) == Some(true) {
        parts.push("inset".to_string());
    }
    for key in ["offsetX", "offsetY", "blur", "spread"] {
        if let Some(p) = length_part(map, key, units) {
            parts.push(p);
        }
    }
    if let Some(color) = color_part(map, "color") {
        parts.push(color);
    }
    Some(parts.join(" "))
}

fn shadow_text(value: &Value, units: &UnitConfig) -> Option<String> {
    match value {
        Value::Array(layers) => {
            let layers: Option<Vec<String>> =
                layers.iter().map(|l| single_shadow(l, units)).collect();
            Some(layers?.join(", "))
        }
        Value::Object(_) => single_shadow(value, units),
        _ => None,
    }
}

fn border_text(value: &Value, units: &UnitConfig) -> Option<String> {
    let map = value.as_object()?;
    let width = length_part(map, "width", units);
    let style = map.get("style").and_then(stroke_style_text);
    let color = color_part(map, "color");
    let parts: Vec<String> = [width, style, color].into_iter().flatten().collect();
    Some(parts.join(" "))
}

fn stroke_style_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        // Object stroke styles (dash arrays) have no single-keyword form
        Value::Object(_) => Some("dashed".to_string()),
        _ => None,
    }
}

fn transition_text(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    let duration = map.get("duration").and_then(duration_text);
    let timing = map.get("timingFunction").and_then(|v| match v {
        Value::Array(_) => cubic_bezier_text(v),
        other => Some(value_text(other)),
    });
    let delay = map.get("delay").and_then(duration_text);
    let parts: Vec<String> = [duration, timing, delay].into_iter().flatten().collect();
    Some(parts.join(" "))
}

fn typography_text(value: &Value, units: &UnitConfig) -> Option<String> {
    let map = value.as_object()?;
    let style = part(map, "fontStyle");
    let weight = map.get("fontWeight").and_then(font_weight_text);
    let size = length_part(map, "fontSize", units);
    let line_height = map.get("lineHeight").map(|v| match v {
        Value::Object(_) => dimension_text(v, units).unwrap_or_else(|| value_text(v)),
        other => value_text(other),
    });
    let family = map.get("fontFamily").and_then(font_family_text);

    let size = match (size, line_height) {
        (Some(size), Some(lh)) => Some(format!("{}/{}", size, lh)),
        (size, _) => size,
    };

    let parts: Vec<String> = [style, weight, size, family].into_iter().flatten().collect();
    Some(parts.join(" "))
}

fn gradient_text(value: &Value) -> Option<String> {
    let stops = value.as_array()?;
    let stops: Vec<String> = stops
        .iter()
        .map(|stop| {
            let Some(map) = stop.as_object() else {
                return value_text(stop);
            };
            let color = color_part(map, "color").unwrap_or_default();
            match map.get("position") {
                Some(Value::Number(n)) => {
                    let pct = n.as_f64().unwrap_or_default() * 100.0;
                    format!("{} {}%", color, format_number(pct))
                }
                Some(other) => format!("{} {}", color, value_text(other)),
                None => color,
            }
        })
        .collect();
    Some(stops.join(", "))
}
