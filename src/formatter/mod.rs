mod css;
mod mixins;

pub use css::CssVariables;
pub use mixins::{css_property, TypographyMixins, TYPOGRAPHY_PROPERTIES};
