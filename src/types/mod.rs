mod manifest;
mod token;

pub use manifest::*;
pub use token::*;
