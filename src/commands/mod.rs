mod build;
mod check;
mod watch;

pub use build::*;
pub use check::*;
pub use watch::*;
