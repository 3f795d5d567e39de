//! Domain models for demand resolution.

mod demand;
mod reference;
mod resolution;

pub use demand::*;
pub use reference::*;
pub use resolution::*;
