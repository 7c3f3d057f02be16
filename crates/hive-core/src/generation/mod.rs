//! Generation - procedural creation of demo colonies

mod colony;

pub use colony::*;
