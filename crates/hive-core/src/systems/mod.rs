//! Systems - logic that operates on components

mod logistics;
mod population;
mod spawning;
mod upkeep;

pub use logistics::*;
pub use population::*;
pub use spawning::*;
pub use upkeep::*;
