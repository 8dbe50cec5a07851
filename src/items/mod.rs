//! Items: weapons, armor and consumables, plus their generation tables.

pub mod generation;
pub mod types;

pub use generation::*;
pub use types::*;
