//! Entity model: actors, their inventories and their status effects.

pub mod effects;
pub mod inventory;
pub mod roster;
pub mod types;

pub use effects::*;
pub use inventory::*;
pub use roster::*;
pub use types::*;
