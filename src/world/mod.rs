//! The exploration layer: world state, generation, town shops, encounters
//! and the game loop that ties combat and persistence together.

pub mod encounter;
pub mod game_loop;
pub mod generation;
pub mod names;
pub mod shops;
pub mod types;

pub use encounter::*;
pub use game_loop::*;
pub use generation::*;
pub use names::*;
pub use shops::*;
pub use types::*;
