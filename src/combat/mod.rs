//! Turn-based combat: the session state machine and the AI policies that
//! drive non-player turns.

pub mod logic;
pub mod policy;
pub mod types;

pub use logic::*;
pub use policy::*;
pub use types::*;
