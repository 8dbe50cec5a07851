//! Cross-cutting pieces: constants, configuration and the error taxonomy.

pub mod config;
pub mod constants;
pub mod error;

pub use config::*;
pub use constants::*;
pub use error::*;
