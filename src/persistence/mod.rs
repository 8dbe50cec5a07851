//! Save slots on disk: versioned JSON records, atomic writes and rotating
//! backups.

pub mod record;
pub mod save_manager;

pub use record::*;
pub use save_manager::*;
