//! Delve - terminal turn-based dungeon RPG library
//!
//! This module exposes the game core for testing and for the binary.

pub mod build_info;
pub mod combat;
pub mod core;
pub mod entity;
pub mod items;
pub mod persistence;
pub mod utils;
pub mod world;

// UI module is not exposed as it's tightly coupled to the terminal
