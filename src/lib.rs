//! Streetlevel application library
//!
//! Configuration and per-frame systems shared by the binary and its tests.

pub mod config;
pub mod systems;
