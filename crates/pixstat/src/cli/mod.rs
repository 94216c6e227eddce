//! CLI command implementations.

pub mod analyze;
pub mod config;
pub mod discover;
