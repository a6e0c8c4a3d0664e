//! Loom command line driver
//!
//! The `loom` binary is a thin wrapper over these commands.

pub mod commands;
pub mod config;
