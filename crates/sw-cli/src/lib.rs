//! Stopwatch CLI library.
//!
//! This crate provides the command-line adapter over the storage engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, GroupAction, SliceAction, TaskAction};
pub use config::{Config, ConfigError};
