//! CLI subcommand implementations.

pub mod groups;
pub mod history;
pub mod report;
pub mod slices;
pub mod tasks;
pub mod track;
pub mod util;
