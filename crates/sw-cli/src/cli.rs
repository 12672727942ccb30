//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Personal stopwatch time tracker.
///
/// Organize work into groups and tasks, start and stop tasks to record
/// time, and report usage per cost code.
#[derive(Debug, Parser)]
#[command(name = "sw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage groups.
    #[command(subcommand)]
    Group(GroupAction),

    /// Manage tasks.
    #[command(subcommand)]
    Task(TaskAction),

    /// Start a task and make it the active task.
    ///
    /// A different running active task is stopped first.
    Start {
        /// Group ID.
        group: i64,
        /// Task ID.
        task: i64,
    },

    /// Stop a task. Defaults to the active task.
    Stop {
        /// Group ID.
        group: Option<i64>,
        /// Task ID.
        task: Option<i64>,
    },

    /// Show or clear the active task.
    Active {
        /// Clear the active-task marker.
        #[arg(long)]
        clear: bool,
    },

    /// List and edit recorded time slices.
    #[command(subcommand)]
    Slices(SliceAction),

    /// Show recently started tasks.
    History,

    /// Report usage per date and cost code for a group.
    Report {
        /// Group ID.
        #[arg(long)]
        group: i64,

        /// First date (YYYY-MM-DD). Defaults to six days before the last date.
        #[arg(long)]
        start: Option<String>,

        /// Last date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Use UTC calendar dates instead of local time.
        #[arg(long)]
        utc: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Group subcommands.
#[derive(Debug, Subcommand)]
pub enum GroupAction {
    /// Add a group.
    Add {
        /// Group name.
        name: String,
    },
    /// List groups.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Rename a group.
    Rename {
        /// Group ID.
        id: i64,
        /// New name.
        name: String,
    },
}

/// Task subcommands.
#[derive(Debug, Subcommand)]
pub enum TaskAction {
    /// Add a task to a group.
    Add {
        /// Group ID.
        group: i64,
        /// Task name.
        name: String,
        /// Cost code used to bucket the task in reports.
        #[arg(long, default_value = "")]
        cost_code: String,
    },
    /// List a group's tasks.
    List {
        /// Group ID.
        group: i64,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show one task.
    Show {
        /// Group ID.
        group: i64,
        /// Task ID.
        task: i64,
    },
    /// Change a task's name or cost code.
    Update {
        /// Group ID.
        group: i64,
        /// Task ID.
        task: i64,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New cost code.
        #[arg(long)]
        cost_code: Option<String>,
    },
}

/// Slice subcommands.
#[derive(Debug, Subcommand)]
pub enum SliceAction {
    /// List slices starting in a time window.
    List {
        /// Group ID.
        group: i64,
        /// Task ID.
        task: i64,
        /// Window start (ISO 8601 or relative like '2 days ago'). Defaults to 7 days ago.
        #[arg(long)]
        start: Option<String>,
        /// Window end (exclusive). Defaults to one day from now.
        #[arg(long)]
        end: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Record or overwrite the slice starting at START.
    Set {
        /// Group ID.
        group: i64,
        /// Task ID.
        task: i64,
        /// Slice start.
        start: String,
        /// Slice end.
        end: String,
    },
    /// Remove the slice starting at START.
    Remove {
        /// Group ID.
        group: i64,
        /// Task ID.
        task: i64,
        /// Slice start.
        start: String,
    },
}
