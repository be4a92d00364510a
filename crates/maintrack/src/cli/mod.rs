//! Command-line interface for maintrack.
//!
//! This module provides the CLI structure and command handlers for the
//! `mtrack` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AssetCommand, CreateReportCommand, ExportFormat, PriorityArg, ProblemTypeCommand,
    ReportCommand, StatusArg, UpdateReportCommand, UserCommand,
};

/// mtrack - Track maintenance reports against an asset hierarchy
///
/// Records problem reports filed against physical assets, chains
/// follow-up reports together, and moves report batches in and out as
/// CSV.
#[derive(Debug, Parser)]
#[command(name = "mtrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Act as this user
    #[arg(short, long, global = true, value_name = "USERNAME")]
    pub user: Option<String>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage assets
    #[command(subcommand)]
    Asset(AssetCommand),

    /// Manage problem types
    #[command(subcommand, name = "problem-type")]
    ProblemType(ProblemTypeCommand),

    /// Manage reports
    #[command(subcommand)]
    Report(ReportCommand),

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
