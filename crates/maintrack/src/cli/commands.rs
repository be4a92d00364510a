//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::{Priority, Status};

/// Asset management commands.
#[derive(Debug, Subcommand)]
pub enum AssetCommand {
    /// Create an asset
    Create {
        /// Asset name
        name: String,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,

        /// Id of the parent asset
        #[arg(short, long)]
        parent: Option<i64>,

        /// Priority level
        #[arg(long, value_enum, default_value = "med")]
        priority: PriorityArg,
    },

    /// List all assets
    List,

    /// Show a single asset
    Show {
        /// Asset id
        id: i64,
    },

    /// Update an asset
    Update {
        /// Asset id
        id: i64,

        /// New name
        name: String,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,

        /// Id of the parent asset
        #[arg(short, long)]
        parent: Option<i64>,

        /// Priority level
        #[arg(long, value_enum, default_value = "med")]
        priority: PriorityArg,
    },
}

/// Problem type management commands.
#[derive(Debug, Subcommand)]
pub enum ProblemTypeCommand {
    /// Create a problem type
    Create {
        /// Label text
        name: String,
    },

    /// List all problem types
    List,

    /// Rename a problem type
    Update {
        /// Problem type id
        id: i64,

        /// New label text
        name: String,
    },
}

/// Report management commands.
#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// File a new report against an asset
    Create(CreateReportCommand),

    /// List all reports, newest first
    List,

    /// Show a single report with its labelled fields
    Show {
        /// Report id
        id: i64,
    },

    /// Update a report's mutable fields
    Update(UpdateReportCommand),

    /// Export a report and its follow-up chain
    Export {
        /// Report id
        id: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a CSV batch of reports
    Import {
        /// Path to the CSV file
        file: PathBuf,
    },
}

/// Arguments for creating a report.
#[derive(Debug, Args)]
pub struct CreateReportCommand {
    /// Id of the asset the report is filed against
    pub asset: i64,

    /// Description of the problem
    #[arg(short = 'd', long)]
    pub description: String,

    /// External work-order reference
    #[arg(short, long)]
    pub work_order: Option<String>,

    /// Priority of the reported problem
    #[arg(long, value_enum, default_value = "med")]
    pub priority: PriorityArg,

    /// Id of the problem type
    #[arg(short = 't', long)]
    pub problem_type: Option<i64>,

    /// Suggested remediation
    #[arg(short, long)]
    pub recommended_action: Option<String>,

    /// Id of the report this one follows up
    #[arg(long)]
    pub previous: Option<i64>,
}

/// Arguments for updating a report.
#[derive(Debug, Args)]
pub struct UpdateReportCommand {
    /// Report id
    pub id: i64,

    /// Id of the asset the report is filed against
    #[arg(short, long)]
    pub asset: Option<i64>,

    /// Description of the problem
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// External work-order reference
    #[arg(short, long)]
    pub work_order: Option<String>,

    /// Priority of the reported problem
    #[arg(long, value_enum)]
    pub priority: Option<PriorityArg>,

    /// Id of the problem type
    #[arg(short = 't', long)]
    pub problem_type: Option<i64>,

    /// Suggested remediation
    #[arg(short, long)]
    pub recommended_action: Option<String>,

    /// Lifecycle status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Id of the report this one follows up
    #[arg(long)]
    pub previous: Option<i64>,
}

/// User management commands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Add a user
    Add {
        /// Username
        username: String,

        /// Role to grant (repeatable)
        #[arg(short, long)]
        role: Vec<String>,

        /// Permission to grant (repeatable)
        #[arg(short, long)]
        permission: Vec<String>,
    },
}

/// Priority argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    /// Highest urgency
    High,
    /// Between high and medium
    MedHi,
    /// Default urgency
    Med,
    /// Lowest urgency
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::High => Self::High,
            PriorityArg::MedHi => Self::MedHigh,
            PriorityArg::Med => Self::Med,
            PriorityArg::Low => Self::Low,
        }
    }
}

/// Status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Newly filed
    New,
    /// Work underway
    InProgress,
    /// Work complete
    Resolved,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::New => Self::New,
            StatusArg::InProgress => Self::InProgress,
            StatusArg::Resolved => Self::Resolved,
        }
    }
}

/// Export format for report chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// Spreadsheet rows, oldest report first
    #[default]
    Csv,
    /// Indented document outline, newest report first
    Outline,
    /// Labelled fields for a single report
    Fields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_arg_conversion() {
        assert_eq!(Priority::from(PriorityArg::High), Priority::High);
        assert_eq!(Priority::from(PriorityArg::MedHi), Priority::MedHigh);
        assert_eq!(Priority::from(PriorityArg::Med), Priority::Med);
        assert_eq!(Priority::from(PriorityArg::Low), Priority::Low);
    }

    #[test]
    fn test_status_arg_conversion() {
        assert_eq!(Status::from(StatusArg::New), Status::New);
        assert_eq!(Status::from(StatusArg::InProgress), Status::InProgress);
        assert_eq!(Status::from(StatusArg::Resolved), Status::Resolved);
    }

    #[test]
    fn test_export_format_default() {
        assert_eq!(ExportFormat::default(), ExportFormat::Csv);
    }

    #[test]
    fn test_asset_command_debug() {
        let cmd = AssetCommand::Create {
            name: "Press 4".to_string(),
            description: None,
            parent: None,
            priority: PriorityArg::Med,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Create"));
        assert!(debug_str.contains("Press 4"));
    }

    #[test]
    fn test_report_command_debug() {
        let cmd = ReportCommand::Export {
            id: 7,
            format: ExportFormat::Outline,
            output: None,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Export"));
        assert!(debug_str.contains("Outline"));
    }

    #[test]
    fn test_user_command_debug() {
        let cmd = UserCommand::Add {
            username: "alice".to_string(),
            role: vec!["MDI Team".to_string()],
            permission: vec![],
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("alice"));
    }
}
