//! CLI argument structs for all commands.

use clap::Parser;
use std::path::PathBuf;

use super::types::{CategoryArg, ClassificationArg, SeverityArg};
use super::validators::{
    validate_app_key, validate_target, validate_terminal_status, validate_title,
};

/// Arguments for the `init` command.
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Default app key for this workspace (e.g. "edcore")
    #[arg(short, long, value_parser = validate_app_key)]
    pub app: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `create` command.
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// Issue title (maximum 200 characters)
    #[arg(value_parser = validate_title)]
    pub title: String,

    /// App the issue is reported against (defaults to the workspace app)
    #[arg(short, long, value_parser = validate_app_key)]
    pub app: Option<String>,

    /// Reported severity
    #[arg(short, long, value_enum, default_value = "s3")]
    pub severity: SeverityArg,

    /// Category
    #[arg(short = 'c', long, value_enum, default_value = "unknown")]
    pub category: CategoryArg,

    /// Detailed description
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// Reporting user id
    #[arg(short, long)]
    pub reporter: Option<String>,

    /// Skip display identifier allocation (the record becomes a backfill
    /// target; mirrors legacy creation paths)
    #[arg(long)]
    pub no_display_id: bool,
}

/// Arguments for the `list` command.
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Filter by app
    #[arg(short, long, value_parser = validate_app_key)]
    pub app: Option<String>,

    /// Filter by severity
    #[arg(short, long, value_enum)]
    pub severity: Option<SeverityArg>,

    /// Filter by exact status
    #[arg(long)]
    pub status: Option<String>,

    /// Maximum number of issues to display
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,
}

/// Arguments for the `show` command.
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Display id (EC-42) or document key
    #[arg(value_parser = validate_target)]
    pub target: String,
}

/// Arguments for the `update` command.
#[derive(Parser, Debug, Clone)]
pub struct UpdateArgs {
    /// Display id (EC-42) or document key
    #[arg(value_parser = validate_target)]
    pub target: String,

    /// New title (maximum 200 characters)
    #[arg(long, value_parser = validate_title)]
    pub title: Option<String>,

    /// New description
    #[arg(short = 'D', long)]
    pub description: Option<String>,

    /// New severity
    #[arg(short, long, value_enum)]
    pub severity: Option<SeverityArg>,

    /// New status (free-form)
    #[arg(long)]
    pub status: Option<String>,

    /// New category
    #[arg(short = 'c', long, value_enum)]
    pub category: Option<CategoryArg>,

    /// Explicit triage classification
    #[arg(long, value_enum)]
    pub classification: Option<ClassificationArg>,
}

/// Arguments for the `note` command.
#[derive(Parser, Debug, Clone)]
pub struct NoteArgs {
    /// Display id (EC-42) or document key
    #[arg(value_parser = validate_target)]
    pub target: String,

    /// The note body
    pub body: String,
}

/// Arguments for the `close` command.
#[derive(Parser, Debug, Clone)]
pub struct CloseArgs {
    /// Display id (EC-42) or document key
    #[arg(value_parser = validate_target)]
    pub target: String,

    /// Terminal status to apply
    #[arg(short, long, default_value = "closed", value_parser = validate_terminal_status)]
    pub status: String,
}

/// Arguments for the `delete` command.
#[derive(Parser, Debug, Clone)]
pub struct DeleteArgs {
    /// Display id (EC-42) or document key
    #[arg(value_parser = validate_target)]
    pub target: String,

    /// Restore a soft-deleted issue instead
    #[arg(long)]
    pub restore: bool,
}

/// Arguments for the `report` command.
#[derive(Parser, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Restrict the report to one app
    #[arg(short, long, value_parser = validate_app_key)]
    pub app: Option<String>,
}

/// Arguments for the `repair` command.
#[derive(Parser, Debug, Clone, Default)]
pub struct RepairArgs {
    /// Print the plan without committing any writes
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `backfill` command.
#[derive(Parser, Debug, Clone, Default)]
pub struct BackfillArgs {
    /// Print the plan without committing any writes
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `import` command.
#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// File of rows to import: a JSON array or one JSON object per line
    pub file: PathBuf,

    /// App the rows are imported into (defaults to the workspace app)
    #[arg(short, long, value_parser = validate_app_key)]
    pub app: Option<String>,
}

/// Arguments for the `info` command.
#[derive(Parser, Debug, Clone, Default)]
pub struct InfoArgs {}
