//! CLI argument parsing and command dispatch.
//!
//! The command-line interface for opsdeck using clap's derive API.
//!
//! # Commands
//!
//! - `init`: Initialize a new opsdeck workspace
//! - `info`: Show workspace information
//! - `create`: Report a new issue (allocates its display identifier)
//! - `list` / `show`: Browse issues
//! - `update` / `note` / `close` / `delete`: Modify issues
//! - `report`: Produce the operator triage report
//! - `repair`: Repair display identifier collisions (admin)
//! - `backfill`: Assign identifiers to records that have none (admin)
//! - `import`: Bulk import issue rows (admin)
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format
//! - `--actor`: Acting user (falls back to `OPSDECK_ACTOR`, then
//!   `anonymous`)
//!
//! # Example
//!
//! ```bash
//! opsdeck create "Scoring off by one on retakes" -s s1 -c assessment-scoring
//! opsdeck report --json
//! opsdeck repair --actor alice
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

// Re-export argument structs
pub use args::{
    BackfillArgs, CloseArgs, CreateArgs, DeleteArgs, ImportArgs, InfoArgs, InitArgs, ListArgs,
    NoteArgs, RepairArgs, ReportArgs, ShowArgs, UpdateArgs,
};

// Re-export types
pub use types::{CategoryArg, ClassificationArg, SeverityArg};

// Re-export validators for external use
pub use validators::{validate_app_key, validate_target, validate_terminal_status, validate_title};

/// Opsdeck - issue identity and triage for the operations console
///
/// Issues live in `.opsdeck/issues.jsonl`; identifiers are allocated by
/// scan, repaired on collision, and the triage report is recomputed from
/// ground truth on every run.
#[derive(Parser, Debug)]
#[command(name = "opsdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Acting user for permission checks and the audit trail
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new opsdeck workspace
    Init(InitArgs),

    /// Show workspace information
    Info(InfoArgs),

    /// Report a new issue
    ///
    /// Allocates the next display identifier for the app by scanning the
    /// collection, then writes the record.
    Create(CreateArgs),

    /// List issues with optional filters
    List(ListArgs),

    /// Show detailed information about an issue
    Show(ShowArgs),

    /// Update an existing issue
    ///
    /// Only provided fields are modified. Display identifiers are
    /// write-once and cannot be updated by this command or any other.
    Update(UpdateArgs),

    /// Append a note to an issue
    Note(NoteArgs),

    /// Close an issue with a terminal status
    Close(CloseArgs),

    /// Soft-delete an issue (or restore it with --restore)
    Delete(DeleteArgs),

    /// Produce the operator triage report
    ///
    /// Classifies the open set into Fix-Now, Fix-Next, and Parked with a
    /// justification per item and aggregate risk signals.
    Report(ReportArgs),

    /// Repair display identifier collisions (admin)
    ///
    /// The earliest-created member of each colliding group keeps its
    /// identifier; later members are reassigned in one atomic batch.
    Repair(RepairArgs),

    /// Assign identifiers to records that have none (admin)
    Backfill(BackfillArgs),

    /// Bulk import issue rows from a file (admin)
    ///
    /// Accepts up to 500 rows; identifiers are seeded once before the
    /// batch and all rows commit together or not at all.
    Import(ImportArgs),
}

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing).
    ///
    /// # Errors
    ///
    /// Returns a clap error for unparsable input.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Surfaces any command failure to the binary's error handler.
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };
        let actor = self.actor.as_deref();

        match &self.command {
            Commands::Init(args) => execute::execute_init(args).await,
            Commands::Info(args) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_info(&app, args, output_mode).await
            }
            Commands::Create(args) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_create(&mut app, args, actor, output_mode).await
            }
            Commands::List(args) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_list(&app, args, output_mode).await
            }
            Commands::Show(args) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_show(&app, args, output_mode).await
            }
            Commands::Update(args) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_update(&mut app, args, output_mode).await
            }
            Commands::Note(args) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_note(&mut app, args, actor, output_mode).await
            }
            Commands::Close(args) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_close(&mut app, args, output_mode).await
            }
            Commands::Delete(args) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_delete(&mut app, args, output_mode).await
            }
            Commands::Report(args) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_report(&app, args, output_mode).await
            }
            Commands::Repair(args) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_repair(&mut app, args, actor, output_mode).await
            }
            Commands::Backfill(args) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_backfill(&mut app, args, actor, output_mode).await
            }
            Commands::Import(args) => {
                let mut app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_import(&mut app, args, actor, output_mode).await
            }
        }
    }
}
