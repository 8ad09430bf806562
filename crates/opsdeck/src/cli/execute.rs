//! Command execution logic.

use anyhow::Result;
use serde_json::json;

use super::args::{
    BackfillArgs, CloseArgs, CreateArgs, DeleteArgs, ImportArgs, InfoArgs, InitArgs, ListArgs,
    NoteArgs, RepairArgs, ReportArgs, ShowArgs, UpdateArgs,
};
use crate::app::App;
use crate::domain::{AppKey, DocKey, Issue, IssueFilter, NewIssue, Note, UpdatePatch};
use crate::error::Error;
use crate::identity::{
    ImportRow, effective_display_id, parse_display_id, plan_backfill, plan_repair,
};
use crate::output::{self, OutputMode};
use crate::triage::{compose_report, open_issues};

/// Execute the init command.
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.app.as_deref()).await?;

    if !args.quiet {
        println!("Initialized opsdeck in {}", result.opsdeck_dir.display());
        println!("  Config:      {}", result.config_file.display());
        println!("  Issues:      {}", result.issues_file.display());
        println!("  Audit log:   {}", result.audit_file.display());
        println!("  Default app: {}", result.default_app);
    }

    Ok(())
}

/// Execute the info command.
pub async fn execute_info(app: &App, _args: &InfoArgs, output_mode: OutputMode) -> Result<()> {
    let issues = app.storage().scan_all().await?;
    let total = issues.len();
    let deleted = issues.iter().filter(|issue| issue.deleted).count();
    let open = issues.iter().filter(|issue| issue.is_open()).count();
    let terminal = total - deleted - open;
    let unassigned = issues
        .iter()
        .filter(|issue| effective_display_id(issue).is_none())
        .count();

    match output_mode {
        OutputMode::Json => {
            output::print_json(&json!({
                "opsdeck_dir": app.opsdeck_dir().display().to_string(),
                "default_app": app.default_app(),
                "issues": {
                    "total": total,
                    "open": open,
                    "terminal": terminal,
                    "deleted": deleted,
                    "missing_display_id": unassigned,
                }
            }))?;
        }
        OutputMode::Text => {
            println!("Opsdeck Workspace");
            println!("=================");
            println!();
            println!("Directory:   {}", app.opsdeck_dir().display());
            println!("Default app: {}", app.default_app());
            println!();
            println!(
                "Issues: {total} total ({open} open, {terminal} closed out, {deleted} deleted)"
            );
            if unassigned > 0 {
                println!("{unassigned} record(s) missing a display identifier; run 'opsdeck backfill'");
            }
        }
    }

    Ok(())
}

fn resolve_app(app: &App, flag: Option<&str>) -> Result<AppKey> {
    let key = flag.unwrap_or_else(|| app.default_app());
    Ok(AppKey::from_key(key)
        .ok_or_else(|| Error::InvalidArgument(format!("unknown app key '{key}'")))?)
}

/// Resolve a CLI target (display id or document key) to a document key.
async fn resolve_key(app: &App, target: &str) -> Result<DocKey> {
    if let Some(wanted) = parse_display_id(target) {
        let issues = app.storage().scan_all().await?;
        let matches: Vec<&Issue> = issues
            .iter()
            .filter(|issue| !issue.deleted && effective_display_id(issue) == Some(wanted))
            .collect();
        return match matches.len() {
            0 => Err(Error::IssueNotFound(DocKey::new(target)).into()),
            1 => Ok(matches[0].id.clone()),
            _ => Err(Error::InvalidArgument(format!(
                "display id '{target}' is ambiguous (collision present); run 'opsdeck repair'"
            ))
            .into()),
        };
    }
    Ok(DocKey::new(target))
}

/// Execute the create command.
pub async fn execute_create(
    app: &mut App,
    args: &CreateArgs,
    actor: Option<&str>,
    output_mode: OutputMode,
) -> Result<()> {
    let app_key = resolve_app(app, args.app.as_deref())?;
    let caller = app.caller(actor);

    let new_issue = NewIssue {
        app: app_key,
        title: args.title.clone(),
        description: args.description.clone().unwrap_or_default(),
        severity: args.severity.into(),
        category: args.category.into(),
        reporter: args.reporter.clone(),
        display_id: None,
    };

    let issue = if args.no_display_id {
        // The legacy path: write the record without allocating, leaving
        // it for the backfill pass.
        app.storage_mut().create(new_issue).await?
    } else {
        app.identity().create_issue(&caller, new_issue).await?
    };
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&issue)?,
        OutputMode::Text => match &issue.display_id {
            Some(display_id) => println!("Created issue: {display_id}"),
            None => println!("Created issue without identifier: {}", issue.id),
        },
    }

    Ok(())
}

/// Execute the list command.
pub async fn execute_list(app: &App, args: &ListArgs, output_mode: OutputMode) -> Result<()> {
    let filter = IssueFilter {
        app: match args.app.as_deref() {
            Some(key) => Some(resolve_app(app, Some(key))?),
            None => None,
        },
        severity: args.severity.map(Into::into),
        status: args.status.clone(),
        limit: Some(args.limit),
    };

    let issues = app.storage().list(&filter).await?;
    output::print_issues(&issues, output_mode)?;

    Ok(())
}

/// Execute the show command.
pub async fn execute_show(app: &App, args: &ShowArgs, output_mode: OutputMode) -> Result<()> {
    let key = resolve_key(app, &args.target).await?;
    let issue = app
        .storage()
        .get(&key)
        .await?
        .ok_or(Error::IssueNotFound(key))?;

    output::print_issue(&issue, output_mode)?;
    Ok(())
}

/// Execute the update command.
pub async fn execute_update(app: &mut App, args: &UpdateArgs, output_mode: OutputMode) -> Result<()> {
    let key = resolve_key(app, &args.target).await?;

    let patch = UpdatePatch {
        title: args.title.clone(),
        description: args.description.clone(),
        severity: args.severity.map(Into::into),
        status: args.status.clone(),
        category: args.category.map(Into::into),
        classification: args.classification.map(Into::into),
        deleted: None,
        display_id: None,
    };

    let issue = app.storage_mut().update(&key, patch).await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&issue)?,
        OutputMode::Text => println!("Updated {}", label(&issue)),
    }

    Ok(())
}

/// Execute the note command.
pub async fn execute_note(
    app: &mut App,
    args: &NoteArgs,
    actor: Option<&str>,
    output_mode: OutputMode,
) -> Result<()> {
    let key = resolve_key(app, &args.target).await?;
    let caller = app.caller(actor);

    let note = Note {
        author: caller.actor,
        body: args.body.clone(),
        at: chrono::Utc::now(),
    };

    let issue = app.storage_mut().add_note(&key, note).await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&issue)?,
        OutputMode::Text => println!(
            "Added note to {} ({} total)",
            label(&issue),
            issue.notes.len()
        ),
    }

    Ok(())
}

/// Execute the close command.
pub async fn execute_close(app: &mut App, args: &CloseArgs, output_mode: OutputMode) -> Result<()> {
    let key = resolve_key(app, &args.target).await?;

    let patch = UpdatePatch {
        status: Some(args.status.clone()),
        ..UpdatePatch::default()
    };
    let issue = app.storage_mut().update(&key, patch).await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&issue)?,
        OutputMode::Text => println!("Closed {} as '{}'", label(&issue), issue.status),
    }

    Ok(())
}

/// Execute the delete command.
pub async fn execute_delete(
    app: &mut App,
    args: &DeleteArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let key = resolve_key(app, &args.target).await?;

    let patch = UpdatePatch {
        deleted: Some(!args.restore),
        ..UpdatePatch::default()
    };
    let issue = app.storage_mut().update(&key, patch).await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&issue)?,
        OutputMode::Text => {
            if args.restore {
                println!("Restored {}", label(&issue));
            } else {
                println!("Soft-deleted {}", label(&issue));
            }
        }
    }

    Ok(())
}

/// Execute the report command.
pub async fn execute_report(app: &App, args: &ReportArgs, output_mode: OutputMode) -> Result<()> {
    let issues = app.storage().scan_all().await?;
    let mut open = open_issues(&issues);

    if let Some(key) = args.app.as_deref() {
        let wanted = resolve_app(app, Some(key))?;
        open.retain(|issue| issue.app == wanted);
    }

    let report = compose_report(open, &app.directory());
    output::print_report(&report, output_mode)?;

    Ok(())
}

/// Execute the repair command.
pub async fn execute_repair(
    app: &mut App,
    args: &RepairArgs,
    actor: Option<&str>,
    output_mode: OutputMode,
) -> Result<()> {
    if args.dry_run {
        let issues = app.storage().scan_all().await?;
        let plan = plan_repair(&issues);
        return match output_mode {
            OutputMode::Json => Ok(output::print_json(&json!({
                "dry_run": true,
                "would_fix": plan.reassignments.len(),
                "log": plan.log,
            }))?),
            OutputMode::Text => {
                for line in &plan.log {
                    println!("{line}");
                }
                println!("Dry run: {} reassignment(s) planned", plan.reassignments.len());
                Ok(())
            }
        };
    }

    let caller = app.caller(actor);
    let outcome = app.identity().repair_duplicates(&caller).await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&json!({
            "fixed": outcome.fixed,
            "log": outcome.log,
        }))?,
        OutputMode::Text => {
            for line in &outcome.log {
                println!("{line}");
            }
            println!("Repaired {} issue(s)", outcome.fixed);
        }
    }

    Ok(())
}

/// Execute the backfill command.
pub async fn execute_backfill(
    app: &mut App,
    args: &BackfillArgs,
    actor: Option<&str>,
    output_mode: OutputMode,
) -> Result<()> {
    if args.dry_run {
        let issues = app.storage().scan_all().await?;
        let plan = plan_backfill(&issues);
        return match output_mode {
            OutputMode::Json => Ok(output::print_json(&json!({
                "dry_run": true,
                "would_assign": plan.len(),
            }))?),
            OutputMode::Text => {
                for assignment in &plan {
                    println!("{} -> {}", assignment.key, assignment.display_id);
                }
                println!("Dry run: {} assignment(s) planned", plan.len());
                Ok(())
            }
        };
    }

    let caller = app.caller(actor);
    let fixed = app.identity().assign_missing(&caller).await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&json!({ "fixed": fixed }))?,
        OutputMode::Text => {
            if fixed == 0 {
                println!("No records missing identifiers");
            } else {
                println!("Assigned identifiers to {fixed} record(s)");
            }
        }
    }

    Ok(())
}

/// Execute the import command.
pub async fn execute_import(
    app: &mut App,
    args: &ImportArgs,
    actor: Option<&str>,
    output_mode: OutputMode,
) -> Result<()> {
    let app_key = resolve_app(app, args.app.as_deref())?;
    let caller = app.caller(actor);

    let content = tokio::fs::read_to_string(&args.file).await?;
    let rows = parse_rows(&content)?;

    let outcome = app
        .identity()
        .bulk_import(&caller, app_key.key(), rows)
        .await?;
    app.save().await?;

    match output_mode {
        OutputMode::Json => output::print_json(&json!({
            "imported": outcome.imported,
            "display_ids": outcome.display_ids,
        }))?,
        OutputMode::Text => {
            println!(
                "Imported {} issue(s): {}",
                outcome.imported,
                outcome.display_ids.join(", ")
            );
        }
    }

    Ok(())
}

/// Parse import rows from a JSON array or JSONL content.
fn parse_rows(content: &str) -> Result<Vec<ImportRow>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed).map_err(Error::Json)?);
    }
    let mut rows = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: ImportRow = serde_json::from_str(line).map_err(|e| {
            Error::InvalidArgument(format!("line {}: {e}", index + 1))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn label(issue: &Issue) -> String {
    issue
        .display_id
        .clone()
        .unwrap_or_else(|| issue.id.to_string())
}
