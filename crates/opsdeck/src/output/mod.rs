//! Output rendering for CLI commands.
//!
//! Every command renders either human-readable text or JSON (the global
//! `--json` flag), so programmatic consumers get stable shapes while the
//! terminal gets color and wrapping.

use crate::domain::{Issue, Severity};
use crate::error::Result;
use crate::triage::{ReportItem, TriageReport};
use colored::{ColoredString, Colorize};
use serde::Serialize;

/// Output format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text with color.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Fallback wrap width when the terminal size is unknown.
const FALLBACK_WIDTH: usize = 100;

/// Print any serializable value as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn severity_colored(label: &str) -> ColoredString {
    match label {
        "S1" => label.red().bold(),
        "S2" => label.yellow().bold(),
        "S3" => label.cyan(),
        _ => label.dimmed(),
    }
}

fn wrap_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| (w.0 as usize).min(FALLBACK_WIDTH))
        .unwrap_or(FALLBACK_WIDTH)
}

fn issue_line(issue: &Issue) -> String {
    let id = issue
        .display_id
        .clone()
        .unwrap_or_else(|| format!("({})", issue.id));
    format!(
        "{:<8} {:<3} {:<12} {}",
        id,
        severity_colored(issue.severity.label()),
        issue.status,
        issue.title
    )
}

/// Print a list of issues, one line each.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_issues(issues: &[Issue], mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Json => print_json(&issues)?,
        OutputMode::Text => {
            if issues.is_empty() {
                println!("No issues found.");
            } else {
                for issue in issues {
                    println!("{}", issue_line(issue));
                }
                println!();
                println!("{} issue(s)", issues.len());
            }
        }
    }
    Ok(())
}

/// Print one issue in detail.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_issue(issue: &Issue, mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Json => print_json(issue)?,
        OutputMode::Text => {
            let id = issue
                .display_id
                .clone()
                .unwrap_or_else(|| "(unassigned)".to_string());
            println!("{} {}", id.bold(), issue.title);
            println!("  key:            {}", issue.id);
            println!("  app:            {}", issue.app);
            println!("  severity:       {}", severity_colored(issue.severity.label()));
            println!("  status:         {}", issue.status);
            println!("  category:       {}", issue.category);
            if let Some(classification) = issue.classification {
                println!("  classification: {classification:?}");
            }
            if issue.deleted {
                println!("  {}", "soft-deleted".dimmed());
            }
            println!("  reporter:       {}", issue.reporter.as_deref().unwrap_or("-"));
            println!("  created:        {}", issue.created_at.to_rfc3339());
            if !issue.description.is_empty() {
                println!();
                println!("{}", textwrap::indent(&textwrap::fill(&issue.description, wrap_width().saturating_sub(2)), "  "));
            }
            if !issue.notes.is_empty() {
                println!();
                println!("  Notes:");
                for note in &issue.notes {
                    println!(
                        "    [{}] {}: {}",
                        note.at.format("%Y-%m-%d %H:%M"),
                        note.author,
                        note.body
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_bucket(name: &ColoredString, items: &[ReportItem]) {
    println!("{} ({})", name, items.len());
    if items.is_empty() {
        println!("  {}", "nothing here".dimmed());
    }
    let width = wrap_width();
    for item in items {
        let id = item
            .display_id
            .clone()
            .unwrap_or_else(|| format!("({})", item.key));
        println!(
            "  {:<8} {:<3} {:<22} {:<12} {}",
            id.bold(),
            severity_colored(&item.severity),
            item.category,
            item.status,
            item.assignee
        );
        println!("           {}", item.title);
        let reason = textwrap::fill(&item.reason, width.saturating_sub(16));
        println!("           {}", reason.replace('\n', "\n           ").dimmed());
    }
    println!();
}

/// Print the operator triage report.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn print_report(report: &TriageReport, mode: OutputMode) -> Result<()> {
    match mode {
        OutputMode::Json => print_json(report)?,
        OutputMode::Text => {
            println!("{}", "Operator Triage Report".bold());
            println!("======================");
            println!();
            print_bucket(&"Fix Now".red().bold(), &report.fix_now);
            print_bucket(&"Fix Next".yellow().bold(), &report.fix_next);
            print_bucket(&"Parked".dimmed(), &report.parked);

            let counts = &report.summary.severity_counts;
            println!("{}", "Summary".bold());
            let line = Severity::ALL
                .iter()
                .map(|severity| {
                    format!(
                        "{}: {}",
                        severity.label(),
                        counts.get(severity.label()).copied().unwrap_or(0)
                    )
                })
                .collect::<Vec<_>>()
                .join("   ");
            println!("  {line}");
            println!(
                "  critical risk: {}   tester trust risk: {}",
                yes_no(report.summary.critical_risk_present),
                yes_no(report.summary.tester_trust_risk_present)
            );
        }
    }
    Ok(())
}

fn yes_no(flag: bool) -> ColoredString {
    if flag {
        "yes".red().bold()
    } else {
        "no".green()
    }
}
