//! History command handlers
//!
//! Handles viewing and managing sync dispatch history including
//! listing dispatches, viewing the most recent one, and clearing history.

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};

use crate::history::DispatchHistory;
use crate::model::ResourceKind;

/// Handle history list command
pub fn handle_history_list(limit: usize) -> Result<()> {
    let history = DispatchHistory::load().context("Failed to load dispatch history")?;

    if history.is_empty() {
        println!("{}", "No dispatches in history.".yellow());
        return Ok(());
    }

    println!("{}", "Dispatch History".cyan().bold());
    println!("{}", "=".repeat(80).cyan());

    let records = history.list_records();
    let display_count = records.len().min(limit);

    for (idx, record) in records.iter().take(display_count).enumerate() {
        let num = format!("{}.", idx + 1);
        println!("\n{} {}", num.bold(), kind_label(record.kind).bold());
        println!(
            "   {} {}",
            "Time:".dimmed(),
            record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        );

        let scope_line = match &record.project {
            Some(project) => format!("{} ({project})", record.scope),
            None => record.scope.to_string(),
        };
        println!("   {} {}", "Scope:".dimmed(), scope_line);
        println!(
            "   {} {}",
            "Results:".dimmed(),
            result_line(record.ok_count, record.fail_count)
        );
    }

    if records.len() > display_count {
        println!(
            "\n{} Showing {} of {} dispatches",
            "Note:".yellow(),
            display_count,
            records.len()
        );
    }

    Ok(())
}

/// Handle history last command
pub fn handle_history_last() -> Result<()> {
    let history = DispatchHistory::load().context("Failed to load dispatch history")?;

    let record = history
        .last_record()
        .ok_or_else(|| anyhow::anyhow!("No dispatches in history."))?;

    println!("{}", "Last Dispatch Details".cyan().bold());
    println!("{}", "=".repeat(80).cyan());

    println!("\n{} {}", "Kind:".bold(), kind_label(record.kind).bold());
    println!("{} {}", "Id:".bold(), record.id.to_string().dimmed());
    println!(
        "{} {}",
        "Time:".bold(),
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{} {}", "Scope:".bold(), record.scope);
    if let Some(project) = &record.project {
        println!("{} {}", "Project:".bold(), project);
    }
    println!(
        "{} {}",
        "Results:".bold(),
        result_line(record.ok_count, record.fail_count)
    );

    println!(
        "\n{}",
        "Run 'opensync report' for the per-target breakdown.".dimmed()
    );

    Ok(())
}

/// Handle history clear command
pub fn handle_history_clear() -> Result<()> {
    let mut history = DispatchHistory::load().context("Failed to load dispatch history")?;

    if history.is_empty() {
        println!("{}", "No history to clear.".yellow());
        return Ok(());
    }

    let count = history.len();
    history.clear(None).context("Failed to clear history")?;

    println!(
        "{} Cleared {} dispatch(es) from history.",
        "SUCCESS:".green().bold(),
        count
    );

    Ok(())
}

fn kind_label(kind: ResourceKind) -> ColoredString {
    match kind {
        ResourceKind::Server => "SERVERS".blue(),
        ResourceKind::Skill => "SKILLS".green(),
        ResourceKind::Workflow => "WORKFLOWS".magenta(),
        ResourceKind::LlmProvider => "LLM PROVIDERS".yellow(),
        ResourceKind::Agent => "AGENTS".cyan(),
    }
}

fn result_line(ok: usize, failed: usize) -> String {
    if failed == 0 {
        format!("{}", format!("{ok} ok").green())
    } else {
        format!(
            "{}, {}",
            format!("{ok} ok").green(),
            format!("{failed} failed").red()
        )
    }
}
