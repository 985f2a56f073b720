//! Sync command handlers
//!
//! Implements the scripted and interactive sync flow: load the merged
//! artifact view, pick artifacts and targets, confirm, dispatch, report.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use inquire::{Confirm, MultiSelect};

use crate::api::Backend;
use crate::catalog;
use crate::history::{DispatchHistory, DispatchRecord};
use crate::model::{Artifact, ResourceKind, ScopeContext};
use crate::report::{self, SyncReport};
use crate::session::SyncSession;

/// Check if we're running in an interactive terminal
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

/// Handle the targets command
pub fn handle_targets(backend: &dyn Backend, kind: ResourceKind, ctx: ScopeContext) -> Result<()> {
    let targets = backend
        .list_targets(kind, &ctx)
        .context("Failed to load targets from the backend")?;
    let groups = catalog::group_targets(&targets, kind, ctx.scope);

    if groups.is_empty() {
        println!(
            "{}",
            format!(
                "No sync targets for {}s in {} scope.",
                kind.display_name(),
                ctx.scope
            )
            .yellow()
        );
        return Ok(());
    }

    println!(
        "{}",
        format!("Sync targets for {}s", kind.display_name()).cyan().bold()
    );
    println!("{}", "=".repeat(80).cyan());

    for group in &groups {
        if let Some(label) = &group.label {
            println!("\n{}", label.bold());
        } else {
            println!();
        }

        for target in &group.targets {
            let marker = match target.config_exists {
                Some(false) => "✗".red(),
                _ => "✓".green(),
            };

            print!("  {} {}", marker, target.display_name.bold());
            if let Some(count) = target.server_count {
                print!(" {}", format!("({count} configured)").dimmed());
            }
            println!();

            if let Some(path) = &target.config_path {
                println!("      {}", path.dimmed());
            }
            if target.config_exists == Some(false) {
                println!("      {}", "config file not found".yellow());
            }
        }
    }

    Ok(())
}

/// Handle the sync command
pub fn handle_sync(
    backend: &dyn Backend,
    kind: ResourceKind,
    ctx: ScopeContext,
    items: &[String],
    targets: &[String],
    all: bool,
    yes: bool,
) -> Result<()> {
    let mut session = SyncSession::new(backend, kind, ctx);
    session
        .reload()
        .context("Failed to load data from the backend")?;

    if session.artifacts().is_empty() {
        println!(
            "{}",
            format!(
                "No {}s found in {} scope.",
                kind.display_name(),
                session.context().scope
            )
            .yellow()
        );
        return Ok(());
    }

    select_artifacts(&mut session, items, all)?;
    if session.selection().artifacts().is_empty() {
        println!("{}", "Nothing selected. Aborting.".yellow());
        return Ok(());
    }

    select_targets(&mut session, targets, all)?;
    if session.selection().targets().is_empty() {
        println!("{}", "No targets selected. Aborting.".yellow());
        return Ok(());
    }

    println!(
        "\nSyncing {} {}(s) to {} target(s) in {} scope.",
        session.selection().artifacts().len(),
        kind.display_name(),
        session.selection().targets().len(),
        session.context().scope
    );

    if !yes && is_interactive() {
        let confirmed = Confirm::new("Dispatch this sync?")
            .with_default(true)
            .prompt()?;
        if !confirmed {
            println!("{}", "Sync cancelled.".yellow());
            return Ok(());
        }
    }

    let outcomes = session.dispatch()?;
    let report = SyncReport::from_outcomes(kind, session.context(), outcomes);
    report.print_summary();

    if let Err(error) = report::save_latest_report(&report) {
        log::warn!("saving sync report failed: {error:#}");
    }
    match DispatchHistory::load() {
        Ok(mut history) => {
            let record = DispatchRecord::new(kind, session.context(), &report.outcomes);
            if let Err(error) = history.add_record(record, None) {
                log::warn!("recording dispatch failed: {error:#}");
            }
        }
        Err(error) => log::warn!("loading dispatch history failed: {error:#}"),
    }

    Ok(())
}

fn select_artifacts(session: &mut SyncSession, items: &[String], all: bool) -> Result<()> {
    if all {
        session.select_all_artifacts();
        return Ok(());
    }

    if !items.is_empty() {
        for name in items {
            if !session.artifacts().iter().any(|a| a.name == *name) {
                bail!(
                    "No {} named '{}' exists in this scope",
                    session.kind().display_name(),
                    name
                );
            }
            session.toggle_artifact(name);
        }
        return Ok(());
    }

    if !is_interactive() {
        bail!(
            "Not a terminal; pass --items <names> or --all to select {}s",
            session.kind().display_name()
        );
    }

    let options: Vec<String> = session.artifacts().iter().map(describe_artifact).collect();
    let chosen = MultiSelect::new(
        &format!("Select {}s to sync:", session.kind().display_name()),
        options.clone(),
    )
    .with_help_message("Space to select, Enter to confirm")
    .prompt()
    .context("Failed to get artifact selection")?;

    let names: Vec<String> = chosen
        .iter()
        .filter_map(|selected| options.iter().position(|option| option == selected))
        .map(|idx| session.artifacts()[idx].name.clone())
        .collect();
    for name in &names {
        session.toggle_artifact(name);
    }

    Ok(())
}

fn describe_artifact(artifact: &Artifact) -> String {
    let origin = if artifact.is_registered() {
        "registered"
    } else {
        "discovered"
    };
    match artifact.describe() {
        Some(text) => format!("{} ({origin}) - {text}", artifact.name),
        None => format!("{} ({origin})", artifact.name),
    }
}

fn select_targets(session: &mut SyncSession, keys: &[String], all: bool) -> Result<()> {
    if all {
        session.select_all_targets();
        return Ok(());
    }

    if !keys.is_empty() {
        for key in keys {
            if !session.targets().iter().any(|t| t.key() == key) {
                bail!(
                    "No sync target '{key}' exists for {}s",
                    session.kind().display_name()
                );
            }
            session.toggle_target(key);
        }
        return Ok(());
    }

    if !is_interactive() {
        bail!("Not a terminal; pass --targets <keys> or --all to select targets");
    }

    let groups = session.target_groups();
    let mut options = Vec::new();
    let mut option_keys = Vec::new();
    for group in &groups {
        for target in &group.targets {
            let mut label = match &group.label {
                Some(section) => format!("[{section}] {}", target.display_name),
                None => target.display_name.clone(),
            };
            if target.config_exists == Some(false) {
                label.push_str(" (config missing)");
            }
            options.push(label);
            option_keys.push(target.key().to_string());
        }
    }

    let chosen = MultiSelect::new("Select targets to sync into:", options.clone())
        .with_help_message("Space to select, Enter to confirm")
        .prompt()
        .context("Failed to get target selection")?;

    let chosen_keys: Vec<String> = chosen
        .iter()
        .filter_map(|selected| options.iter().position(|option| option == selected))
        .map(|idx| option_keys[idx].clone())
        .collect();
    for key in &chosen_keys {
        session.toggle_target(key);
    }

    Ok(())
}
