//! Project command handlers
//!
//! Manages the backend project registry and the locally persisted active
//! project.

use anyhow::{Context, Result};
use colored::Colorize;
use inquire::Confirm;

use super::sync::is_interactive;
use crate::api::Backend;
use crate::config::Settings;
use crate::model::Scope;

/// Handle project list command
pub fn handle_project_list(backend: &dyn Backend) -> Result<()> {
    let projects = backend.list_projects().context("Failed to load projects")?;
    let settings = Settings::load().context("Failed to load settings")?;

    if projects.is_empty() {
        println!("{}", "No projects registered.".yellow());
        println!("Run 'opensync project add <name> <path>' to register one.");
        return Ok(());
    }

    println!("{}", "Projects".cyan().bold());
    println!("{}", "=".repeat(80).cyan());

    let active = settings.active_project.as_ref().map(|p| p.name.as_str());
    for project in &projects {
        let marker = if Some(project.name.as_str()) == active {
            format!(" {}", "[ACTIVE]".green().bold())
        } else {
            String::new()
        };
        println!(
            "  {}{} - {}",
            project.name.bold(),
            marker,
            project.path.dimmed()
        );
    }

    Ok(())
}

/// Handle project add command
pub fn handle_project_add(backend: &dyn Backend, name: &str, path: &str) -> Result<()> {
    let project = backend
        .add_project(name, path)
        .with_context(|| format!("Failed to register project '{name}'"))?;

    println!(
        "{} Registered project '{}' at {}",
        "✓".green().bold(),
        project.name.cyan(),
        project.path
    );

    Ok(())
}

/// Handle project remove command
pub fn handle_project_remove(backend: &dyn Backend, name: &str, yes: bool) -> Result<()> {
    if !yes && is_interactive() {
        let confirmed = Confirm::new(&format!("Remove project '{name}'?"))
            .with_default(false)
            .prompt()?;
        if !confirmed {
            println!("{}", "Not removed.".yellow());
            return Ok(());
        }
    }

    backend
        .remove_project(name)
        .with_context(|| format!("Failed to remove project '{name}'"))?;

    println!("{} Removed project '{}'.", "✓".green().bold(), name.cyan());

    let mut settings = Settings::load().context("Failed to load settings")?;
    if settings.active_project.as_ref().map_or(false, |p| p.name == name) {
        settings.active_project = None;
        settings.save().context("Failed to save settings")?;
        println!("{}", "Cleared the active project.".dimmed());
    }

    Ok(())
}

/// Handle project use command
pub fn handle_project_use(backend: &dyn Backend, name: &str) -> Result<()> {
    let projects = backend.list_projects().context("Failed to load projects")?;
    let project = projects.into_iter().find(|p| p.name == name).with_context(|| {
        format!("Project '{name}' is not registered; run 'opensync project add {name} <path>' first")
    })?;

    let mut settings = Settings::load().context("Failed to load settings")?;
    settings.active_project = Some(project.clone());
    settings.default_scope = Scope::Project;
    settings.save().context("Failed to save settings")?;

    println!(
        "{} Switched to project '{}' ({})",
        "✓".green().bold(),
        project.name.cyan(),
        project.path.dimmed()
    );
    println!(
        "{}",
        "Commands now default to project scope; pass --scope global to override.".dimmed()
    );

    Ok(())
}
