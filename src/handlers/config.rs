//! Configuration command handlers
//!
//! Shows and updates the persisted CLI settings.

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::{ConfigManager, Settings};
use crate::model::Scope;

/// Handle config show (also the default when no set flag is given)
pub fn handle_config_show() -> Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;

    println!("{}", "Configuration".cyan().bold());
    println!("{}", "=".repeat(80).cyan());

    println!("  {} {}", "Backend URL:".cyan(), settings.backend_url);
    println!("  {} {}", "Default scope:".cyan(), settings.default_scope);
    println!(
        "  {} {}",
        "Active project:".cyan(),
        match &settings.active_project {
            Some(project) => format!("{} ({})", project.name, project.path),
            None => "None".dimmed().to_string(),
        }
    );

    if let Ok(path) = ConfigManager::settings_path() {
        println!("\n  {} {}", "Settings file:".dimmed(), path.display());
    }

    Ok(())
}

/// Handle config set command
pub fn handle_config_set(
    backend_url: Option<String>,
    default_scope: Option<Scope>,
    clear_project: bool,
) -> Result<()> {
    let mut settings = Settings::load().context("Failed to load settings")?;
    let mut changed = false;

    if let Some(url) = backend_url {
        settings.backend_url = url.trim_end_matches('/').to_string();
        println!(
            "  {} Backend URL set to {}",
            "✓".green(),
            settings.backend_url
        );
        changed = true;
    }

    if let Some(scope) = default_scope {
        if scope == Scope::Project && settings.active_project.is_none() {
            println!(
                "{}",
                "Project scope has no active project yet; run 'opensync project use <name>'."
                    .yellow()
            );
        }
        settings.default_scope = scope;
        println!("  {} Default scope set to {scope}", "✓".green());
        changed = true;
    }

    if clear_project {
        settings.active_project = None;
        println!("  {} Cleared the active project", "✓".green());
        if settings.default_scope == Scope::Project {
            settings.default_scope = Scope::Global;
            println!("  {} Default scope reset to global", "✓".green());
        }
        changed = true;
    }

    if !changed {
        return handle_config_show();
    }

    settings.save().context("Failed to save settings")?;
    println!("\n{} Configuration saved.", "✓".green().bold());

    Ok(())
}
