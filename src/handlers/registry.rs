//! Public registry command handlers
//!
//! Searches the official MCP registry through the backend proxy and imports
//! servers from it into the OpenSync registry.

use anyhow::{Context, Result};
use colored::Colorize;
use inquire::{Confirm, Select};

use super::sync::is_interactive;
use crate::api::Backend;
use crate::browse::{self, RegistryServer, SearchSession};
use crate::model::ScopeContext;

const NEXT_PAGE: &str = "→ Next page";
const EXIT: &str = "← Exit";

/// Handle the search command
pub fn handle_search(
    backend: &dyn Backend,
    ctx: ScopeContext,
    query: &str,
    limit: u32,
) -> Result<()> {
    let mut session = SearchSession::new();
    browse::search(backend, &mut session, query, None, limit).context("Registry search failed")?;

    if session.results.is_empty() {
        println!(
            "{}",
            format!("No registry servers matched '{query}'.").yellow()
        );
        return Ok(());
    }

    print_page(query, &session);

    if !is_interactive() {
        if session.next_cursor.is_some() {
            println!(
                "\n{}",
                "More results available; refine the query or raise --limit.".dimmed()
            );
        }
        return Ok(());
    }

    loop {
        let mut options: Vec<String> = session.results.iter().map(describe_entry).collect();
        if session.next_cursor.is_some() {
            options.push(NEXT_PAGE.to_string());
        }
        options.push(EXIT.to_string());

        let selection = Select::new("Select a server to import (or Exit):", options.clone())
            .with_help_message("Use arrow keys to navigate, Enter to select")
            .prompt();

        match selection {
            Ok(selected) if selected == EXIT => break,
            Ok(selected) if selected == NEXT_PAGE => {
                let cursor = session.next_cursor.clone();
                browse::search(backend, &mut session, query, cursor.as_deref(), limit)
                    .context("Registry search failed")?;
                if session.results.is_empty() {
                    println!("{}", "No more results.".yellow());
                    break;
                }
                print_page(query, &session);
            }
            Ok(selected) => {
                if let Some(idx) = options.iter().position(|option| option == &selected) {
                    if idx < session.results.len() {
                        let name = session.results[idx].name.clone();
                        let confirmed =
                            Confirm::new(&format!("Import '{name}' into the OpenSync registry?"))
                                .with_default(true)
                                .prompt()?;
                        if confirmed {
                            import_server(backend, &ctx, &name)?;
                            break;
                        }
                    }
                }
            }
            Err(_) => {
                // User cancelled (Ctrl+C)
                println!("\n{}", "Search cancelled.".yellow());
                break;
            }
        }
    }

    Ok(())
}

/// Handle the import command
pub fn handle_import(backend: &dyn Backend, ctx: ScopeContext, name: &str) -> Result<()> {
    import_server(backend, &ctx, name)
}

fn import_server(backend: &dyn Backend, ctx: &ScopeContext, name: &str) -> Result<()> {
    let imported = backend
        .import_registry_server(name, ctx)
        .with_context(|| format!("Failed to import '{name}' from the registry"))?;

    let id_note = imported
        .id
        .as_deref()
        .map(|id| format!(" (id {id})"))
        .unwrap_or_default();
    println!(
        "{} Imported '{}' into the {} registry{}",
        "✓".green().bold(),
        imported.name.cyan(),
        ctx.scope,
        id_note.dimmed()
    );

    Ok(())
}

fn print_page(query: &str, session: &SearchSession) {
    let heading = if query.is_empty() {
        "Registry servers".to_string()
    } else {
        format!("Registry servers matching '{query}'")
    };
    println!("\n{}", heading.cyan().bold());
    println!("{}", "=".repeat(80).cyan());

    for (idx, server) in session.results.iter().enumerate() {
        println!(
            "{:2}. {} {} {}",
            idx + 1,
            server.name.bold(),
            server.version.dimmed(),
            format!("[{}]", server.transport).dimmed()
        );
        if !server.summary.is_empty() {
            println!("    {}", server.summary.dimmed());
        }
    }
}

fn describe_entry(server: &RegistryServer) -> String {
    let mut summary = server.summary.replace('\n', " ");
    if summary.chars().count() > 60 {
        summary = format!("{}…", summary.chars().take(59).collect::<String>());
    }
    if summary.is_empty() {
        format!("{} ({})", server.name, server.version)
    } else {
        format!("{} ({}) - {summary}", server.name, server.version)
    }
}
