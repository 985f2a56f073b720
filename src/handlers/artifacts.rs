//! Artifact command handlers
//!
//! Handles the merged artifact listing plus registering and removing
//! artifacts in the backend registry.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use inquire::Confirm;
use serde_json::{Map, Value};

use super::sync::is_interactive;
use crate::api::Backend;
use crate::model::{Artifact, ResourceKind, ScopeContext};
use crate::session::SyncSession;

/// Handle the list command
pub fn handle_list(backend: &dyn Backend, kind: ResourceKind, ctx: ScopeContext) -> Result<()> {
    let mut session = SyncSession::new(backend, kind, ctx);
    session
        .reload()
        .context("Failed to load data from the backend")?;

    let artifacts = session.artifacts();
    if artifacts.is_empty() {
        println!(
            "{}",
            format!(
                "No {}s in {} scope.",
                kind.display_name(),
                session.context().scope
            )
            .yellow()
        );
        return Ok(());
    }

    println!(
        "{}",
        format!("{} ({} scope)", plural_title(kind), session.context().scope)
            .cyan()
            .bold()
    );
    println!("{}", "=".repeat(80).cyan());
    println!(
        "  {} registered   {} discovered only",
        "●".green(),
        "○".yellow()
    );
    println!();

    for artifact in artifacts {
        let marker = if artifact.is_registered() {
            "●".green()
        } else {
            "○".yellow()
        };

        print!("  {} {}", marker, artifact.name.bold());
        if let Some(text) = artifact.describe() {
            print!(" {}", format!("- {text}").dimmed());
        }
        println!();

        if !artifact.sources.is_empty() {
            println!(
                "      {} {}",
                "sources:".dimmed(),
                artifact.sources.join(", ")
            );
        }
    }

    let registered = artifacts.iter().filter(|a| a.is_registered()).count();
    println!(
        "\n{} total, {} registered, {} discovered only",
        artifacts.len(),
        registered,
        artifacts.len() - registered
    );

    Ok(())
}

/// Payload fields accepted by `opensync add`.
#[derive(Debug, Default)]
pub struct AddFields {
    pub description: Option<String>,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub env: Vec<String>,
    pub url: Option<String>,
    pub content_file: Option<PathBuf>,
    pub json: Option<String>,
}

/// Handle the add command
pub fn handle_add(
    backend: &dyn Backend,
    kind: ResourceKind,
    ctx: ScopeContext,
    name: &str,
    fields: AddFields,
) -> Result<()> {
    let mut artifact = Artifact::new(name);
    artifact.payload = build_payload(kind, &fields)?;

    let created = backend
        .create_item(kind, &artifact, &ctx)
        .with_context(|| format!("Failed to register {} '{name}'", kind.display_name()))?;

    let id_note = created
        .id
        .as_deref()
        .map(|id| format!(" (id {id})"))
        .unwrap_or_default();
    println!(
        "{} Registered {} '{}'{}",
        "✓".green().bold(),
        kind.display_name(),
        created.name.cyan(),
        id_note.dimmed()
    );

    Ok(())
}

/// Handle the remove command
pub fn handle_remove(
    backend: &dyn Backend,
    kind: ResourceKind,
    ctx: ScopeContext,
    name: &str,
    yes: bool,
) -> Result<()> {
    let registered = backend
        .list_items(kind, &ctx)
        .context("Failed to load the registry")?;
    let artifact = registered
        .iter()
        .find(|a| a.name == name)
        .with_context(|| format!("No registered {} named '{name}'", kind.display_name()))?;
    let id = artifact
        .id
        .as_deref()
        .with_context(|| format!("Registered {} '{name}' is missing its id", kind.display_name()))?;

    if !yes && is_interactive() {
        let confirmed = Confirm::new(&format!(
            "Remove {} '{name}' from the registry?",
            kind.display_name()
        ))
        .with_default(false)
        .prompt()?;
        if !confirmed {
            println!("{}", "Not removed.".yellow());
            return Ok(());
        }
    }

    backend
        .delete_item(kind, id, &ctx)
        .with_context(|| format!("Failed to remove {} '{name}'", kind.display_name()))?;

    println!(
        "{} Removed {} '{}' from the registry.",
        "✓".green().bold(),
        kind.display_name(),
        name.cyan()
    );

    Ok(())
}

fn plural_title(kind: ResourceKind) -> String {
    let mut title = format!("{}s", kind.display_name());
    if let Some(first) = title.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    title
}

fn build_payload(kind: ResourceKind, fields: &AddFields) -> Result<Map<String, Value>> {
    if let Some(raw) = &fields.json {
        let value: Value = serde_json::from_str(raw).context("--json is not valid JSON")?;
        return match value {
            Value::Object(map) => Ok(map),
            _ => bail!("--json must be a JSON object"),
        };
    }

    let mut payload = Map::new();
    if let Some(description) = &fields.description {
        payload.insert(
            "description".to_string(),
            Value::String(description.clone()),
        );
    }
    if let Some(command) = &fields.command {
        payload.insert("command".to_string(), Value::String(command.clone()));
    }
    if !fields.args.is_empty() {
        payload.insert(
            "args".to_string(),
            Value::Array(fields.args.iter().cloned().map(Value::String).collect()),
        );
    }
    if !fields.env.is_empty() {
        let mut env = Map::new();
        for entry in &fields.env {
            let (key, value) = entry
                .split_once('=')
                .with_context(|| format!("--env '{entry}' is not KEY=VALUE"))?;
            env.insert(key.to_string(), Value::String(value.to_string()));
        }
        payload.insert("env".to_string(), Value::Object(env));
    }
    if let Some(url) = &fields.url {
        payload.insert("url".to_string(), Value::String(url.clone()));
    }
    if let Some(path) = &fields.content_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        payload.insert("content".to_string(), Value::String(content));
    }

    if kind == ResourceKind::Server
        && payload.get("command").is_none()
        && payload.get("url").is_none()
    {
        bail!("an MCP server needs --command or --url");
    }

    Ok(payload)
}
