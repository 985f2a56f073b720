use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use opensync::api::{Backend, HttpBackend};
use opensync::config::Settings;
use opensync::handlers;
use opensync::handlers::artifacts::AddFields;
use opensync::logger;
use opensync::model::{ResourceKind, Scope, ScopeContext};
use opensync::report;

#[derive(Parser)]
#[command(name = "opensync")]
#[command(
    about = "Sync MCP servers, skills, workflows, agents and LLM providers across AI tools",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Backend URL (overrides the configured one)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Scope to operate in: global or project
    #[arg(long, global = true)]
    scope: Option<Scope>,

    /// Project name for project scope (defaults to the active project)
    #[arg(long, global = true)]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List artifacts of a kind (merged discovered + registered view)
    List {
        /// Artifact kind: server, skill, workflow, llm-provider or agent
        #[arg(short, long, default_value = "server")]
        kind: ResourceKind,
    },

    /// List the sync targets for a kind, grouped for display
    Targets {
        /// Artifact kind: server, skill, workflow, llm-provider or agent
        #[arg(short, long, default_value = "server")]
        kind: ResourceKind,
    },

    /// Pick artifacts and targets, then dispatch a sync
    Sync {
        /// Artifact kind: server, skill, workflow, llm-provider or agent
        #[arg(short, long, default_value = "server")]
        kind: ResourceKind,

        /// Artifact names to sync (comma-separated); skips the picker
        #[arg(short, long, value_delimiter = ',')]
        items: Vec<String>,

        /// Target keys to sync into (comma-separated); skips the picker
        #[arg(short, long, value_delimiter = ',')]
        targets: Vec<String>,

        /// Sync every artifact to every available target
        #[arg(long)]
        all: bool,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Register an artifact in the backend registry
    Add {
        /// Artifact name
        name: String,

        /// Artifact kind: server, skill, workflow, llm-provider or agent
        #[arg(short, long, default_value = "server")]
        kind: ResourceKind,

        /// Description stored with the artifact
        #[arg(long)]
        description: Option<String>,

        /// Launch command (servers)
        #[arg(long)]
        command: Option<String>,

        /// Launch argument, repeatable (servers)
        #[arg(long = "arg")]
        args: Vec<String>,

        /// KEY=VALUE environment entry, repeatable (servers)
        #[arg(long = "env")]
        env: Vec<String>,

        /// Remote server URL (servers)
        #[arg(long)]
        url: Option<String>,

        /// File whose contents become the artifact's content field
        #[arg(long)]
        content_file: Option<PathBuf>,

        /// Raw JSON payload; overrides the field flags
        #[arg(long)]
        json: Option<String>,
    },

    /// Remove a registered artifact
    Remove {
        /// Artifact name
        name: String,

        /// Artifact kind: server, skill, workflow, llm-provider or agent
        #[arg(short, long, default_value = "server")]
        kind: ResourceKind,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Search the public MCP registry
    Search {
        /// Search text (empty lists the newest servers)
        #[arg(default_value = "")]
        query: String,

        /// Results per page
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },

    /// Import a server from the public MCP registry
    Import {
        /// Registry server name, e.g. io.github.example/filesystem
        name: String,
    },

    /// Manage registered projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// View the last sync report
    Report {
        /// Output format: json or markdown
        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// Output file (default: print to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// View sync dispatch history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Show or change CLI configuration
    Config {
        /// Set the backend URL
        #[arg(long)]
        backend_url: Option<String>,

        /// Set the default scope: global or project
        #[arg(long)]
        default_scope: Option<Scope>,

        /// Clear the active project
        #[arg(long)]
        clear_project: bool,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List registered projects
    List,

    /// Register a project
    Add {
        /// Project name
        name: String,

        /// Absolute path to the project root
        path: String,
    },

    /// Remove a registered project
    Remove {
        /// Project name
        name: String,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Make a project the active one (and default to project scope)
    Use {
        /// Project name
        name: String,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List recent dispatches
    List {
        /// Maximum number of dispatches to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Show the most recent dispatch
    Last,

    /// Clear the dispatch history
    Clear,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logger::init_logger()?;
    logger::rotate_log_if_needed()?;

    let settings = Settings::load().context("Failed to load settings")?;

    match cli.command {
        Commands::List { kind } => {
            let backend = connect(cli.backend.as_deref(), &settings)?;
            let ctx = resolve_context(&backend, &settings, cli.scope, cli.project.as_deref())?;
            handlers::handle_list(&backend, kind, ctx)?;
        }
        Commands::Targets { kind } => {
            let backend = connect(cli.backend.as_deref(), &settings)?;
            let ctx = resolve_context(&backend, &settings, cli.scope, cli.project.as_deref())?;
            handlers::handle_targets(&backend, kind, ctx)?;
        }
        Commands::Sync {
            kind,
            items,
            targets,
            all,
            yes,
        } => {
            let backend = connect(cli.backend.as_deref(), &settings)?;
            let ctx = resolve_context(&backend, &settings, cli.scope, cli.project.as_deref())?;
            handlers::handle_sync(&backend, kind, ctx, &items, &targets, all, yes)?;
        }
        Commands::Add {
            name,
            kind,
            description,
            command,
            args,
            env,
            url,
            content_file,
            json,
        } => {
            let backend = connect(cli.backend.as_deref(), &settings)?;
            let ctx = resolve_context(&backend, &settings, cli.scope, cli.project.as_deref())?;
            let fields = AddFields {
                description,
                command,
                args,
                env,
                url,
                content_file,
                json,
            };
            handlers::handle_add(&backend, kind, ctx, &name, fields)?;
        }
        Commands::Remove { name, kind, yes } => {
            let backend = connect(cli.backend.as_deref(), &settings)?;
            let ctx = resolve_context(&backend, &settings, cli.scope, cli.project.as_deref())?;
            handlers::handle_remove(&backend, kind, ctx, &name, yes)?;
        }
        Commands::Search { query, limit } => {
            let backend = connect(cli.backend.as_deref(), &settings)?;
            let ctx = resolve_context(&backend, &settings, cli.scope, cli.project.as_deref())?;
            handlers::handle_search(&backend, ctx, &query, limit)?;
        }
        Commands::Import { name } => {
            let backend = connect(cli.backend.as_deref(), &settings)?;
            let ctx = resolve_context(&backend, &settings, cli.scope, cli.project.as_deref())?;
            handlers::handle_import(&backend, ctx, &name)?;
        }
        Commands::Project { command } => {
            let backend = connect(cli.backend.as_deref(), &settings)?;
            match command {
                ProjectCommands::List => handlers::handle_project_list(&backend)?,
                ProjectCommands::Add { name, path } => {
                    handlers::handle_project_add(&backend, &name, &path)?
                }
                ProjectCommands::Remove { name, yes } => {
                    handlers::handle_project_remove(&backend, &name, yes)?
                }
                ProjectCommands::Use { name } => handlers::handle_project_use(&backend, &name)?,
            }
        }
        Commands::Report { format, output } => {
            report::generate_report(&format, output.as_deref())?;
        }
        Commands::History { command } => match command {
            HistoryCommands::List { limit } => handlers::handle_history_list(limit)?,
            HistoryCommands::Last => handlers::handle_history_last()?,
            HistoryCommands::Clear => handlers::handle_history_clear()?,
        },
        Commands::Config {
            backend_url,
            default_scope,
            clear_project,
        } => {
            handlers::handle_config_set(backend_url, default_scope, clear_project)?;
        }
    }

    Ok(())
}

fn connect(backend_flag: Option<&str>, settings: &Settings) -> Result<HttpBackend> {
    let url = backend_flag
        .map(str::to_string)
        .unwrap_or_else(|| settings.backend_url.clone());
    HttpBackend::new(url)
}

/// Resolve the scope half of the working context. Project scope must name a
/// registered project, either the persisted active one or a --project lookup.
fn resolve_context(
    backend: &HttpBackend,
    settings: &Settings,
    scope_flag: Option<Scope>,
    project_flag: Option<&str>,
) -> Result<ScopeContext> {
    let scope = scope_flag.unwrap_or(settings.default_scope);
    if scope == Scope::Global {
        return Ok(ScopeContext::global());
    }

    if let Some(active) = &settings.active_project {
        if project_flag.is_none() || project_flag == Some(active.name.as_str()) {
            return Ok(ScopeContext::for_project(active.clone()));
        }
    }

    let name = project_flag.ok_or_else(|| {
        anyhow::anyhow!(
            "Project scope needs a project; pass --project <name> or run 'opensync project use <name>'"
        )
    })?;

    let project = backend
        .list_projects()
        .context("Failed to load projects")?
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Project '{name}' is not registered; run 'opensync project add {name} <path>' first"
            )
        })?;

    Ok(ScopeContext::for_project(project))
}
