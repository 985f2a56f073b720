//! Core data model shared by every sync surface.
//!
//! Everything the backend speaks is JSON with snake_case keys; the structs
//! here mirror that wire shape directly so the HTTP layer stays thin.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where configuration lives: machine-wide or inside one project checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Project,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Project => "project",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" | "user" => Ok(Scope::Global),
            "project" | "local" => Ok(Scope::Project),
            other => Err(format!("unknown scope '{other}' (expected 'global' or 'project')")),
        }
    }
}

/// The five families of syncable configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Server,
    Skill,
    Workflow,
    LlmProvider,
    Agent,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Server,
        ResourceKind::Skill,
        ResourceKind::Workflow,
        ResourceKind::LlmProvider,
        ResourceKind::Agent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Server => "server",
            ResourceKind::Skill => "skill",
            ResourceKind::Workflow => "workflow",
            ResourceKind::LlmProvider => "llm-provider",
            ResourceKind::Agent => "agent",
        }
    }

    /// Human label used in prompts and summaries.
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Server => "MCP server",
            ResourceKind::Skill => "skill",
            ResourceKind::Workflow => "workflow",
            ResourceKind::LlmProvider => "LLM provider",
            ResourceKind::Agent => "agent",
        }
    }

    /// Path segment under `/api/` for this kind's endpoints.
    pub fn api_root(&self) -> &'static str {
        match self {
            ResourceKind::Server => "servers",
            ResourceKind::Skill => "skills",
            ResourceKind::Workflow => "workflows",
            ResourceKind::LlmProvider => "llm-providers",
            ResourceKind::Agent => "agents",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "server" | "servers" | "mcp" => Ok(ResourceKind::Server),
            "skill" | "skills" => Ok(ResourceKind::Skill),
            "workflow" | "workflows" => Ok(ResourceKind::Workflow),
            "llm-provider" | "llm-providers" | "llm_provider" | "llm" | "provider" => {
                Ok(ResourceKind::LlmProvider)
            }
            "agent" | "agents" => Ok(ResourceKind::Agent),
            other => Err(format!(
                "unknown kind '{other}' (expected server, skill, workflow, llm-provider or agent)"
            )),
        }
    }
}

/// Category a server target belongs to (only server targets carry one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetCategory {
    Editor,
    Desktop,
    Cli,
    Plugin,
}

impl TargetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetCategory::Editor => "editor",
            TargetCategory::Desktop => "desktop",
            TargetCategory::Cli => "cli",
            TargetCategory::Plugin => "plugin",
        }
    }

    /// Section header used when server targets are grouped for display.
    pub fn label(&self) -> &'static str {
        match self {
            TargetCategory::Editor => "Editors",
            TargetCategory::Desktop => "Desktop apps",
            TargetCategory::Cli => "CLI tools",
            TargetCategory::Plugin => "Plugins",
        }
    }
}

/// One syncable unit in canonical form, independent of kind.
///
/// Only `name`, `id` and `sources` matter to the sync engine. The rest of the
/// payload (command/args/env for servers, description/content for skills and
/// so on) is carried opaquely and round-tripped untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Artifact {
    pub fn new(name: impl Into<String>) -> Self {
        Artifact {
            id: None,
            name: name.into(),
            sources: Vec::new(),
            payload: Map::new(),
        }
    }

    /// An artifact with an `id` has been persisted to the backend registry.
    pub fn is_registered(&self) -> bool {
        self.id.is_some()
    }

    /// Best one-line description available in the payload, if any.
    pub fn describe(&self) -> Option<&str> {
        for field in ["description", "command", "url", "provider_type"] {
            if let Some(text) = self.payload.get(field).and_then(Value::as_str) {
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
        None
    }
}

/// A destination tool/config the backend can write artifacts into.
///
/// Which optional fields are present depends on the kind that owns the
/// target: server targets carry `category`, skill/workflow/agent targets
/// carry `native`, LLM provider targets carry neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TargetCategory>,
    #[serde(
        default,
        deserialize_with = "deserialize_native",
        skip_serializing_if = "Option::is_none"
    )]
    pub native: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_exists: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<String>,
}

impl Target {
    /// Stable selection/dispatch key: `id` where present, `name` otherwise.
    pub fn key(&self) -> &str {
        self.id
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.display_name)
    }

    pub fn is_native(&self) -> bool {
        self.native == Some(true)
    }
}

/// The backend serializes the native flag as the strings "true"/"false";
/// accept those alongside real booleans.
fn deserialize_native<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(flag)),
        Some(Value::String(text)) => match text.as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "invalid native flag '{other}'"
            ))),
        },
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid native flag: {other}"
        ))),
    }
}

/// Outcome of writing one batch into one destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub target: String,
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl SyncOutcome {
    pub fn failure(target: impl Into<String>, message: impl Into<String>) -> Self {
        SyncOutcome {
            target: target.into(),
            success: false,
            message: message.into(),
        }
    }

    /// Rewrites `target` to the composite `<artifact> → <target>` form used
    /// by per-artifact dispatch.
    pub fn labeled(mut self, artifact: &str) -> Self {
        self.target = format!("{artifact} → {}", self.target);
        self
    }
}

/// A project registered with the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub path: String,
}

/// The scope half of the active working context. Project scope always
/// carries the registered project so both its name (registry lookups) and
/// its path (discovery, target resolution) travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeContext {
    pub scope: Scope,
    pub project: Option<Project>,
}

impl ScopeContext {
    pub fn global() -> Self {
        ScopeContext {
            scope: Scope::Global,
            project: None,
        }
    }

    pub fn for_project(project: Project) -> Self {
        ScopeContext {
            scope: Scope::Project,
            project: Some(project),
        }
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }

    pub fn project_path(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.path.as_str())
    }
}
