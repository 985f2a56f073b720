//! Backend API surface.
//!
//! [`Backend`] is the seam between the sync engine and the OpenSync HTTP
//! backend; [`HttpBackend`] is the real client, tests substitute in-memory
//! fakes. All routes live under `/api` and speak snake_case JSON.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::browse::{parse_registry_page, RegistryPage};
use crate::model::{Artifact, Project, ResourceKind, Scope, ScopeContext, SyncOutcome, Target};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Everything the engine needs from the backend, kind-generic.
pub trait Backend {
    /// Registered artifacts of `kind` for the context's scope.
    fn list_items(&self, kind: ResourceKind, ctx: &ScopeContext) -> Result<Vec<Artifact>>;

    /// Artifacts discovered by scanning tool configs for the context's scope.
    fn discover_items(&self, kind: ResourceKind, ctx: &ScopeContext) -> Result<Vec<Artifact>>;

    /// Sync destinations for `kind`, with live config status.
    fn list_targets(&self, kind: ResourceKind, ctx: &ScopeContext) -> Result<Vec<Target>>;

    /// Persist an artifact to the registry; the returned copy carries its id.
    fn create_item(&self, kind: ResourceKind, artifact: &Artifact, ctx: &ScopeContext)
        -> Result<Artifact>;

    /// Remove a registered artifact by id.
    fn delete_item(&self, kind: ResourceKind, id: &str, ctx: &ScopeContext) -> Result<()>;

    /// Bulk server sync: the backend fans the named servers out to every
    /// named target and reports one outcome per target.
    fn sync_servers(
        &self,
        names: &[String],
        targets: &[String],
        ctx: &ScopeContext,
    ) -> Result<Vec<SyncOutcome>>;

    /// Push one registered artifact into the given targets.
    fn sync_item(
        &self,
        kind: ResourceKind,
        id: &str,
        targets: &[String],
        ctx: &ScopeContext,
    ) -> Result<Vec<SyncOutcome>>;

    fn list_projects(&self) -> Result<Vec<Project>>;

    fn add_project(&self, name: &str, path: &str) -> Result<Project>;

    fn remove_project(&self, name: &str) -> Result<()>;

    /// Proxied search against the official MCP registry.
    fn search_registry(&self, query: &str, cursor: Option<&str>, limit: u32)
        -> Result<RegistryPage>;

    /// Import one server from the official MCP registry into the local one.
    fn import_registry_server(&self, server_name: &str, ctx: &ScopeContext) -> Result<Artifact>;
}

#[derive(Debug, Serialize)]
struct BulkSyncRequest<'a> {
    server_names: &'a [String],
    target_names: &'a [String],
    scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_path: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ItemSyncRequest<'a> {
    target_ids: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    project_path: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SyncEnvelope {
    #[serde(default)]
    results: Vec<SyncOutcome>,
}

#[derive(Debug, Serialize)]
struct CreateItemRequest<'a> {
    name: &'a str,
    scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_name: Option<&'a str>,
    #[serde(flatten)]
    payload: &'a Map<String, Value>,
}

#[derive(Debug, Serialize)]
struct AddProjectRequest<'a> {
    name: &'a str,
    path: &'a str,
}

#[derive(Debug, Serialize)]
struct RegistryImportRequest<'a> {
    server_name: &'a str,
    scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_name: Option<&'a str>,
}

/// Blocking HTTP client for a running OpenSync backend.
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("opensync/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpBackend {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .with_context(|| format!("GET {url} failed"))?;
        read_json(response).with_context(|| format!("GET {url}"))
    }

    fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .with_context(|| format!("POST {url} failed"))?;
        read_json(response).with_context(|| format!("POST {url}"))
    }

    fn delete_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.url(path);
        let response = self
            .client
            .delete(&url)
            .query(query)
            .send()
            .with_context(|| format!("DELETE {url} failed"))?;
        read_json(response).with_context(|| format!("DELETE {url}"))
    }
}

/// Query string for registry-backed routes, which address projects by name.
fn scope_name_query(ctx: &ScopeContext) -> Vec<(&'static str, String)> {
    let mut query = vec![("scope", ctx.scope.to_string())];
    if let Some(name) = ctx.project_name() {
        query.push(("project_name", name.to_string()));
    }
    query
}

/// Query string for discovery/target routes, which address projects by path.
fn scope_path_query(ctx: &ScopeContext) -> Vec<(&'static str, String)> {
    let mut query = vec![("scope", ctx.scope.to_string())];
    if let Some(path) = ctx.project_path() {
        query.push(("project_path", path.to_string()));
    }
    query
}

fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let detail = response.text().ok().and_then(|body| extract_detail(&body));
        match detail {
            Some(detail) => bail!("backend returned {status}: {detail}"),
            None => bail!("backend returned {status}"),
        }
    }
    response
        .json()
        .context("Failed to parse backend response as JSON")
}

/// FastAPI error bodies look like `{"detail": "..."}`; validation errors put
/// a structure there instead of a string.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => Some(other.to_string()),
        None => None,
    }
}

impl Backend for HttpBackend {
    fn list_items(&self, kind: ResourceKind, ctx: &ScopeContext) -> Result<Vec<Artifact>> {
        let path = match kind {
            ResourceKind::Server => "/api/registry".to_string(),
            other => format!("/api/{}", other.api_root()),
        };
        self.get_json(&path, &scope_name_query(ctx))
    }

    fn discover_items(&self, kind: ResourceKind, ctx: &ScopeContext) -> Result<Vec<Artifact>> {
        let path = match kind {
            ResourceKind::Server => "/api/servers".to_string(),
            other => format!("/api/{}/discover", other.api_root()),
        };
        self.get_json(&path, &scope_path_query(ctx))
    }

    fn list_targets(&self, kind: ResourceKind, ctx: &ScopeContext) -> Result<Vec<Target>> {
        let path = match kind {
            ResourceKind::Server => "/api/targets".to_string(),
            other => format!("/api/{}/targets", other.api_root()),
        };
        self.get_json(&path, &scope_path_query(ctx))
    }

    fn create_item(
        &self,
        kind: ResourceKind,
        artifact: &Artifact,
        ctx: &ScopeContext,
    ) -> Result<Artifact> {
        let path = match kind {
            ResourceKind::Server => "/api/registry".to_string(),
            other => format!("/api/{}", other.api_root()),
        };
        let body = CreateItemRequest {
            name: &artifact.name,
            scope: ctx.scope,
            project_name: ctx.project_name(),
            payload: &artifact.payload,
        };
        self.post_json(&path, &body)
    }

    fn delete_item(&self, kind: ResourceKind, id: &str, ctx: &ScopeContext) -> Result<()> {
        let path = match kind {
            ResourceKind::Server => format!("/api/registry/{id}"),
            other => format!("/api/{}/{id}", other.api_root()),
        };
        self.delete_json(&path, &scope_name_query(ctx))?;
        Ok(())
    }

    fn sync_servers(
        &self,
        names: &[String],
        targets: &[String],
        ctx: &ScopeContext,
    ) -> Result<Vec<SyncOutcome>> {
        let body = BulkSyncRequest {
            server_names: names,
            target_names: targets,
            scope: ctx.scope,
            project_path: ctx.project_path(),
        };
        let envelope: SyncEnvelope = self.post_json("/api/sync", &body)?;
        Ok(envelope.results)
    }

    fn sync_item(
        &self,
        kind: ResourceKind,
        id: &str,
        targets: &[String],
        ctx: &ScopeContext,
    ) -> Result<Vec<SyncOutcome>> {
        let path = format!("/api/{}/{id}/sync", kind.api_root());
        let body = ItemSyncRequest {
            target_ids: targets,
            project_path: ctx.project_path(),
        };
        let envelope: SyncEnvelope = self.post_json(&path, &body)?;
        Ok(envelope.results)
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        self.get_json("/api/projects", &[])
    }

    fn add_project(&self, name: &str, path: &str) -> Result<Project> {
        self.post_json("/api/projects", &AddProjectRequest { name, path })
    }

    fn remove_project(&self, name: &str) -> Result<()> {
        self.delete_json(&format!("/api/projects/{name}"), &[])?;
        Ok(())
    }

    fn search_registry(
        &self,
        query: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<RegistryPage> {
        let mut params = vec![("limit", limit.to_string())];
        if !query.is_empty() {
            params.push(("query", query.to_string()));
        }
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        let raw: Value = self.get_json("/api/registry/search", &params)?;
        Ok(parse_registry_page(&raw))
    }

    fn import_registry_server(&self, server_name: &str, ctx: &ScopeContext) -> Result<Artifact> {
        let body = RegistryImportRequest {
            server_name,
            scope: ctx.scope,
            project_name: ctx.project_name(),
        };
        self.post_json("/api/registry/import-registry", &body)
    }
}
