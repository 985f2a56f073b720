//! Browse the official MCP registry through the backend proxy.
//!
//! Responses can come back out of order when the user types faster than the
//! network answers, so every request carries a ticket and only the newest
//! ticket is allowed to update the result panel.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use crate::api::Backend;

/// A server entry from the official registry (for display and import).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryServer {
    pub name: String,
    pub summary: String,
    pub version: String,
    pub transport: String,
}

/// One page of search results plus the cursor for the next page, if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegistryPage {
    pub servers: Vec<RegistryServer>,
    pub next_cursor: Option<String>,
}

/// Pull the useful fields out of the raw registry response. The upstream
/// schema wraps each entry in a `server` object and has renamed fields
/// across versions, so extraction stays tolerant and defaults to "?" like
/// any other unknown.
pub(crate) fn parse_registry_page(raw: &Value) -> RegistryPage {
    let mut page = RegistryPage::default();

    if let Some(entries) = raw.get("servers").and_then(Value::as_array) {
        for entry in entries {
            let server = entry.get("server").unwrap_or(entry);

            let name = server
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            let summary = server
                .get("description")
                .or_else(|| server.get("summary"))
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            let version = server
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            let transport = server
                .get("transports")
                .or_else(|| server.get("remotes"))
                .and_then(Value::as_array)
                .and_then(|a| a.first())
                .and_then(|t| t.get("type").and_then(Value::as_str))
                .unwrap_or("?")
                .to_string();

            page.servers.push(RegistryServer {
                name,
                summary,
                version,
                transport,
            });
        }
    }

    page.next_cursor = raw
        .get("metadata")
        .and_then(|m| m.get("next_cursor").or_else(|| m.get("nextCursor")))
        .and_then(Value::as_str)
        .map(|s| s.to_string());

    page
}

/// Handle for one in-flight search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

/// Result panel state. Issuing a new ticket makes every older one stale.
#[derive(Debug, Default)]
pub struct SearchSession {
    latest: u64,
    pub results: Vec<RegistryServer>,
    pub next_cursor: Option<String>,
}

impl SearchSession {
    pub fn new() -> Self {
        SearchSession::default()
    }

    pub fn begin(&mut self) -> SearchTicket {
        self.latest += 1;
        SearchTicket(self.latest)
    }

    /// Apply a response if its ticket is still the newest issued one.
    /// Returns false (and leaves the panel untouched) for stale responses.
    pub fn apply(&mut self, ticket: SearchTicket, page: RegistryPage) -> bool {
        if ticket.0 != self.latest {
            return false;
        }
        self.results = page.servers;
        self.next_cursor = page.next_cursor;
        true
    }
}

/// One search round trip through the session's ticket gate.
pub fn search(
    backend: &dyn Backend,
    session: &mut SearchSession,
    query: &str,
    cursor: Option<&str>,
    limit: u32,
) -> Result<bool> {
    let ticket = session.begin();
    let page = backend.search_registry(query, cursor, limit)?;
    Ok(session.apply(ticket, page))
}
