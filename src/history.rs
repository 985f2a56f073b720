use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

use crate::model::{ResourceKind, Scope, ScopeContext, SyncOutcome};
use crate::report::BatchSummary;

/// Maximum number of dispatch records to keep in history
const MAX_HISTORY_SIZE: usize = 20;

/// Record of a single dispatched sync batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Stable identifier for this dispatch
    pub id: Uuid,

    /// When the batch was dispatched
    pub timestamp: DateTime<Utc>,

    /// Which kind of artifact was synced
    pub kind: ResourceKind,

    /// Scope the batch ran under
    pub scope: Scope,

    /// Project name, for project-scoped batches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Number of successful outcomes
    pub ok_count: usize,

    /// Number of failed outcomes
    pub fail_count: usize,
}

impl DispatchRecord {
    pub fn new(kind: ResourceKind, ctx: &ScopeContext, outcomes: &[SyncOutcome]) -> Self {
        let summary = BatchSummary::from_outcomes(outcomes);
        DispatchRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            scope: ctx.scope,
            project: ctx.project_name().map(|name| name.to_string()),
            ok_count: summary.ok_count,
            fail_count: summary.fail_count,
        }
    }

    /// One-line description for `opensync history list`.
    pub fn summary(&self) -> String {
        let scope_part = match &self.project {
            Some(project) => format!("{} ({project})", self.scope),
            None => self.scope.to_string(),
        };
        format!(
            "{} sync at {} [{}]: {} ok, {} failed",
            self.kind,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            scope_part,
            self.ok_count,
            self.fail_count
        )
    }
}

/// Rolling history of dispatched batches, persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchHistory {
    /// Dispatch records, most recent first
    pub records: Vec<DispatchRecord>,
}

impl DispatchHistory {
    fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    fn history_file_path() -> Result<PathBuf> {
        crate::config::ConfigManager::history_path()
    }

    /// Load history from a custom path, or the default location when `None`.
    /// A missing file yields an empty history.
    pub fn from_path(path: Option<PathBuf>) -> Result<Self> {
        let file_path = match path {
            Some(p) => p,
            None => Self::history_file_path()?,
        };

        if !file_path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&file_path).with_context(|| {
            format!("Failed to read sync history from: {}", file_path.display())
        })?;

        let history: DispatchHistory = serde_json::from_str(&content).with_context(|| {
            format!("Failed to parse sync history JSON from: {}", file_path.display())
        })?;

        Ok(history)
    }

    pub fn load() -> Result<Self> {
        Self::from_path(None)
    }

    /// Save history to a custom path, or the default location when `None`.
    pub fn save_to(&self, path: Option<PathBuf>) -> Result<()> {
        let file_path = match path {
            Some(p) => p,
            None => Self::history_file_path()?,
        };

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create history directory: {}", parent.display())
            })?;
        }

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize sync history")?;

        fs::write(&file_path, content).with_context(|| {
            format!("Failed to write sync history to: {}", file_path.display())
        })?;

        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(None)
    }

    /// Prepend a record, rotate past MAX_HISTORY_SIZE and persist.
    pub fn add_record(&mut self, record: DispatchRecord, path: Option<PathBuf>) -> Result<()> {
        self.records.insert(0, record);

        if self.records.len() > MAX_HISTORY_SIZE {
            self.records.truncate(MAX_HISTORY_SIZE);
        }

        self.save_to(path)?;

        Ok(())
    }

    pub fn last_record(&self) -> Option<&DispatchRecord> {
        self.records.first()
    }

    pub fn list_records(&self) -> &[DispatchRecord] {
        &self.records
    }

    /// Clear all history and persist the empty state.
    pub fn clear(&mut self, path: Option<PathBuf>) -> Result<()> {
        self.records.clear();
        self.save_to(path)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for DispatchHistory {
    fn default() -> Self {
        Self::new()
    }
}
