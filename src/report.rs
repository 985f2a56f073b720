use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::model::{ResourceKind, Scope, ScopeContext, SyncOutcome};

/// Success/failure counts for one dispatched batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub ok_count: usize,
    pub fail_count: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[SyncOutcome]) -> Self {
        let ok_count = outcomes.iter().filter(|o| o.success).count();
        BatchSummary {
            ok_count,
            fail_count: outcomes.len() - ok_count,
        }
    }

    pub fn total(&self) -> usize {
        self.ok_count + self.fail_count
    }

    /// True when nothing in the batch failed.
    pub fn is_clean(&self) -> bool {
        self.fail_count == 0
    }
}

/// Snapshot of the most recent dispatch: what was synced, where, and how
/// each write went. Persisted so `opensync report` works after the fact.
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncReport {
    /// ISO 8601 timestamp of the dispatch.
    pub timestamp: String,
    pub kind: ResourceKind,
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub ok_count: usize,
    pub fail_count: usize,
    pub outcomes: Vec<SyncOutcome>,
}

impl SyncReport {
    pub fn from_outcomes(
        kind: ResourceKind,
        ctx: &ScopeContext,
        outcomes: Vec<SyncOutcome>,
    ) -> Self {
        let summary = BatchSummary::from_outcomes(&outcomes);
        SyncReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind,
            scope: ctx.scope,
            project: ctx.project_name().map(|name| name.to_string()),
            ok_count: summary.ok_count,
            fail_count: summary.fail_count,
            outcomes,
        }
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            ok_count: self.ok_count,
            fail_count: self.fail_count,
        }
    }

    /// Generate a markdown report
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# OpenSync Report\n\n");
        output.push_str(&format!("**Generated:** {}\n", self.timestamp));
        output.push_str(&format!("**Kind:** {}\n", self.kind));
        match &self.project {
            Some(project) => {
                output.push_str(&format!("**Scope:** {} ({})\n", self.scope, project))
            }
            None => output.push_str(&format!("**Scope:** {}\n", self.scope)),
        }
        output.push_str(&format!(
            "**Results:** {} succeeded, {} failed\n\n",
            self.ok_count, self.fail_count
        ));

        if self.outcomes.is_empty() {
            output.push_str("Nothing was synced.\n");
            return output;
        }

        output.push_str("## Outcomes\n\n");
        for outcome in &self.outcomes {
            let mark = if outcome.success { "OK" } else { "FAILED" };
            if outcome.message.is_empty() {
                output.push_str(&format!("- **{}** `{}`\n", mark, outcome.target));
            } else {
                output.push_str(&format!(
                    "- **{}** `{}`: {}\n",
                    mark, outcome.target, outcome.message
                ));
            }
        }
        output.push('\n');

        output
    }

    /// Generate a JSON report
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report to JSON")
    }

    /// Print a colored console summary. Partial failure gets a warning
    /// header, total failure an error header.
    pub fn print_summary(&self) {
        let summary = self.summary();
        let header = if summary.is_clean() {
            "=== Sync Complete ===".bold().green()
        } else if summary.ok_count == 0 {
            "=== Sync Failed ===".bold().red()
        } else {
            "=== Sync Completed With Errors ===".bold().yellow()
        };
        println!("\n{header}");

        println!("{}: {}", "Kind".bold(), self.kind);
        match &self.project {
            Some(project) => println!("{}: {} ({})", "Scope".bold(), self.scope, project),
            None => println!("{}: {}", "Scope".bold(), self.scope),
        }
        println!(
            "{}: {} succeeded, {}",
            "Results".bold(),
            summary.ok_count.to_string().green(),
            if summary.fail_count == 0 {
                "0 failed".to_string()
            } else {
                format!("{} failed", summary.fail_count).red().to_string()
            }
        );

        for outcome in &self.outcomes {
            let mark = if outcome.success {
                "✓".green()
            } else {
                "✗".red()
            };
            if outcome.message.is_empty() {
                println!("  {mark} {}", outcome.target.bold());
            } else {
                println!(
                    "  {mark} {} {}",
                    outcome.target.bold(),
                    outcome.message.dimmed()
                );
            }
        }
        println!();
    }

    /// Save report to file
    pub fn save(&self, path: &Path, format: &str) -> Result<()> {
        let content = match format.to_lowercase().as_str() {
            "json" => self.to_json()?,
            "markdown" | "md" => self.to_markdown(),
            _ => return Err(anyhow::anyhow!("Unsupported format: {format}")),
        };

        fs::write(path, content)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        println!(
            "{} {}",
            "Report saved to:".green().bold(),
            path.display().to_string().cyan()
        );

        Ok(())
    }
}

/// Render the last recorded sync report to stdout or a file.
pub fn generate_report(format: &str, output: Option<&Path>) -> Result<()> {
    let report = load_latest_report()?;

    if let Some(output_path) = output {
        report.save(output_path, format)?;
    } else {
        match format.to_lowercase().as_str() {
            "json" => println!("{}", report.to_json()?),
            "markdown" | "md" => println!("{}", report.to_markdown()),
            _ => report.print_summary(),
        }
    }

    Ok(())
}

/// Load the report written by the most recent dispatch.
pub fn load_latest_report() -> Result<SyncReport> {
    let report_path = crate::config::ConfigManager::report_path()?;

    if !report_path.exists() {
        anyhow::bail!("No sync has been recorded yet; run `opensync sync` first");
    }

    let content = fs::read_to_string(&report_path)
        .with_context(|| format!("Failed to read report from {}", report_path.display()))?;

    let report: SyncReport =
        serde_json::from_str(&content).context("Failed to parse sync report")?;

    Ok(report)
}

/// Persist `report` as the latest one.
pub fn save_latest_report(report: &SyncReport) -> Result<()> {
    crate::config::ConfigManager::ensure_config_dir()?;
    let report_path = crate::config::ConfigManager::report_path()?;

    fs::write(&report_path, report.to_json()?)
        .with_context(|| format!("Failed to write report to {}", report_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(target: &str, success: bool, message: &str) -> SyncOutcome {
        SyncOutcome {
            target: target.to_string(),
            success,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let outcomes = vec![
            outcome("vscode", true, ""),
            outcome("cursor", false, "config locked"),
            outcome("claude-code", true, ""),
        ];

        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(summary.ok_count, 2);
        assert_eq!(summary.fail_count, 1);
        assert_eq!(summary.total(), 3);
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_empty_batch_is_clean() {
        let summary = BatchSummary::from_outcomes(&[]);
        assert!(summary.is_clean());
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_markdown_lists_each_outcome() {
        let report = SyncReport::from_outcomes(
            ResourceKind::Skill,
            &ScopeContext::global(),
            vec![
                outcome("pdf-tools → claude-code", true, "written"),
                outcome("pdf-tools → cursor", false, "config missing"),
            ],
        );

        let markdown = report.to_markdown();
        assert!(markdown.contains("# OpenSync Report"));
        assert!(markdown.contains("1 succeeded, 1 failed"));
        assert!(markdown.contains("**OK** `pdf-tools → claude-code`"));
        assert!(markdown.contains("**FAILED** `pdf-tools → cursor`: config missing"));
    }

    #[test]
    fn test_json_round_trip() {
        let report = SyncReport::from_outcomes(
            ResourceKind::Server,
            &ScopeContext::global(),
            vec![outcome("vscode", true, "wrote 2 servers")],
        );

        let json = report.to_json().unwrap();
        let parsed: SyncReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kind, ResourceKind::Server);
        assert_eq!(parsed.ok_count, 1);
        assert_eq!(parsed.outcomes.len(), 1);
    }

    #[test]
    fn test_save_rejects_unknown_format() {
        let report =
            SyncReport::from_outcomes(ResourceKind::Server, &ScopeContext::global(), vec![]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xml");

        assert!(report.save(&path, "xml").is_err());
    }

    #[test]
    fn test_save_markdown_to_file() {
        let report =
            SyncReport::from_outcomes(ResourceKind::Server, &ScopeContext::global(), vec![]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");

        report.save(&path, "md").unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("Nothing was synced"));
    }
}
