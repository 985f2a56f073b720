//! Dispatch strategies.
//!
//! MCP servers sync through one bulk call the backend fans out itself; every
//! other kind is pushed artifact by artifact, registering discovered entries
//! on the way. Both shapes funnel every problem into failing
//! [`SyncOutcome`]s so a bad artifact or a dead backend can never abort the
//! rest of a batch.

use std::collections::{BTreeSet, HashSet};

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};

use crate::api::Backend;
use crate::model::{Artifact, ResourceKind, ScopeContext, SyncOutcome, Target};

/// How one kind loads its data and pushes a selected batch.
pub trait SyncStrategy {
    fn kind(&self) -> ResourceKind;

    /// Registered artifacts for the context.
    fn load_items(&self, ctx: &ScopeContext) -> Result<Vec<Artifact>>;

    /// Discovered artifacts, or `None` for a kind with no discovery step.
    fn discover_items(&self, ctx: &ScopeContext) -> Option<Result<Vec<Artifact>>>;

    fn load_targets(&self, ctx: &ScopeContext) -> Result<Vec<Target>>;

    /// Push every selected artifact to every selected target. Infallible by
    /// contract: errors come back as failing outcomes, never as `Err`.
    fn sync_selected(
        &self,
        selected: &BTreeSet<String>,
        artifacts: &[Artifact],
        targets: &BTreeSet<String>,
        ctx: &ScopeContext,
    ) -> Vec<SyncOutcome>;
}

/// The strategy for `kind`, borrowing the backend it dispatches through.
pub fn strategy_for(kind: ResourceKind, backend: &dyn Backend) -> Box<dyn SyncStrategy + '_> {
    match kind {
        ResourceKind::Server => Box::new(ServerStrategy { backend }),
        other => Box::new(ItemStrategy {
            backend,
            kind: other,
        }),
    }
}

/// Bulk shape: one `POST /api/sync` carries the whole batch.
struct ServerStrategy<'a> {
    backend: &'a dyn Backend,
}

impl SyncStrategy for ServerStrategy<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Server
    }

    fn load_items(&self, ctx: &ScopeContext) -> Result<Vec<Artifact>> {
        self.backend.list_items(ResourceKind::Server, ctx)
    }

    fn discover_items(&self, ctx: &ScopeContext) -> Option<Result<Vec<Artifact>>> {
        Some(self.backend.discover_items(ResourceKind::Server, ctx))
    }

    fn load_targets(&self, ctx: &ScopeContext) -> Result<Vec<Target>> {
        self.backend.list_targets(ResourceKind::Server, ctx)
    }

    fn sync_selected(
        &self,
        selected: &BTreeSet<String>,
        artifacts: &[Artifact],
        targets: &BTreeSet<String>,
        ctx: &ScopeContext,
    ) -> Vec<SyncOutcome> {
        // Selected names in list order; names that fell out of the list are
        // still sent, the backend skips unknowns.
        let listed: HashSet<&str> = artifacts.iter().map(|a| a.name.as_str()).collect();
        let mut names: Vec<String> = artifacts
            .iter()
            .filter(|a| selected.contains(&a.name))
            .map(|a| a.name.clone())
            .collect();
        names.extend(
            selected
                .iter()
                .filter(|name| !listed.contains(name.as_str()))
                .cloned(),
        );

        let target_keys: Vec<String> = targets.iter().cloned().collect();
        debug!(
            "bulk syncing {} servers to {} targets",
            names.len(),
            target_keys.len()
        );

        match self.backend.sync_servers(&names, &target_keys, ctx) {
            Ok(outcomes) => outcomes,
            Err(error) => {
                warn!("bulk sync call failed: {error:#}");
                target_keys
                    .iter()
                    .map(|target| SyncOutcome::failure(target, format!("{error:#}")))
                    .collect()
            }
        }
    }
}

/// Per-artifact shape: register if needed, then push, one artifact at a
/// time in merged-list order.
struct ItemStrategy<'a> {
    backend: &'a dyn Backend,
    kind: ResourceKind,
}

impl ItemStrategy<'_> {
    fn sync_one(
        &self,
        artifact: &Artifact,
        targets: &[String],
        ctx: &ScopeContext,
    ) -> Result<Vec<SyncOutcome>> {
        let id = match &artifact.id {
            Some(id) => id.clone(),
            None => {
                // Discovered-only artifacts get registered first so the
                // backend has something addressable to push.
                debug!(
                    "registering discovered {} '{}' before sync",
                    self.kind.display_name(),
                    artifact.name
                );
                let created = self
                    .backend
                    .create_item(self.kind, artifact, ctx)
                    .with_context(|| format!("failed to register '{}'", artifact.name))?;
                created
                    .id
                    .ok_or_else(|| anyhow!("backend returned no id for '{}'", artifact.name))?
            }
        };
        self.backend.sync_item(self.kind, &id, targets, ctx)
    }
}

impl SyncStrategy for ItemStrategy<'_> {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn load_items(&self, ctx: &ScopeContext) -> Result<Vec<Artifact>> {
        self.backend.list_items(self.kind, ctx)
    }

    fn discover_items(&self, ctx: &ScopeContext) -> Option<Result<Vec<Artifact>>> {
        Some(self.backend.discover_items(self.kind, ctx))
    }

    fn load_targets(&self, ctx: &ScopeContext) -> Result<Vec<Target>> {
        self.backend.list_targets(self.kind, ctx)
    }

    fn sync_selected(
        &self,
        selected: &BTreeSet<String>,
        artifacts: &[Artifact],
        targets: &BTreeSet<String>,
        ctx: &ScopeContext,
    ) -> Vec<SyncOutcome> {
        let target_keys: Vec<String> = targets.iter().cloned().collect();
        let mut outcomes = Vec::new();
        let mut remaining: BTreeSet<&str> = selected.iter().map(String::as_str).collect();

        for artifact in artifacts.iter().filter(|a| selected.contains(&a.name)) {
            remaining.remove(artifact.name.as_str());
            match self.sync_one(artifact, &target_keys, ctx) {
                Ok(results) => {
                    outcomes.extend(results.into_iter().map(|r| r.labeled(&artifact.name)));
                }
                Err(error) => {
                    warn!(
                        "{} '{}' failed to sync: {error:#}",
                        self.kind.display_name(),
                        artifact.name
                    );
                    outcomes.push(SyncOutcome::failure(&artifact.name, format!("{error:#}")));
                }
            }
        }

        // Selected names that vanished from the list still get a result so
        // the batch report stays complete.
        for name in remaining {
            outcomes.push(SyncOutcome::failure(
                name,
                "no longer in the artifact list; refresh and retry",
            ));
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browse::RegistryPage;
    use crate::model::Project;
    use anyhow::bail;
    use std::cell::RefCell;

    #[derive(Default)]
    struct ScriptedBackend {
        calls: RefCell<Vec<String>>,
        fail_sync_ids: Vec<String>,
        fail_create: bool,
        create_without_id: bool,
        fail_bulk: bool,
    }

    impl Backend for ScriptedBackend {
        fn list_items(&self, _: ResourceKind, _: &ScopeContext) -> Result<Vec<Artifact>> {
            Ok(vec![])
        }

        fn discover_items(&self, _: ResourceKind, _: &ScopeContext) -> Result<Vec<Artifact>> {
            Ok(vec![])
        }

        fn list_targets(&self, _: ResourceKind, _: &ScopeContext) -> Result<Vec<Target>> {
            Ok(vec![])
        }

        fn create_item(
            &self,
            _: ResourceKind,
            artifact: &Artifact,
            _: &ScopeContext,
        ) -> Result<Artifact> {
            self.calls.borrow_mut().push(format!("create {}", artifact.name));
            if self.fail_create {
                bail!("registry write refused");
            }
            let mut created = artifact.clone();
            if !self.create_without_id {
                created.id = Some(format!("id-{}", artifact.name));
            }
            Ok(created)
        }

        fn delete_item(&self, _: ResourceKind, _: &str, _: &ScopeContext) -> Result<()> {
            bail!("not used here")
        }

        fn sync_servers(
            &self,
            names: &[String],
            targets: &[String],
            _: &ScopeContext,
        ) -> Result<Vec<SyncOutcome>> {
            self.calls
                .borrow_mut()
                .push(format!("bulk [{}] -> [{}]", names.join(","), targets.join(",")));
            if self.fail_bulk {
                bail!("backend unreachable");
            }
            Ok(targets
                .iter()
                .map(|target| SyncOutcome {
                    target: target.clone(),
                    success: true,
                    message: format!("wrote {} servers", names.len()),
                })
                .collect())
        }

        fn sync_item(
            &self,
            _: ResourceKind,
            id: &str,
            targets: &[String],
            _: &ScopeContext,
        ) -> Result<Vec<SyncOutcome>> {
            self.calls.borrow_mut().push(format!("sync {id}"));
            if self.fail_sync_ids.iter().any(|f| f == id) {
                bail!("disk full");
            }
            Ok(targets
                .iter()
                .map(|target| SyncOutcome {
                    target: target.clone(),
                    success: true,
                    message: "written".to_string(),
                })
                .collect())
        }

        fn list_projects(&self) -> Result<Vec<Project>> {
            Ok(vec![])
        }

        fn add_project(&self, _: &str, _: &str) -> Result<Project> {
            bail!("not used here")
        }

        fn remove_project(&self, _: &str) -> Result<()> {
            bail!("not used here")
        }

        fn search_registry(&self, _: &str, _: Option<&str>, _: u32) -> Result<RegistryPage> {
            bail!("not used here")
        }

        fn import_registry_server(&self, _: &str, _: &ScopeContext) -> Result<Artifact> {
            bail!("not used here")
        }
    }

    fn skill(name: &str, id: Option<&str>) -> Artifact {
        let mut artifact = Artifact::new(name);
        artifact.id = id.map(|s| s.to_string());
        artifact
    }

    fn selection(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_item_dispatch_follows_list_order_and_labels_outcomes() {
        let backend = ScriptedBackend::default();
        let strategy = strategy_for(ResourceKind::Skill, &backend);

        let artifacts = vec![
            skill("alpha", Some("1")),
            skill("beta", Some("2")),
            skill("gamma", Some("3")),
        ];
        let outcomes = strategy.sync_selected(
            &selection(&["gamma", "alpha"]),
            &artifacts,
            &selection(&["claude-code"]),
            &ScopeContext::global(),
        );

        assert_eq!(
            backend.calls.borrow().as_slice(),
            ["sync 1", "sync 3"],
            "dispatch must follow merged-list order, not selection order"
        );
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].target, "alpha → claude-code");
        assert_eq!(outcomes[1].target, "gamma → claude-code");
    }

    #[test]
    fn test_one_failing_artifact_does_not_stop_the_batch() {
        let backend = ScriptedBackend {
            fail_sync_ids: vec!["2".to_string()],
            ..ScriptedBackend::default()
        };
        let strategy = strategy_for(ResourceKind::Workflow, &backend);

        let artifacts = vec![
            skill("alpha", Some("1")),
            skill("beta", Some("2")),
            skill("gamma", Some("3")),
        ];
        let outcomes = strategy.sync_selected(
            &selection(&["alpha", "beta", "gamma"]),
            &artifacts,
            &selection(&["cursor"]),
            &ScopeContext::global(),
        );

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].target, "beta");
        assert!(outcomes[1].message.contains("disk full"));
        assert!(outcomes[2].success, "gamma still syncs after beta fails");
    }

    #[test]
    fn test_discovered_artifact_is_registered_before_sync() {
        let backend = ScriptedBackend::default();
        let strategy = strategy_for(ResourceKind::Skill, &backend);

        let artifacts = vec![skill("fresh", None)];
        let outcomes = strategy.sync_selected(
            &selection(&["fresh"]),
            &artifacts,
            &selection(&["claude-code"]),
            &ScopeContext::global(),
        );

        assert_eq!(backend.calls.borrow().as_slice(), ["create fresh", "sync id-fresh"]);
        assert!(outcomes[0].success);
    }

    #[test]
    fn test_registered_artifact_skips_creation() {
        let backend = ScriptedBackend::default();
        let strategy = strategy_for(ResourceKind::Agent, &backend);

        strategy.sync_selected(
            &selection(&["kept"]),
            &[skill("kept", Some("42"))],
            &selection(&["claude-code"]),
            &ScopeContext::global(),
        );

        assert_eq!(backend.calls.borrow().as_slice(), ["sync 42"]);
    }

    #[test]
    fn test_failed_registration_becomes_a_failing_outcome() {
        let backend = ScriptedBackend {
            fail_create: true,
            ..ScriptedBackend::default()
        };
        let strategy = strategy_for(ResourceKind::Skill, &backend);

        let outcomes = strategy.sync_selected(
            &selection(&["fresh"]),
            &[skill("fresh", None)],
            &selection(&["claude-code"]),
            &ScopeContext::global(),
        );

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].success);
        assert_eq!(outcomes[0].target, "fresh");
        assert!(outcomes[0].message.contains("registry write refused"));
        assert_eq!(backend.calls.borrow().as_slice(), ["create fresh"]);
    }

    #[test]
    fn test_registration_without_id_fails_that_artifact() {
        let backend = ScriptedBackend {
            create_without_id: true,
            ..ScriptedBackend::default()
        };
        let strategy = strategy_for(ResourceKind::Skill, &backend);

        let outcomes = strategy.sync_selected(
            &selection(&["fresh"]),
            &[skill("fresh", None)],
            &selection(&["claude-code"]),
            &ScopeContext::global(),
        );

        assert!(!outcomes[0].success);
        assert!(outcomes[0].message.contains("no id"));
    }

    #[test]
    fn test_vanished_selection_gets_a_synthetic_failure() {
        let backend = ScriptedBackend::default();
        let strategy = strategy_for(ResourceKind::Skill, &backend);

        let outcomes = strategy.sync_selected(
            &selection(&["present", "ghost"]),
            &[skill("present", Some("1"))],
            &selection(&["claude-code"]),
            &ScopeContext::global(),
        );

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].target, "ghost");
    }

    #[test]
    fn test_bulk_dispatch_sends_one_call_in_list_order() {
        let backend = ScriptedBackend::default();
        let strategy = strategy_for(ResourceKind::Server, &backend);

        let artifacts = vec![
            skill("zeta", None),
            skill("alpha", Some("1")),
            skill("mid", None),
        ];
        let outcomes = strategy.sync_selected(
            &selection(&["alpha", "zeta", "ghost"]),
            &artifacts,
            &selection(&["vscode", "cursor"]),
            &ScopeContext::global(),
        );

        let calls = backend.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], "bulk [zeta,alpha,ghost] -> [cursor,vscode]");
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn test_bulk_failure_fails_every_selected_target() {
        let backend = ScriptedBackend {
            fail_bulk: true,
            ..ScriptedBackend::default()
        };
        let strategy = strategy_for(ResourceKind::Server, &backend);

        let outcomes = strategy.sync_selected(
            &selection(&["fs"]),
            &[skill("fs", Some("1"))],
            &selection(&["vscode", "cursor"]),
            &ScopeContext::global(),
        );

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| !o.success));
        assert!(outcomes[0].message.contains("backend unreachable"));
    }
}
