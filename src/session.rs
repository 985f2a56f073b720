//! One working view over a (kind, scope, project) context: the merged
//! artifact list, the target catalog, the live selection and dispatch.

use anyhow::{bail, Result};
use log::{info, warn};

use crate::api::Backend;
use crate::catalog::{self, TargetGroup};
use crate::model::{Artifact, ResourceKind, ScopeContext, SyncOutcome, Target};
use crate::reconcile::reconcile;
use crate::selection::{SelectionContext, SelectionState};
use crate::strategy::strategy_for;

pub struct SyncSession<'a> {
    backend: &'a dyn Backend,
    kind: ResourceKind,
    ctx: ScopeContext,
    artifacts: Vec<Artifact>,
    targets: Vec<Target>,
    selection: SelectionState,
    syncing: bool,
}

impl<'a> SyncSession<'a> {
    /// An empty session; call [`reload`](Self::reload) to populate it.
    pub fn new(backend: &'a dyn Backend, kind: ResourceKind, ctx: ScopeContext) -> Self {
        let mut session = SyncSession {
            backend,
            kind,
            ctx,
            artifacts: Vec::new(),
            targets: Vec::new(),
            selection: SelectionState::new(),
            syncing: false,
        };
        session.selection.ensure_context(session.selection_context());
        session
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn context(&self) -> &ScopeContext {
        &self.ctx
    }

    /// The merged (discovered + registered) artifact list, insertion order.
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Target catalog sectioned the way this kind displays it.
    pub fn target_groups(&self) -> Vec<TargetGroup> {
        catalog::group_targets(&self.targets, self.kind, self.ctx.scope)
    }

    /// Switch the resource kind, dropping data and selections.
    pub fn set_kind(&mut self, kind: ResourceKind) -> Result<()> {
        if kind == self.kind {
            return Ok(());
        }
        self.kind = kind;
        self.switch_context()
    }

    /// Switch scope/project, dropping data and selections.
    pub fn set_context(&mut self, ctx: ScopeContext) -> Result<()> {
        if ctx == self.ctx {
            return Ok(());
        }
        self.ctx = ctx;
        self.switch_context()
    }

    fn selection_context(&self) -> SelectionContext {
        SelectionContext {
            kind: self.kind,
            scope: self.ctx.scope,
            project: self.ctx.project_name().map(|name| name.to_string()),
        }
    }

    fn switch_context(&mut self) -> Result<()> {
        // Data from the previous context must never show through the new one.
        self.artifacts.clear();
        self.targets.clear();
        if self.selection.ensure_context(self.selection_context()) {
            info!(
                "selection reset for kind={} scope={}",
                self.kind, self.ctx.scope
            );
        }
        self.reload()
    }

    /// Refetch targets and both artifact pools. Each fetch that fails is
    /// logged and leaves its previous data in place; the first error is
    /// returned after all fetches were attempted.
    pub fn reload(&mut self) -> Result<()> {
        let strategy = strategy_for(self.kind, self.backend);
        let mut first_error: Option<anyhow::Error> = None;

        match strategy.load_targets(&self.ctx) {
            Ok(targets) => self.targets = targets,
            Err(error) => {
                warn!("loading {} targets failed: {error:#}", self.kind);
                first_error.get_or_insert(error);
            }
        }

        let registered = match strategy.load_items(&self.ctx) {
            Ok(items) => Some(items),
            Err(error) => {
                warn!("loading registered {}s failed: {error:#}", self.kind);
                first_error.get_or_insert(error);
                None
            }
        };

        let discovered = match strategy.discover_items(&self.ctx) {
            None => Some(Vec::new()),
            Some(Ok(items)) => Some(items),
            Some(Err(error)) => {
                warn!("discovering {}s failed: {error:#}", self.kind);
                first_error.get_or_insert(error);
                None
            }
        };

        // The merged list is only rebuilt when both pools arrived; a half
        // rebuild would drop provenance or registered-only entries.
        if let (Some(discovered), Some(registered)) = (discovered, registered) {
            self.artifacts = reconcile(discovered, registered);
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub fn toggle_artifact(&mut self, name: &str) -> bool {
        self.selection.toggle_artifact(name)
    }

    pub fn toggle_target(&mut self, key: &str) -> bool {
        self.selection.toggle_target(key)
    }

    /// Select-all toggle over every artifact in the merged list.
    pub fn select_all_artifacts(&mut self) {
        let all: Vec<String> = self.artifacts.iter().map(|a| a.name.clone()).collect();
        self.selection.select_all_artifacts(&all);
    }

    /// Select-all toggle over the applicable, available targets only.
    pub fn select_all_targets(&mut self) {
        let available = catalog::available_keys(&self.targets, self.ctx.scope);
        self.selection.select_all_targets(&available);
    }

    /// Push the current selection. Returns the complete outcome list; a
    /// partially failed batch is still `Ok`. Refuses to run re-entrantly or
    /// with an empty selection, and refreshes the view afterwards because a
    /// sync changes sources and ids server-side.
    pub fn dispatch(&mut self) -> Result<Vec<SyncOutcome>> {
        if self.syncing {
            bail!("a sync is already running");
        }
        if self.selection.artifacts().is_empty() {
            bail!("no {}s selected", self.kind.display_name());
        }
        if self.selection.targets().is_empty() {
            bail!("no targets selected");
        }

        info!(
            "dispatching {} {}s to {} targets (scope={})",
            self.selection.artifacts().len(),
            self.kind,
            self.selection.targets().len(),
            self.ctx.scope
        );

        self.syncing = true;
        let strategy = strategy_for(self.kind, self.backend);
        let outcomes = strategy.sync_selected(
            self.selection.artifacts(),
            &self.artifacts,
            self.selection.targets(),
            &self.ctx,
        );
        self.syncing = false;

        if let Err(error) = self.reload() {
            warn!("refresh after sync failed: {error:#}");
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browse::RegistryPage;
    use crate::model::Project;
    use anyhow::bail;

    /// Backend with one registered skill and one target, enough to make a
    /// selection dispatchable.
    struct OneItemBackend;

    impl Backend for OneItemBackend {
        fn list_items(&self, _: ResourceKind, _: &ScopeContext) -> Result<Vec<Artifact>> {
            let mut artifact = Artifact::new("only");
            artifact.id = Some("1".to_string());
            Ok(vec![artifact])
        }

        fn discover_items(&self, _: ResourceKind, _: &ScopeContext) -> Result<Vec<Artifact>> {
            Ok(vec![])
        }

        fn list_targets(&self, _: ResourceKind, _: &ScopeContext) -> Result<Vec<Target>> {
            Ok(vec![serde_json::from_value(
                serde_json::json!({"name": "claude-code", "display_name": "Claude Code"}),
            )
            .unwrap()])
        }

        fn create_item(&self, _: ResourceKind, _: &Artifact, _: &ScopeContext) -> Result<Artifact> {
            bail!("unused")
        }

        fn delete_item(&self, _: ResourceKind, _: &str, _: &ScopeContext) -> Result<()> {
            bail!("unused")
        }

        fn sync_servers(
            &self,
            _: &[String],
            _: &[String],
            _: &ScopeContext,
        ) -> Result<Vec<SyncOutcome>> {
            bail!("unused")
        }

        fn sync_item(
            &self,
            _: ResourceKind,
            _: &str,
            targets: &[String],
            _: &ScopeContext,
        ) -> Result<Vec<SyncOutcome>> {
            Ok(targets
                .iter()
                .map(|target| SyncOutcome {
                    target: target.clone(),
                    success: true,
                    message: String::new(),
                })
                .collect())
        }

        fn list_projects(&self) -> Result<Vec<Project>> {
            Ok(vec![])
        }

        fn add_project(&self, _: &str, _: &str) -> Result<Project> {
            bail!("unused")
        }

        fn remove_project(&self, _: &str) -> Result<()> {
            bail!("unused")
        }

        fn search_registry(&self, _: &str, _: Option<&str>, _: u32) -> Result<RegistryPage> {
            bail!("unused")
        }

        fn import_registry_server(&self, _: &str, _: &ScopeContext) -> Result<Artifact> {
            bail!("unused")
        }
    }

    #[test]
    fn test_dispatch_refuses_to_reenter() {
        let backend = OneItemBackend;
        let mut session = SyncSession::new(&backend, ResourceKind::Skill, ScopeContext::global());
        session.reload().unwrap();
        session.toggle_artifact("only");
        session.toggle_target("claude-code");

        session.syncing = true;
        let error = session.dispatch().unwrap_err();
        assert!(error.to_string().contains("already running"));
    }

    #[test]
    fn test_dispatch_refuses_empty_selection() {
        let backend = OneItemBackend;
        let mut session = SyncSession::new(&backend, ResourceKind::Skill, ScopeContext::global());
        session.reload().unwrap();

        let error = session.dispatch().unwrap_err();
        assert!(error.to_string().contains("no skills selected"));

        session.toggle_artifact("only");
        let error = session.dispatch().unwrap_err();
        assert!(error.to_string().contains("no targets selected"));
    }

    #[test]
    fn test_dispatch_clears_the_guard_afterwards() {
        let backend = OneItemBackend;
        let mut session = SyncSession::new(&backend, ResourceKind::Skill, ScopeContext::global());
        session.reload().unwrap();
        session.toggle_artifact("only");
        session.toggle_target("claude-code");

        let outcomes = session.dispatch().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(!session.syncing);

        // Selection survives within the same context, so a second run works.
        assert!(session.dispatch().is_ok());
    }
}
