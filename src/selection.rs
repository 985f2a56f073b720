//! Selection state for one sync view: which artifacts and which targets the
//! user has picked, scoped to exactly one (kind, scope, project) context.

use std::collections::BTreeSet;

use crate::model::{ResourceKind, Scope};

/// Identity of the context a selection belongs to. Selections never survive
/// a change of any of the three parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionContext {
    pub kind: ResourceKind,
    pub scope: Scope,
    pub project: Option<String>,
}

#[derive(Debug, Default)]
pub struct SelectionState {
    context: Option<SelectionContext>,
    artifacts: BTreeSet<String>,
    targets: BTreeSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        SelectionState::default()
    }

    /// Binds the selection to `context`, wiping both sets if the context
    /// differs from the current one. Returns true when a wipe happened.
    pub fn ensure_context(&mut self, context: SelectionContext) -> bool {
        if self.context.as_ref() == Some(&context) {
            return false;
        }
        self.context = Some(context);
        self.artifacts.clear();
        self.targets.clear();
        true
    }

    /// Flips one artifact name; returns whether it is selected afterwards.
    pub fn toggle_artifact(&mut self, name: &str) -> bool {
        toggle(&mut self.artifacts, name)
    }

    /// Flips one target key; returns whether it is selected afterwards.
    pub fn toggle_target(&mut self, key: &str) -> bool {
        toggle(&mut self.targets, key)
    }

    /// Select-all toggle over artifact names: if everything in `all` is
    /// already selected the whole set is cleared, otherwise the selection
    /// becomes exactly `all`.
    pub fn select_all_artifacts(&mut self, all: &[String]) {
        select_all(&mut self.artifacts, all);
    }

    /// Select-all toggle over the available target keys, same symmetry as
    /// [`select_all_artifacts`](Self::select_all_artifacts).
    pub fn select_all_targets(&mut self, available: &[String]) {
        select_all(&mut self.targets, available);
    }

    pub fn artifacts(&self) -> &BTreeSet<String> {
        &self.artifacts
    }

    pub fn targets(&self) -> &BTreeSet<String> {
        &self.targets
    }

    pub fn is_artifact_selected(&self, name: &str) -> bool {
        self.artifacts.contains(name)
    }

    pub fn is_target_selected(&self, key: &str) -> bool {
        self.targets.contains(key)
    }

    pub fn clear(&mut self) {
        self.artifacts.clear();
        self.targets.clear();
    }
}

fn toggle(set: &mut BTreeSet<String>, key: &str) -> bool {
    if set.remove(key) {
        false
    } else {
        set.insert(key.to_string());
        true
    }
}

fn select_all(set: &mut BTreeSet<String>, all: &[String]) {
    if all.iter().all(|key| set.contains(key)) {
        set.clear();
    } else {
        set.clear();
        set.extend(all.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(kind: ResourceKind, scope: Scope, project: Option<&str>) -> SelectionContext {
        SelectionContext {
            kind,
            scope,
            project: project.map(|p| p.to_string()),
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_toggle_roundtrip() {
        let mut state = SelectionState::new();
        assert!(state.toggle_artifact("fs"));
        assert!(state.is_artifact_selected("fs"));
        assert!(!state.toggle_artifact("fs"));
        assert!(!state.is_artifact_selected("fs"));
    }

    #[test]
    fn test_context_change_wipes_both_sets() {
        let mut state = SelectionState::new();
        state.ensure_context(context(ResourceKind::Server, Scope::Global, None));
        state.toggle_artifact("fs");
        state.toggle_target("vscode");

        let wiped = state.ensure_context(context(ResourceKind::Server, Scope::Project, Some("demo")));
        assert!(wiped);
        assert!(state.artifacts().is_empty());
        assert!(state.targets().is_empty());
    }

    #[test]
    fn test_same_context_keeps_selection() {
        let mut state = SelectionState::new();
        state.ensure_context(context(ResourceKind::Skill, Scope::Global, None));
        state.toggle_artifact("pdf-tools");

        let wiped = state.ensure_context(context(ResourceKind::Skill, Scope::Global, None));
        assert!(!wiped);
        assert!(state.is_artifact_selected("pdf-tools"));
    }

    #[test]
    fn test_kind_change_alone_invalidates() {
        let mut state = SelectionState::new();
        state.ensure_context(context(ResourceKind::Skill, Scope::Global, None));
        state.toggle_target("claude-code");

        assert!(state.ensure_context(context(ResourceKind::Workflow, Scope::Global, None)));
        assert!(state.targets().is_empty());
    }

    #[test]
    fn test_select_all_toggles_symmetrically() {
        let all = names(&["a", "b", "c"]);
        let mut state = SelectionState::new();

        state.select_all_artifacts(&all);
        assert_eq!(state.artifacts().len(), 3);

        // Everything already selected, so the same call clears.
        state.select_all_artifacts(&all);
        assert!(state.artifacts().is_empty());
    }

    #[test]
    fn test_select_all_from_partial_selects_exactly_the_list() {
        let all = names(&["a", "b", "c"]);
        let mut state = SelectionState::new();
        state.toggle_artifact("a");
        state.toggle_artifact("zombie");

        state.select_all_artifacts(&all);
        assert_eq!(
            state.artifacts().iter().cloned().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_select_all_clears_stale_extras_when_full() {
        let all = names(&["a", "b"]);
        let mut state = SelectionState::new();
        state.toggle_artifact("a");
        state.toggle_artifact("b");
        state.toggle_artifact("gone");

        // Every listed name is selected, so this is a deselect-all.
        state.select_all_artifacts(&all);
        assert!(state.artifacts().is_empty());
    }

    #[test]
    fn test_select_all_on_empty_list_is_a_no_op() {
        let mut state = SelectionState::new();
        state.select_all_targets(&[]);
        assert!(state.targets().is_empty());
    }
}
