//! Target catalog: which destinations a kind can sync into, how they are
//! grouped for display, and which of them are actually selectable.

use crate::model::{ResourceKind, Scope, Target, TargetCategory};

/// How a kind's targets are sectioned for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetGroupingMode {
    /// Server targets: sectioned by tool category, fixed order.
    Category,
    /// Content targets: native-support tools first, config-file tools after.
    Native,
    /// No sectioning at all.
    Flat,
}

impl TargetGroupingMode {
    pub fn for_kind(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Server => TargetGroupingMode::Category,
            ResourceKind::Skill | ResourceKind::Workflow | ResourceKind::Agent => {
                TargetGroupingMode::Native
            }
            ResourceKind::LlmProvider => TargetGroupingMode::Flat,
        }
    }
}

/// One display section of the catalog. `label` is `None` in flat mode.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGroup {
    pub label: Option<String>,
    pub targets: Vec<Target>,
}

/// A target with no scope restriction applies everywhere.
pub fn applies_to_scope(target: &Target, scope: Scope) -> bool {
    target.scope.is_none() || target.scope == Some(scope)
}

/// Selectable means the destination config is not known to be missing.
/// `config_exists` unset counts as available.
pub fn is_available(target: &Target) -> bool {
    target.config_exists != Some(false)
}

/// Keys of every applicable, available target, in catalog order. This is the
/// set "select all targets" operates on.
pub fn available_keys(targets: &[Target], scope: Scope) -> Vec<String> {
    targets
        .iter()
        .filter(|t| applies_to_scope(t, scope) && is_available(t))
        .map(|t| t.key().to_string())
        .collect()
}

/// Section the applicable targets for display. Empty sections are omitted;
/// the section order itself is fixed per mode.
pub fn group_targets(targets: &[Target], kind: ResourceKind, scope: Scope) -> Vec<TargetGroup> {
    let applicable: Vec<&Target> = targets
        .iter()
        .filter(|t| applies_to_scope(t, scope))
        .collect();

    match TargetGroupingMode::for_kind(kind) {
        TargetGroupingMode::Category => group_by_category(&applicable),
        TargetGroupingMode::Native => group_by_native(&applicable),
        TargetGroupingMode::Flat => {
            if applicable.is_empty() {
                Vec::new()
            } else {
                vec![TargetGroup {
                    label: None,
                    targets: applicable.into_iter().cloned().collect(),
                }]
            }
        }
    }
}

fn group_by_category(targets: &[&Target]) -> Vec<TargetGroup> {
    const ORDER: [TargetCategory; 4] = [
        TargetCategory::Editor,
        TargetCategory::Desktop,
        TargetCategory::Cli,
        TargetCategory::Plugin,
    ];

    let mut groups = Vec::new();
    for category in ORDER {
        let members: Vec<Target> = targets
            .iter()
            .filter(|t| t.category == Some(category))
            .map(|t| (*t).clone())
            .collect();
        if !members.is_empty() {
            groups.push(TargetGroup {
                label: Some(category.label().to_string()),
                targets: members,
            });
        }
    }

    // Targets without a category still have to show up somewhere.
    let leftovers: Vec<Target> = targets
        .iter()
        .filter(|t| t.category.is_none())
        .map(|t| (*t).clone())
        .collect();
    if !leftovers.is_empty() {
        groups.push(TargetGroup {
            label: Some("Other".to_string()),
            targets: leftovers,
        });
    }

    groups
}

fn group_by_native(targets: &[&Target]) -> Vec<TargetGroup> {
    let native: Vec<Target> = targets
        .iter()
        .filter(|t| t.is_native())
        .map(|t| (*t).clone())
        .collect();
    let embedded: Vec<Target> = targets
        .iter()
        .filter(|t| !t.is_native())
        .map(|t| (*t).clone())
        .collect();

    let mut groups = Vec::new();
    if !native.is_empty() {
        groups.push(TargetGroup {
            label: Some("Native support".to_string()),
            targets: native,
        });
    }
    if !embedded.is_empty() {
        groups.push(TargetGroup {
            label: Some("Config file".to_string()),
            targets: embedded,
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target(value: serde_json::Value) -> Target {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_category_groups_follow_fixed_order_and_skip_empty() {
        let targets = vec![
            target(json!({"name": "claude-desktop", "display_name": "Claude Desktop", "category": "desktop"})),
            target(json!({"name": "vscode", "display_name": "VS Code", "category": "editor"})),
            target(json!({"name": "claude-code", "display_name": "Claude Code", "category": "cli"})),
        ];

        let groups = group_targets(&targets, ResourceKind::Server, Scope::Global);
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_deref().unwrap()).collect();
        assert_eq!(labels, vec!["Editors", "Desktop apps", "CLI tools"]);
        assert_eq!(groups[0].targets[0].key(), "vscode");
    }

    #[test]
    fn test_uncategorized_server_target_lands_in_other() {
        let targets = vec![target(json!({"name": "mystery", "display_name": "Mystery"}))];
        let groups = group_targets(&targets, ResourceKind::Server, Scope::Global);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label.as_deref(), Some("Other"));
    }

    #[test]
    fn test_native_grouping_treats_missing_flag_as_embedded() {
        let targets = vec![
            target(json!({"name": "claude-code", "display_name": "Claude Code", "native": "true"})),
            target(json!({"name": "cursor", "display_name": "Cursor", "native": "false"})),
            target(json!({"name": "windsurf", "display_name": "Windsurf"})),
        ];

        let groups = group_targets(&targets, ResourceKind::Skill, Scope::Global);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label.as_deref(), Some("Native support"));
        assert_eq!(groups[0].targets.len(), 1);
        assert_eq!(groups[1].targets.len(), 2);
    }

    #[test]
    fn test_flat_grouping_is_one_unlabeled_section() {
        let targets = vec![
            target(json!({"name": "openai", "display_name": "OpenAI"})),
            target(json!({"name": "anthropic", "display_name": "Anthropic"})),
        ];

        let groups = group_targets(&targets, ResourceKind::LlmProvider, Scope::Global);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, None);
        assert_eq!(groups[0].targets.len(), 2);
    }

    #[test]
    fn test_scope_filter_applies_before_grouping() {
        let targets = vec![
            target(json!({"name": "everywhere", "display_name": "Everywhere", "category": "cli"})),
            target(json!({"name": "global-only", "display_name": "Global Only", "scope": "global", "category": "cli"})),
            target(json!({"name": "project-only", "display_name": "Project Only", "scope": "project", "category": "cli"})),
        ];

        let groups = group_targets(&targets, ResourceKind::Server, Scope::Project);
        assert_eq!(groups.len(), 1);
        let keys: Vec<&str> = groups[0].targets.iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["everywhere", "project-only"]);
    }

    #[test]
    fn test_available_keys_exclude_missing_configs_only() {
        let targets = vec![
            target(json!({"name": "present", "display_name": "Present", "config_exists": true})),
            target(json!({"name": "missing", "display_name": "Missing", "config_exists": false})),
            target(json!({"name": "unknown", "display_name": "Unknown"})),
            target(json!({"name": "wrong-scope", "display_name": "Wrong Scope", "scope": "project"})),
        ];

        assert_eq!(
            available_keys(&targets, Scope::Global),
            vec!["present".to_string(), "unknown".to_string()]
        );
    }
}
