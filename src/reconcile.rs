//! Merge discovered and registered artifacts into the single list a sync
//! session works from.
//!
//! Discovered artifacts come from scanning tool configs on disk; registered
//! ones live in the backend registry and carry a stable `id`. The two pools
//! overlap by `name`, and the registry copy is authoritative for everything
//! except provenance.

use std::collections::HashMap;

use crate::model::Artifact;

/// Merge the two pools, keyed by artifact name.
///
/// Rules:
/// - a name present in both pools yields one entry with the registered
///   payload and id, and `sources` as the union of both (discovered first),
/// - names only in one pool pass through unchanged,
/// - output order is insertion order: discovered list first, then
///   registered-only names in their own order,
/// - a duplicate name inside a single pool is last-write-wins.
pub fn reconcile(discovered: Vec<Artifact>, registered: Vec<Artifact>) -> Vec<Artifact> {
    let mut merged: Vec<Artifact> = Vec::with_capacity(discovered.len() + registered.len());
    let mut slots: HashMap<String, usize> = HashMap::new();

    for artifact in discovered {
        match slots.get(&artifact.name) {
            Some(&slot) => merged[slot] = artifact,
            None => {
                slots.insert(artifact.name.clone(), merged.len());
                merged.push(artifact);
            }
        }
    }

    for mut artifact in registered {
        match slots.get(&artifact.name) {
            Some(&slot) => {
                artifact.sources = union_sources(&merged[slot].sources, &artifact.sources);
                merged[slot] = artifact;
            }
            None => {
                slots.insert(artifact.name.clone(), merged.len());
                merged.push(artifact);
            }
        }
    }

    merged
}

/// Order-preserving union: everything in `first`, then anything in `second`
/// not already seen.
fn union_sources(first: &[String], second: &[String]) -> Vec<String> {
    let mut union: Vec<String> = Vec::with_capacity(first.len() + second.len());
    for source in first.iter().chain(second.iter()) {
        if !union.iter().any(|seen| seen == source) {
            union.push(source.clone());
        }
    }
    union
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn discovered(name: &str, sources: &[&str]) -> Artifact {
        let mut artifact = Artifact::new(name);
        artifact.sources = sources.iter().map(|s| s.to_string()).collect();
        artifact
    }

    fn registered(name: &str, id: &str, sources: &[&str]) -> Artifact {
        let mut artifact = discovered(name, sources);
        artifact.id = Some(id.to_string());
        artifact
    }

    #[test]
    fn test_overlapping_name_keeps_registered_payload_and_unions_sources() {
        let mut found = discovered("fs", &["vscode"]);
        found
            .payload
            .insert("command".to_string(), json!("old-command"));
        let mut stored = registered("fs", "7", &["opensync"]);
        stored.payload.insert("command".to_string(), json!("npx"));

        let merged = reconcile(vec![found], vec![stored]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id.as_deref(), Some("7"));
        assert_eq!(merged[0].sources, vec!["vscode", "opensync"]);
        assert_eq!(merged[0].payload.get("command").unwrap(), "npx");
    }

    #[test]
    fn test_disjoint_pools_pass_through_in_insertion_order() {
        let merged = reconcile(
            vec![discovered("a", &["cursor"]), discovered("b", &["vscode"])],
            vec![registered("c", "1", &["opensync"])],
        );

        let names: Vec<&str> = merged.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(!merged[0].is_registered());
        assert!(merged[2].is_registered());
    }

    #[test]
    fn test_merge_keeps_discovered_slot_position() {
        let merged = reconcile(
            vec![discovered("a", &["vscode"]), discovered("b", &["vscode"])],
            vec![registered("b", "2", &["opensync"]), registered("z", "3", &["opensync"])],
        );

        let names: Vec<&str> = merged.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "z"]);
        assert_eq!(merged[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn test_source_union_dedupes_and_preserves_order() {
        let merged = reconcile(
            vec![discovered("fs", &["vscode", "cursor"])],
            vec![registered("fs", "7", &["opensync", "vscode"])],
        );

        assert_eq!(merged[0].sources, vec!["vscode", "cursor", "opensync"]);
    }

    #[test]
    fn test_duplicate_name_in_one_pool_is_last_write_wins() {
        let mut first = discovered("dup", &["vscode"]);
        first.payload.insert("command".to_string(), json!("first"));
        let mut second = discovered("dup", &["cursor"]);
        second.payload.insert("command".to_string(), json!("second"));

        let merged = reconcile(vec![first, second], vec![]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].sources, vec!["cursor"]);
        assert_eq!(merged[0].payload.get("command").unwrap(), "second");
    }

    #[test]
    fn test_same_inputs_always_merge_the_same_way() {
        let found = vec![discovered("fs", &["vscode"]), discovered("x", &["cursor"])];
        let stored = vec![registered("fs", "7", &["opensync"])];

        let first = reconcile(found.clone(), stored.clone());
        let second = reconcile(found, stored);

        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_pools() {
        assert!(reconcile(vec![], vec![]).is_empty());

        let only_registered = reconcile(vec![], vec![registered("x", "1", &["opensync"])]);
        assert_eq!(only_registered.len(), 1);

        let only_discovered = reconcile(vec![discovered("y", &["vscode"])], vec![]);
        assert_eq!(only_discovered.len(), 1);
    }

    #[test]
    fn test_registered_without_sources_keeps_discovered_provenance() {
        let merged = reconcile(
            vec![discovered("fs", &["vscode"])],
            vec![registered("fs", "7", &[])],
        );

        assert_eq!(merged[0].sources, vec!["vscode"]);
        assert_eq!(merged[0].id.as_deref(), Some("7"));
    }
}
