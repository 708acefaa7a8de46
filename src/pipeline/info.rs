// src/pipeline/info.rs

//! Snapshot inspection.

use std::path::Path;

use crate::error::Result;
use crate::models::{ItemId, Registry};
use crate::storage::SnapshotStore;

/// Characters of a fingerprint shown in listings.
const SHORT_FINGERPRINT: usize = 12;

/// What the snapshot knows about the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotInfo {
    /// Every registry item with its stored fingerprint, if any
    pub items: Vec<(ItemId, String, Option<String>)>,
    /// Snapshot keys that belong to no registry item
    pub orphan_keys: Vec<String>,
}

/// Compare a loaded snapshot against the registry.
pub fn describe(store: &SnapshotStore, registry: &Registry) -> SnapshotInfo {
    let items = registry
        .iter()
        .map(|item| {
            (
                item.id,
                item.label.clone(),
                store.get(item.id).map(str::to_string),
            )
        })
        .collect();

    let orphan_keys = store
        .entries()
        .map(|(key, _)| key)
        .filter(|key| {
            key.parse::<ItemId>()
                .map_or(true, |id| registry.get(id).is_none())
        })
        .map(str::to_string)
        .collect();

    SnapshotInfo { items, orphan_keys }
}

/// Log what the snapshot at `snapshot_path` holds for each item.
///
/// Legacy shapes are migrated in memory only; nothing is written.
pub async fn run_info(registry_path: &Path, snapshot_path: &Path) -> Result<SnapshotInfo> {
    let registry = Registry::load(registry_path)?;
    let store = SnapshotStore::load(snapshot_path, &registry).await;

    log::info!("Snapshot: {}", snapshot_path.display());
    if store.migrated_keys() > 0 {
        log::info!(
            "Snapshot uses legacy URL keys ({} keys); the next run rewrites it",
            store.migrated_keys()
        );
    }

    let info = describe(&store, &registry);
    for (id, label, fingerprint) in &info.items {
        match fingerprint {
            Some(fp) => log::info!(
                "    {} - {}: {}",
                id,
                label,
                fp.chars().take(SHORT_FINGERPRINT).collect::<String>()
            ),
            None => log::info!("    {} - {}: not seen yet", id, label),
        }
    }
    for key in &info.orphan_keys {
        log::info!("    (unmatched key) {}", key);
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_info_lists_items_and_orphans() {
        let tmp = TempDir::new().unwrap();
        let registry_path = tmp.path().join("urls.json");
        let snapshot_path = tmp.path().join("snapshot.json");
        std::fs::write(
            &registry_path,
            r#"{"items": [
                {"id": 1, "label": "A", "url": "https://a"},
                {"id": 2, "label": "B", "url": "https://b"}
            ]}"#,
        )
        .unwrap();
        std::fs::write(&snapshot_path, r#"{"1": "abcdef0123456789", "99": "ff"}"#).unwrap();

        let info = run_info(&registry_path, &snapshot_path).await.unwrap();

        assert_eq!(
            info.items,
            vec![
                (1, "A".to_string(), Some("abcdef0123456789".to_string())),
                (2, "B".to_string(), None),
            ]
        );
        assert_eq!(info.orphan_keys, vec!["99".to_string()]);
        // Inspection never rewrites the file.
        assert!(std::fs::read_to_string(&snapshot_path).unwrap().contains("\"99\""));
    }

    #[tokio::test]
    async fn test_info_requires_registry() {
        let tmp = TempDir::new().unwrap();
        let result = run_info(&tmp.path().join("urls.json"), &tmp.path().join("s.json")).await;
        assert!(result.is_err());
    }
}
