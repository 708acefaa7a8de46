// src/storage/snapshot.rs

//! Last-seen fingerprint per monitored item.
//!
//! The persisted form is a JSON object from item id (as a string) to
//! fingerprint. Two older shapes are still accepted on read:
//!
//! - `{"snapshot_hash": "<hex>"}`: one fingerprint for the whole run,
//!   kept under [`SINGLE_KEY`] so no item matches it.
//! - `{"https://...": "<hex>"}`: keyed by URL, moved onto item ids using
//!   the registry.
//!
//! Only numeric keys are ever written back.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{ItemId, Registry};
use crate::storage::local;
use crate::utils::is_numeric_key;

/// Reserved key holding a legacy whole-run fingerprint.
pub const SINGLE_KEY: &str = "__single__";

/// Field name of the legacy whole-run fingerprint.
const LEGACY_HASH_FIELD: &str = "snapshot_hash";

/// Snapshot file contents, classified by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSnapshot {
    /// `{"snapshot_hash": "..."}`
    LegacyScalar(String),
    /// A mapping with at least one `http://` or `https://` key
    LegacyUrlKeyed(BTreeMap<String, String>),
    /// Any other mapping
    Canonical(BTreeMap<String, String>),
}

impl RawSnapshot {
    /// Decode and classify snapshot bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let map = match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(map) => map,
            other => {
                return Err(AppError::validation(format!(
                    "Snapshot is not a JSON object: {}",
                    shape_name(&other)
                )));
            }
        };

        if let Some(Value::String(hash)) = map.get(LEGACY_HASH_FIELD) {
            return Ok(Self::LegacyScalar(hash.clone()));
        }

        let entries: BTreeMap<String, String> = map
            .into_iter()
            .map(|(key, value)| (key, value_text(value)))
            .collect();

        if entries.keys().any(|key| is_url_key(key)) {
            Ok(Self::LegacyUrlKeyed(entries))
        } else {
            Ok(Self::Canonical(entries))
        }
    }
}

/// In-memory snapshot mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotStore {
    entries: BTreeMap<String, String>,
    migrated_keys: usize,
}

impl SnapshotStore {
    /// Load the snapshot at `path` and migrate legacy shapes.
    ///
    /// Never fails: a missing file is an empty store, and an unreadable
    /// or corrupt one is an empty store plus a warning.
    pub async fn load(path: &Path, registry: &Registry) -> Self {
        let bytes = match local::read_bytes(path).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::debug!("No snapshot at {}; starting empty", path.display());
                return Self::default();
            }
            Err(e) => {
                log::warn!("Failed to read snapshot {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match RawSnapshot::parse(&bytes) {
            Ok(raw) => Self::from_raw(raw, registry),
            Err(e) => {
                log::warn!("Failed to parse snapshot {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Normalize a decoded snapshot onto item-id keys.
    pub fn from_raw(raw: RawSnapshot, registry: &Registry) -> Self {
        match raw {
            RawSnapshot::LegacyScalar(hash) => Self {
                entries: BTreeMap::from([(SINGLE_KEY.to_string(), hash)]),
                migrated_keys: 0,
            },
            RawSnapshot::Canonical(entries) => Self {
                entries,
                migrated_keys: 0,
            },
            RawSnapshot::LegacyUrlKeyed(all) => {
                let index = registry.url_index();
                let (urls, mut entries): (BTreeMap<_, _>, BTreeMap<_, _>) =
                    all.into_iter().partition(|(key, _)| is_url_key(key));

                let migrated_keys = urls.len();
                for (url, hash) in urls {
                    match index.get(url.as_str()) {
                        Some(id) => {
                            // An id-keyed entry already present is newer.
                            entries.entry(id.to_string()).or_insert(hash);
                        }
                        None => log::debug!("Dropping snapshot entry for unknown URL {url}"),
                    }
                }

                Self {
                    entries,
                    migrated_keys,
                }
            }
        }
    }

    /// Number of URL keys translated or dropped during load.
    pub fn migrated_keys(&self) -> usize {
        self.migrated_keys
    }

    pub fn get(&self, id: ItemId) -> Option<&str> {
        self.entries.get(&id.to_string()).map(String::as_str)
    }

    pub fn set(&mut self, id: ItemId, fingerprint: impl Into<String>) {
        self.entries.insert(id.to_string(), fingerprint.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All in-memory entries, including reserved keys.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries that are written to disk: numeric keys only.
    pub fn persisted(&self) -> BTreeMap<&str, &str> {
        self.entries()
            .filter(|(key, _)| is_numeric_key(key))
            .collect()
    }

    /// Persist numeric-keyed entries to `path`, replacing it atomically.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let persisted = self.persisted();
        local::write_json(path, &persisted).await?;
        log::debug!(
            "Snapshot saved to {} ({} entries)",
            path.display(),
            persisted.len()
        );
        Ok(())
    }
}

/// Whether a fingerprint counts as changed. No previous value is a change.
pub fn compare(previous: Option<&str>, current: &str) -> bool {
    match previous {
        None => true,
        Some(previous) => previous != current,
    }
}

fn is_url_key(key: &str) -> bool {
    key.starts_with("http://") || key.starts_with("https://")
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
