//! Monitored items and the validated registry that holds them.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AppError, Result};

/// Stable identifier of a monitored item.
pub type ItemId = u64;

/// A page being watched for changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitoredItem {
    /// Unique identifier, also the snapshot key
    pub id: ItemId,

    /// Display label used in logs and alerts
    pub label: String,

    /// Target address
    pub url: String,

    /// CSS selector for the region to watch; wins over the defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl MonitoredItem {
    /// Key under which this item's fingerprint is stored.
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

/// Ordered, validated collection of monitored items.
///
/// Construction is all-or-nothing: a single malformed entry rejects the
/// whole payload.
#[derive(Debug, Clone)]
pub struct Registry {
    items: Vec<MonitoredItem>,
}

impl Registry {
    /// Load the registry from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::config(format!(
                "Registry file not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content).map_err(|e| match e {
            AppError::Json(err) => {
                AppError::config(format!("Failed to parse {}: {err}", path.display()))
            }
            other => other,
        })
    }

    /// Parse a registry from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    /// Build a registry from an already decoded JSON value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = value
            .as_object()
            .and_then(|root| root.get("items"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AppError::config("Invalid registry structure. Expected: {\"items\": [ ... ]}")
            })?;

        let mut items = Vec::with_capacity(entries.len());
        let mut seen_ids = HashSet::new();

        for raw in entries {
            // Non-object entries are noise, not structural damage.
            let Some(fields) = raw.as_object() else {
                log::debug!("Skipping non-object registry entry: {raw}");
                continue;
            };

            let item = parse_item(raw, fields)?;
            if !seen_ids.insert(item.id) {
                return Err(AppError::validation(format!(
                    "Duplicate item id in registry: {}",
                    item.id
                )));
            }
            items.push(item);
        }

        if items.is_empty() {
            return Err(AppError::config("No valid items found in registry"));
        }

        Ok(Self { items })
    }

    /// All items in registry order.
    pub fn items(&self) -> &[MonitoredItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MonitoredItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item by identifier.
    pub fn get(&self, id: ItemId) -> Option<&MonitoredItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// URL to identifier correspondence, used to migrate URL-keyed snapshots.
    ///
    /// When two items share a URL the later one wins.
    pub fn url_index(&self) -> HashMap<&str, ItemId> {
        self.items
            .iter()
            .map(|item| (item.url.as_str(), item.id))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a MonitoredItem;
    type IntoIter = std::slice::Iter<'a, MonitoredItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn parse_item(raw: &Value, fields: &Map<String, Value>) -> Result<MonitoredItem> {
    let id = fields
        .get("id")
        .and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            _ => None,
        })
        .ok_or_else(|| AppError::validation(format!("Item with invalid 'id': {raw}")))?;

    let label = non_blank(fields.get("label"))
        .ok_or_else(|| AppError::validation(format!("Item {id} has an invalid 'label'")))?;
    let url = non_blank(fields.get("url"))
        .ok_or_else(|| AppError::validation(format!("Item {id} has an invalid 'url'")))?;

    Ok(MonitoredItem {
        id,
        label,
        url,
        selector: non_blank(fields.get("selector")),
    })
}

/// Trimmed string content, or `None` for missing, non-string or blank values.
fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
