//! The global video registry.
//!
//! The registry is owned by whoever publishes the videos; this crate only
//! reads it. Two JSON shapes are accepted:
//!
//! ```json
//! [
//!   { "key": "v1", "displayName": "Opening", "url": "https://…/v1.mp4", "poster": "/p/v1.jpg" }
//! ]
//! ```
//!
//! ```json
//! { "v1": { "displayName": "Opening", "url": "https://…/v1.mp4" } }
//! ```
//!
//! Keys are matched case-insensitively everywhere. When two entries share a
//! key (ignoring case) the first one wins and the rest are reported. Entries
//! without a key or url are skipped with a warning; a file that is not JSON,
//! or whose top level is neither shape, is an error.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Malformed registry {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One playable video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub key: String,
    pub display_name: String,
    pub url: String,
    pub poster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    poster: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRegistry {
    List(Vec<serde_json::Value>),
    Map(serde_json::Map<String, serde_json::Value>),
}

/// Deduplicated registry, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    by_key: HashMap<String, usize>,
}

/// Reasons an entry was dropped while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skipped {
    Invalid { index: usize, reason: String },
    Duplicate { key: String },
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Registry {
    /// Build from entries, keeping the first of any case-insensitive duplicate.
    pub fn from_entries(entries: impl IntoIterator<Item = RegistryEntry>) -> (Self, Vec<Skipped>) {
        let mut registry = Registry::default();
        let mut skipped = Vec::new();
        for entry in entries {
            let folded = entry.key.to_lowercase();
            if registry.by_key.contains_key(&folded) {
                skipped.push(Skipped::Duplicate { key: entry.key });
                continue;
            }
            registry.by_key.insert(folded, registry.entries.len());
            registry.entries.push(entry);
        }
        (registry, skipped)
    }

    /// Parse registry JSON text.
    pub fn parse(text: &str) -> Result<(Self, Vec<Skipped>), serde_json::Error> {
        let raw: RawRegistry = serde_json::from_str(text)?;
        let values: Vec<(Option<String>, serde_json::Value)> = match raw {
            RawRegistry::List(values) => values.into_iter().map(|v| (None, v)).collect(),
            RawRegistry::Map(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
        };

        let mut skipped = Vec::new();
        let mut entries = Vec::new();
        for (index, (map_key, value)) in values.into_iter().enumerate() {
            let raw: RawEntry = match serde_json::from_value(value) {
                Ok(raw) => raw,
                Err(e) => {
                    skipped.push(Skipped::Invalid {
                        index,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let Some(key) = non_blank(raw.key.or(map_key)) else {
                skipped.push(Skipped::Invalid {
                    index,
                    reason: "missing key".into(),
                });
                continue;
            };
            let Some(url) = non_blank(raw.url) else {
                skipped.push(Skipped::Invalid {
                    index,
                    reason: format!("{key}: missing url"),
                });
                continue;
            };
            entries.push(RegistryEntry {
                display_name: non_blank(raw.display_name).unwrap_or_else(|| key.clone()),
                poster: non_blank(raw.poster),
                key,
                url,
            });
        }

        let (registry, duplicates) = Registry::from_entries(entries);
        skipped.extend(duplicates);
        Ok((registry, skipped))
    }

    /// Look up an entry by key, ignoring case.
    pub fn get(&self, key: &str) -> Option<&RegistryEntry> {
        self.by_key
            .get(&key.to_lowercase())
            .map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load the registry file.
///
/// A missing or unreadable file is an empty registry; malformed JSON is an error.
pub fn load_registry(path: &Path) -> Result<Registry, RegistryError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("no registry at {}, using an empty one", path.display());
            return Ok(Registry::default());
        }
        Err(e) => {
            log::warn!("cannot read registry {}, using an empty one: {e}", path.display());
            return Ok(Registry::default());
        }
    };

    let (registry, skipped) = Registry::parse(&text).map_err(|source| RegistryError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    for skip in skipped {
        match skip {
            Skipped::Duplicate { key } => {
                log::warn!("registry: duplicate key {key:?} ignored (first entry wins)")
            }
            Skipped::Invalid { index, reason } => {
                log::warn!("registry: entry {index} skipped: {reason}")
            }
        }
    }
    Ok(registry)
}
