//! Content Catalog
//!
//! A catalog maps stable string keys (`"hats/red"`) to downloadable
//! content: a relative path, an optional xxh3 checksum of the payload
//! bytes, and search labels. Named environments (`dev`, `staging`,
//! `prod`) map to base locations; resolution joins the selected
//! environment's base with the entry path.
//!
//! Catalogs are declared as JSON manifests:
//!
//! ```json
//! {
//!   "default_environment": "dev",
//!   "environments": {
//!     "dev": "https://cdn-dev.example.com/content",
//!     "prod": "https://cdn.example.com/content"
//!   },
//!   "entries": [
//!     { "key": "hats/red", "path": "hats/red_hat.glb",
//!       "checksum": "9a3bf55c12d08f77", "labels": ["hats", "featured"] }
//!   ]
//! }
//! ```
//!
//! Binary bundle formats are out of scope; payload bytes are opaque
//! here. [`CatalogSource`] does the actual reading.

mod source;

pub use source::{
    CatalogSource, FilePayloadReader, PayloadReader, load_catalog, load_catalog_blocking,
};

#[cfg(feature = "http")]
pub use source::HttpPayloadReader;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::{EffigyError, Result};
use crate::utils::Symbol;
use crate::utils::interner;

/// Checksum of payload bytes, as recorded in catalog manifests.
#[must_use]
pub fn content_checksum(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}

/// One entry of a catalog manifest document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub key: String,
    /// Path relative to the environment base.
    pub path: String,
    /// xxh3-64 of the payload bytes, hex encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// The manifest document as parsed from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogManifest {
    pub default_environment: String,
    /// Environment name → base URL or directory.
    pub environments: FxHashMap<String, String>,
    pub entries: Vec<ManifestEntry>,
}

struct EntryData {
    path: String,
    checksum: Option<u64>,
    labels: SmallVec<[Symbol; 2]>,
}

/// A validated catalog with one environment selected.
pub struct Catalog {
    environment: String,
    base: String,
    environments: FxHashMap<String, String>,
    entries: FxHashMap<String, EntryData>,
}

/// A resolved catalog entry: where to fetch it and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Absolute URL or path for the selected environment.
    pub url: String,
    /// Expected payload checksum, when the manifest records one.
    pub checksum: Option<u64>,
}

impl Catalog {
    /// Validates a parsed manifest and selects its default environment.
    ///
    /// Duplicate keys, an undeclared default environment, and malformed
    /// checksums are rejected.
    pub fn from_manifest(manifest: CatalogManifest) -> Result<Self> {
        let base = manifest
            .environments
            .get(&manifest.default_environment)
            .cloned()
            .ok_or_else(|| EffigyError::UnknownEnvironment(manifest.default_environment.clone()))?;

        let mut entries = FxHashMap::default();
        entries.reserve(manifest.entries.len());
        for entry in manifest.entries {
            let checksum = entry.checksum.as_deref().map(parse_checksum).transpose()?;
            let labels = entry
                .labels
                .iter()
                .map(|label| interner::intern(label))
                .collect();
            let data = EntryData {
                path: entry.path,
                checksum,
                labels,
            };
            if entries.insert(entry.key.clone(), data).is_some() {
                return Err(EffigyError::DuplicateCatalogKey(entry.key));
            }
        }

        log::debug!(
            "catalog loaded: {} entries, environment '{}'",
            entries.len(),
            manifest.default_environment
        );
        Ok(Self {
            environment: manifest.default_environment,
            base,
            environments: manifest.environments,
            entries,
        })
    }

    /// Parses and validates a JSON manifest document.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: CatalogManifest = serde_json::from_str(json)?;
        Self::from_manifest(manifest)
    }

    /// Name of the selected environment.
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Base location of the selected environment.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Declared environment names, unordered.
    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    /// Switches resolution to another declared environment.
    pub fn select_environment(&mut self, name: &str) -> Result<()> {
        let base = self
            .environments
            .get(name)
            .cloned()
            .ok_or_else(|| EffigyError::UnknownEnvironment(name.to_owned()))?;
        log::debug!("catalog environment: '{}' -> '{name}'", self.environment);
        self.environment = name.to_owned();
        self.base = base;
        Ok(())
    }

    /// Resolves a key against the selected environment.
    pub fn resolve(&self, key: &str) -> Result<Location> {
        let entry = self.entry(key)?;
        Ok(Location {
            url: join_location(&self.base, &entry.path),
            checksum: entry.checksum,
        })
    }

    /// Entry path relative to the environment base.
    pub fn path_of(&self, key: &str) -> Result<&str> {
        Ok(self.entry(key)?.path.as_str())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entry keys, unordered.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Labels recorded for a key.
    pub fn labels_of(&self, key: &str) -> Result<Vec<&'static str>> {
        let entry = self.entry(key)?;
        Ok(entry.labels.iter().map(|&sym| interner::resolve(sym)).collect())
    }

    /// Keys carrying `label`, sorted.
    #[must_use]
    pub fn keys_with_label(&self, label: &str) -> Vec<&str> {
        let Some(sym) = interner::get(label) else {
            return Vec::new();
        };
        let mut keys: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, data)| data.labels.contains(&sym))
            .map(|(key, _)| key.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Checks fetched payload bytes against the entry's checksum.
    ///
    /// Entries without a recorded checksum pass unconditionally.
    pub fn verify(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let entry = self.entry(key)?;
        match entry.checksum {
            None => {
                log::trace!("no checksum recorded for '{key}', skipping verification");
                Ok(())
            }
            Some(expected) => {
                let actual = xxh3_64(bytes);
                if actual == expected {
                    Ok(())
                } else {
                    Err(EffigyError::ChecksumMismatch {
                        key: key.to_owned(),
                        expected,
                        actual,
                    })
                }
            }
        }
    }

    fn entry(&self, key: &str) -> Result<&EntryData> {
        self.entries
            .get(key)
            .ok_or_else(|| EffigyError::CatalogKeyNotFound(key.to_owned()))
    }
}

fn parse_checksum(hex: &str) -> Result<u64> {
    let digits = hex.trim().trim_start_matches("0x");
    u64::from_str_radix(digits, 16)
        .map_err(|_| EffigyError::InvalidManifest(format!("bad checksum '{hex}'")))
}

fn join_location(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if base.is_empty() {
        path.to_owned()
    } else {
        format!("{base}/{path}")
    }
}
