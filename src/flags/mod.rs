//! Feature Flags
//!
//! A small layered flag store: code-set defaults, then a JSON file
//! layer, then an environment override layer, each overriding the one
//! before it. Values are booleans, integers, or strings.
//!
//! The environment layer reads `EFFIGY_FLAGS`, a comma-separated list
//! of `key=value` pairs:
//!
//! ```text
//! EFFIGY_FLAGS=index.dedup=false,catalog.environment=staging
//! ```
//!
//! Typed getters fall back to the caller's default when a flag is
//! missing, and warn (then fall back) when it holds the wrong type.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::{EffigyError, Result};

/// Environment variable consulted by [`FeatureFlags::apply_env`].
pub const FLAGS_ENV_VAR: &str = "EFFIGY_FLAGS";

/// Flag keys consulted by the composer.
pub mod keys {
    /// Bool, default `true`: route loaded payloads through the
    /// duplicate-suppressing asset index.
    pub const INDEX_DEDUP: &str = "index.dedup";
    /// Bool, default `true`: verify payload checksums after fetch.
    pub const VERIFY_CHECKSUMS: &str = "catalog.verify_checksums";
    /// String: catalog environment to select at composer start.
    pub const CATALOG_ENVIRONMENT: &str = "catalog.environment";
}

/// A flag's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl FlagValue {
    /// Parses an override string: `true`/`false`, then integer, then
    /// plain string.
    fn parse(raw: &str) -> Self {
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => raw
                .parse::<i64>()
                .map_or_else(|_| Self::Str(raw.to_owned()), Self::Int),
        }
    }

    fn from_json(key: &str, value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .ok_or_else(|| EffigyError::InvalidFlagValue(key.to_owned())),
            serde_json::Value::String(s) => Ok(Self::Str(s.clone())),
            _ => Err(EffigyError::InvalidFlagValue(key.to_owned())),
        }
    }
}

/// Layered feature-flag store, shareable across threads.
pub struct FeatureFlags {
    values: RwLock<FxHashMap<String, FlagValue>>,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureFlags {
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: RwLock::new(FxHashMap::default()),
        }
    }

    /// Sets one flag, overriding earlier layers.
    pub fn set(&self, key: impl Into<String>, value: FlagValue) {
        self.values.write().insert(key.into(), value);
    }

    /// Merges a flat JSON object of flags over the current values.
    ///
    /// The merge is atomic: a file with any invalid entry is rejected
    /// whole and the store is left untouched.
    pub fn load_json(&self, json: &str) -> Result<()> {
        let root: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(map) = root else {
            return Err(EffigyError::InvalidManifest(
                "flag file root must be an object".into(),
            ));
        };
        let mut parsed = Vec::with_capacity(map.len());
        for (key, raw) in &map {
            parsed.push((key.clone(), FlagValue::from_json(key, raw)?));
        }
        self.values.write().extend(parsed);
        log::debug!("flag file merged: {} keys", map.len());
        Ok(())
    }

    /// Applies a `key=value,key=value` override string.
    ///
    /// The merge is atomic: a malformed segment rejects the whole
    /// string and the store is left untouched.
    pub fn apply_overrides(&self, spec: &str) -> Result<()> {
        let mut parsed = Vec::new();
        for segment in spec.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let Some((key, raw)) = segment.split_once('=') else {
                return Err(EffigyError::InvalidFlagOverride(segment.to_owned()));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(EffigyError::InvalidFlagOverride(segment.to_owned()));
            }
            parsed.push((key.to_owned(), FlagValue::parse(raw.trim())));
        }
        self.values.write().extend(parsed);
        Ok(())
    }

    /// Applies overrides from an environment variable, if set.
    pub fn apply_env_var(&self, var: &str) -> Result<()> {
        match std::env::var(var) {
            Ok(spec) => self.apply_overrides(&spec),
            Err(_) => Ok(()),
        }
    }

    /// Applies overrides from [`FLAGS_ENV_VAR`], if set.
    pub fn apply_env(&self) -> Result<()> {
        self.apply_env_var(FLAGS_ENV_VAR)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<FlagValue> {
        self.values.read().get(key).cloned()
    }

    #[must_use]
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(FlagValue::Bool(b)) => b,
            Some(other) => {
                log::warn!("flag '{key}' is {other:?}, expected bool; using {default}");
                default
            }
            None => default,
        }
    }

    #[must_use]
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(FlagValue::Int(i)) => i,
            Some(other) => {
                log::warn!("flag '{key}' is {other:?}, expected int; using {default}");
                default
            }
            None => default,
        }
    }

    #[must_use]
    pub fn str_or(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(FlagValue::Str(s)) => s,
            Some(other) => {
                log::warn!("flag '{key}' is {other:?}, expected string; using '{default}'");
                default.to_owned()
            }
            None => default.to_owned(),
        }
    }

    /// `bool_or(key, false)`.
    #[must_use]
    pub fn is_enabled(&self, key: &str) -> bool {
        self.bool_or(key, false)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Current flags, sorted by key. Diagnostics only.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, FlagValue)> {
        let mut all: Vec<_> = self
            .values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}
