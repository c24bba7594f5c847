use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::catalog::{Catalog, CatalogSource};
use crate::errors::{EffigyError, Result};
use crate::index::Indexable;

/// A loaded wearable payload: opaque content bytes plus the identity the
/// index files it under.
///
/// Payload bytes stay opaque here; decoding them into engine resources
/// happens downstream of this crate.
pub struct AssetPayload {
    key: String,
    name: String,
    bytes: Vec<u8>,
}

impl AssetPayload {
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            bytes,
        }
    }

    /// Catalog key this payload was loaded from.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl Indexable for AssetPayload {
    fn index_name(&self) -> &str {
        &self.name
    }
}

/// Produces wearable payloads by catalog key.
pub trait WearableLoader: Send + Sync {
    fn load(&self, key: &str)
    -> impl std::future::Future<Output = Result<Arc<AssetPayload>>> + Send;
}

/// In-memory loader over registered templates.
///
/// Every `load` clones the template into a fresh instance, the way a
/// real pipeline materializes a new object per request.
#[derive(Default)]
pub struct MemoryLoader {
    templates: RwLock<FxHashMap<String, (String, Vec<u8>)>>,
}

impl MemoryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template under a catalog key.
    pub fn insert(&self, key: impl Into<String>, name: impl Into<String>, bytes: Vec<u8>) {
        self.templates
            .write()
            .insert(key.into(), (name.into(), bytes));
    }
}

impl WearableLoader for MemoryLoader {
    async fn load(&self, key: &str) -> Result<Arc<AssetPayload>> {
        let templates = self.templates.read();
        let (name, bytes) = templates
            .get(key)
            .ok_or_else(|| EffigyError::PayloadLoadFailed {
                key: key.to_owned(),
                reason: "no template registered".into(),
            })?;
        Ok(Arc::new(AssetPayload::new(key, name, bytes.clone())))
    }
}

/// Loader backed by a catalog and its payload source.
pub struct CatalogLoader {
    catalog: Arc<Catalog>,
    source: CatalogSource,
    verify: bool,
}

impl CatalogLoader {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, source: CatalogSource, verify: bool) -> Self {
        Self {
            catalog,
            source,
            verify,
        }
    }
}

impl WearableLoader for CatalogLoader {
    async fn load(&self, key: &str) -> Result<Arc<AssetPayload>> {
        let path = self.catalog.path_of(key)?.to_owned();
        let bytes = self.source.read_bytes(&path).await?;
        let bytes = if self.verify {
            // Hashing runs on the blocking pool; payloads can be large.
            let catalog = Arc::clone(&self.catalog);
            let key = key.to_owned();
            tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
                catalog.verify(&key, &bytes)?;
                Ok(bytes)
            })
            .await??
        } else {
            bytes
        };
        Ok(Arc::new(AssetPayload::new(key, key, bytes)))
    }
}

/// Loader selected at composer construction, without trait-object
/// dispatch.
pub enum WearableLoaderVariant {
    Memory(Arc<MemoryLoader>),
    Catalog(Arc<CatalogLoader>),
}

impl WearableLoaderVariant {
    pub async fn load(&self, key: &str) -> Result<Arc<AssetPayload>> {
        match self {
            Self::Memory(l) => l.load(key).await,
            Self::Catalog(l) => l.load(key).await,
        }
    }
}
