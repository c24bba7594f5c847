use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::catalog::{Catalog, CatalogManifest};
use crate::errors::{EffigyError, Result};
use crate::utils::runtime;

/// Asynchronous reader of payload bytes at a location relative to some
/// base.
pub trait PayloadReader: Send + Sync {
    fn read_bytes(
        &self,
        location: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// Reads payloads from a local directory.
pub struct FilePayloadReader {
    root: PathBuf,
}

impl FilePayloadReader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PayloadReader for FilePayloadReader {
    async fn read_bytes(&self, location: &str) -> Result<Vec<u8>> {
        let path = self.root.join(location);
        let data = tokio::fs::read(&path).await?;
        Ok(data)
    }
}

/// Reads payloads over HTTP.
#[cfg(feature = "http")]
pub struct HttpPayloadReader {
    base: reqwest::Url,
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpPayloadReader {
    pub fn new(base: &str) -> Result<Self> {
        // A trailing slash keeps Url::join treating the base as a
        // directory instead of replacing its last segment.
        let normalized = if base.ends_with('/') {
            base.to_owned()
        } else {
            format!("{base}/")
        };
        let base = reqwest::Url::parse(&normalized)
            .map_err(|e| EffigyError::InvalidManifest(format!("bad base URL '{base}': {e}")))?;
        Ok(Self {
            base,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
        })
    }

    #[inline]
    #[must_use]
    pub fn base(&self) -> &reqwest::Url {
        &self.base
    }
}

#[cfg(feature = "http")]
impl PayloadReader for HttpPayloadReader {
    async fn read_bytes(&self, location: &str) -> Result<Vec<u8>> {
        let url = self
            .base
            .join(location)
            .map_err(|e| EffigyError::InvalidManifest(format!("bad location '{location}': {e}")))?;
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(EffigyError::HttpResponseError {
                status: resp.status().as_u16(),
            });
        }
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Reader selected for a catalog base, without trait-object dispatch.
#[derive(Clone)]
pub enum CatalogSource {
    File(Arc<FilePayloadReader>),
    #[cfg(feature = "http")]
    Http(Arc<HttpPayloadReader>),
}

impl CatalogSource {
    /// Picks a reader from the base's scheme: `http(s)://` bases read
    /// over HTTP, everything else reads from the filesystem.
    pub fn from_base(base: &str) -> Result<Self> {
        if is_remote(base) {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Arc::new(HttpPayloadReader::new(base)?)))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(EffigyError::FeatureNotEnabled("http".into()))
            }
        } else {
            Ok(Self::File(Arc::new(FilePayloadReader::new(base))))
        }
    }

    /// Reader for the catalog's selected environment.
    pub fn for_catalog(catalog: &Catalog) -> Result<Self> {
        Self::from_base(catalog.base())
    }

    pub async fn read_bytes(&self, location: &str) -> Result<Vec<u8>> {
        match self {
            Self::File(r) => r.read_bytes(location).await,
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(location).await,
        }
    }

    /// Fetches a catalog entry's payload and verifies its checksum.
    pub async fn fetch(&self, catalog: &Catalog, key: &str) -> Result<Vec<u8>> {
        let path = catalog.path_of(key)?.to_owned();
        let bytes = self.read_bytes(&path).await?;
        catalog.verify(key, &bytes)?;
        log::trace!("fetched '{key}': {} bytes", bytes.len());
        Ok(bytes)
    }

    /// Synchronous wrapper around [`CatalogSource::fetch`].
    pub fn fetch_blocking(&self, catalog: &Catalog, key: &str) -> Result<Vec<u8>> {
        runtime::loader_runtime().block_on(self.fetch(catalog, key))
    }
}

/// Loads and validates a manifest from a path or URL.
pub async fn load_catalog(source: &str) -> Result<Catalog> {
    let bytes = if is_remote(source) {
        fetch_remote(source).await?
    } else {
        tokio::fs::read(source).await?
    };
    let manifest: CatalogManifest = serde_json::from_slice(&bytes)?;
    Catalog::from_manifest(manifest)
}

/// Synchronous wrapper around [`load_catalog`].
pub fn load_catalog_blocking(source: &str) -> Result<Catalog> {
    runtime::loader_runtime().block_on(load_catalog(source))
}

#[cfg(feature = "http")]
async fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::get(url).await?;
    if !resp.status().is_success() {
        return Err(EffigyError::HttpResponseError {
            status: resp.status().as_u16(),
        });
    }
    Ok(resp.bytes().await?.to_vec())
}

#[cfg(not(feature = "http"))]
#[allow(clippy::unused_async)]
async fn fetch_remote(_url: &str) -> Result<Vec<u8>> {
    Err(EffigyError::FeatureNotEnabled("http".into()))
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
