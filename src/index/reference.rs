use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::index::indexer::AssetIndexer;
use crate::index::node::NodeIndex;

/// Back-pointer from a tracked reference to its index entry.
struct RefHandle {
    indexer: Arc<AssetIndexer>,
    node: NodeIndex,
}

/// Reference-counted handle to an indexed asset.
///
/// Holding an `AssetRef` keeps its index entry alive; dropping the last
/// one retires the entry (and, for an active entry, promotes the next
/// queued instance of the same key). Cloning adds a reference to the
/// *same* entry, never a new one.
///
/// References to untracked asset types are pass-through: they deref to
/// the asset like any other but carry no index entry, so cloning and
/// dropping them is free.
pub struct AssetRef<T> {
    asset: Arc<T>,
    handle: Option<RefHandle>,
}

impl<T> AssetRef<T> {
    pub(crate) fn tracked(asset: Arc<T>, indexer: Arc<AssetIndexer>, node: NodeIndex) -> Self {
        Self {
            asset,
            handle: Some(RefHandle { indexer, node }),
        }
    }

    pub(crate) fn untracked(asset: Arc<T>) -> Self {
        Self {
            asset,
            handle: None,
        }
    }

    /// The referenced asset.
    #[must_use]
    pub fn asset(&self) -> &Arc<T> {
        &self.asset
    }

    /// Whether this reference is backed by an index entry.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.handle.is_some()
    }
}

impl<T> Deref for AssetRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.asset
    }
}

impl<T> Clone for AssetRef<T> {
    fn clone(&self) -> Self {
        let handle = self.handle.as_ref().map(|h| {
            h.indexer.retain(h.node);
            RefHandle {
                indexer: Arc::clone(&h.indexer),
                node: h.node,
            }
        });
        Self {
            asset: Arc::clone(&self.asset),
            handle,
        }
    }
}

impl<T> Drop for AssetRef<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.indexer.release(handle.node);
        }
    }
}

impl<T> fmt::Debug for AssetRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetRef")
            .field("tracked", &self.is_tracked())
            .finish_non_exhaustive()
    }
}
