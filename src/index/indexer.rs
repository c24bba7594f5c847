//! Global Asset Index
//!
//! The [`AssetIndexer`] maps canonical names to loaded asset instances and
//! hands out reference-counted [`AssetRef`]s. Its job is to keep name
//! resolution unambiguous while many composition operations load and
//! release assets concurrently:
//!
//! - An asset type participates only after being registered with
//!   [`AssetIndexer::track`]; anything else gets a pass-through reference
//!   and the index is never touched.
//! - Per key, exactly one instance is registered ("active") at a time.
//!   Further instances with the same key — the same logical wearable
//!   delivered by two content bundles — queue up behind it in FIFO order
//!   and take over the registration when the instances ahead of them are
//!   fully released.
//! - Re-indexing an instance that is already indexed returns another
//!   reference to its existing entry (the handle cache), never a second
//!   entry.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       AssetIndexer                        │
//! │                                                           │
//! │  active:  key ──► head node          (one per key)        │
//! │  handles: instance ──► node          (handle cache)       │
//! │  pool:    node slab + free list                           │
//! │                                                           │
//! │  key "red_hat":  [head]──►[pending]──►[pending]           │
//! │                    ▲ registered        FIFO               │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Releasing the head unregisters it and registers its successor;
//! releasing a pending node just unlinks it. Either way the other
//! instances of the key are never perturbed.

use std::any::{Any, TypeId};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::index::key::{IndexKey, InstanceId};
use crate::index::node::{IndexNode, NodeIndex, NodePool};
use crate::index::reference::AssetRef;
use crate::utils::interner;

/// Types that can be registered in the global index.
///
/// Implementors provide the raw display name the index key is derived
/// from; see [`canonical_name`](crate::index::canonical_name) for the
/// derivation.
pub trait Indexable: Any + Send + Sync {
    /// Raw name used to derive this asset's index key.
    fn index_name(&self) -> &str;
}

/// Snapshot of the indexer's bookkeeping, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerStats {
    /// Nodes currently holding an instance (active + pending).
    pub live_nodes: usize,
    /// Retired nodes available on the free list.
    pub pooled_nodes: usize,
    /// Keys with a registered active instance.
    pub active_keys: usize,
    /// Instances with an outstanding reference (handle-cache entries).
    pub cached_handles: usize,
}

struct IndexerState {
    pool: NodePool,
    /// The registry itself: at most one node per key.
    active: FxHashMap<IndexKey, NodeIndex>,
    /// Handle cache: live instance → its node.
    handles: FxHashMap<InstanceId, NodeIndex>,
    /// Asset types that participate in indexing.
    tracked: FxHashSet<TypeId>,
}

/// Reference-counted, dedup-aware asset index.
///
/// Cheap to share: wrap it in an [`Arc`] and clone freely. All state sits
/// behind one mutex; operations are short and allocation-free in steady
/// state thanks to the node free list.
pub struct AssetIndexer {
    state: Mutex<IndexerState>,
}

impl Default for AssetIndexer {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetIndexer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(IndexerState {
                pool: NodePool::new(),
                active: FxHashMap::default(),
                handles: FxHashMap::default(),
                tracked: FxHashSet::default(),
            }),
        }
    }

    /// Registers `T` as a tracked asset type.
    ///
    /// Indexing an instance of an untracked type returns a pass-through
    /// reference and leaves the index untouched.
    pub fn track<T: Indexable>(&self) {
        self.state.lock().tracked.insert(TypeId::of::<T>());
    }

    /// Whether `T` participates in indexing.
    #[must_use]
    pub fn is_tracked<T: Indexable>(&self) -> bool {
        self.state.lock().tracked.contains(&TypeId::of::<T>())
    }

    /// Indexes an asset instance and returns an ownership reference.
    ///
    /// - instance already indexed → another reference to its entry;
    /// - untracked type → pass-through reference, no index mutation;
    /// - fresh key → the instance is registered active;
    /// - key in use → the instance queues behind the current holder.
    pub fn index<T: Indexable>(self: &Arc<Self>, asset: Arc<T>) -> AssetRef<T> {
        let instance = InstanceId::of(&asset);

        let mut guard = self.state.lock();
        let state = &mut *guard;

        if !state.tracked.contains(&TypeId::of::<T>()) {
            drop(guard);
            return AssetRef::untracked(asset);
        }

        // Handle cache: a second request for the same instance shares the
        // existing node instead of growing the key's chain.
        if let Some(&idx) = state.handles.get(&instance) {
            state.pool.get_mut(idx).refs += 1;
            drop(guard);
            return AssetRef::tracked(asset, Arc::clone(self), idx);
        }

        let key = IndexKey::derive::<T>(asset.index_name());
        let erased: Arc<dyn Any + Send + Sync> = asset.clone();
        let idx = state.pool.acquire(IndexNode::new(key, instance, erased));

        if let Some(&head) = state.active.get(&key) {
            // Key occupied: append to the chain tail, pending.
            let mut tail = head;
            while let Some(next) = state.pool.get(tail).next {
                tail = next;
            }
            state.pool.get_mut(tail).next = Some(idx);
            state.pool.get_mut(idx).prev = Some(tail);
            log::debug!(
                "queued duplicate instance for '{}'",
                interner::resolve(key.name())
            );
        } else {
            state.active.insert(key, idx);
            state.pool.get_mut(idx).active = true;
            log::trace!("registered '{}'", interner::resolve(key.name()));
        }

        state.handles.insert(instance, idx);
        drop(guard);
        AssetRef::tracked(asset, Arc::clone(self), idx)
    }

    /// Resolves the active instance registered under `T` + `name`.
    ///
    /// `name` goes through the same canonicalization as indexing, so
    /// `get::<Hat>("Red Hat(Clone)")` finds an asset indexed as
    /// `"Red Hat"`.
    #[must_use]
    pub fn get<T: Indexable>(&self, name: &str) -> Option<Arc<T>> {
        let key = IndexKey::lookup::<T>(name)?;
        let state = self.state.lock();
        let &idx = state.active.get(&key)?;
        let asset = state.pool.get(idx).asset.as_ref()?;
        Arc::clone(asset).downcast::<T>().ok()
    }

    /// Whether an active instance is registered under `T` + `name`.
    #[must_use]
    pub fn is_indexed<T: Indexable>(&self, name: &str) -> bool {
        match IndexKey::lookup::<T>(name) {
            Some(key) => self.state.lock().active.contains_key(&key),
            None => false,
        }
    }

    /// Current bookkeeping counts.
    #[must_use]
    pub fn stats(&self) -> IndexerStats {
        let state = self.state.lock();
        IndexerStats {
            live_nodes: state.pool.live_count(),
            pooled_nodes: state.pool.free_count(),
            active_keys: state.active.len(),
            cached_handles: state.handles.len(),
        }
    }

    /// Adds one reference to a node. Called by [`AssetRef::clone`].
    pub(crate) fn retain(&self, idx: NodeIndex) {
        self.state.lock().pool.get_mut(idx).refs += 1;
    }

    /// Drops one reference from a node, retiring it when none remain.
    ///
    /// Retiring the active node unregisters its key and promotes the next
    /// chain node (if any) to active. Retiring a pending node unlinks it
    /// without touching the registration.
    pub(crate) fn release(&self, idx: NodeIndex) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let node = state.pool.get_mut(idx);
        debug_assert!(node.refs > 0, "released an index node with no references");
        node.refs -= 1;
        if node.refs > 0 {
            return;
        }

        let node = state.pool.release(idx);
        state.handles.remove(&node.instance);

        if node.active {
            state.active.remove(&node.key);
            if let Some(next) = node.next {
                let successor = state.pool.get_mut(next);
                successor.prev = None;
                successor.active = true;
                state.active.insert(node.key, next);
                log::debug!(
                    "promoted pending instance for '{}'",
                    interner::resolve(node.key.name())
                );
            } else {
                log::trace!("unregistered '{}'", interner::resolve(node.key.name()));
            }
        } else {
            if let Some(prev) = node.prev {
                state.pool.get_mut(prev).next = node.next;
            }
            if let Some(next) = node.next {
                state.pool.get_mut(next).prev = node.prev;
            }
        }

        drop(guard);
        // The payload is dropped outside the lock: releasing a composite
        // asset may release further references and re-enter the indexer.
        drop(node.asset);
    }
}
