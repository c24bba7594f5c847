//! Chain Nodes and the Node Pool
//!
//! Every indexed instance occupies one [`IndexNode`]. Nodes that share a
//! key form a doubly-linked chain through arena indices; the head of the
//! chain is the instance registered in the active-key map.
//!
//! Retired nodes go back to a free list instead of being deallocated, so
//! steady-state equip/release cycles do not churn the allocator. The free
//! list length is observable through [`NodePool::free_count`].

use std::any::Any;
use std::sync::Arc;

use crate::index::key::{IndexKey, InstanceId};

/// Arena index of a node within the pool.
pub(crate) type NodeIndex = u32;

/// One physical asset instance bound to an index key.
pub(crate) struct IndexNode {
    /// Key whose chain this node belongs to.
    pub key: IndexKey,
    /// The instance itself, type-erased. Dropped outside the indexer lock.
    pub asset: Option<Arc<dyn Any + Send + Sync>>,
    /// Allocation identity used by the handle cache.
    pub instance: InstanceId,
    /// Previous node in the key chain (`None` for the head).
    pub prev: Option<NodeIndex>,
    /// Next node in the key chain (`None` for the tail).
    pub next: Option<NodeIndex>,
    /// Outstanding [`AssetRef`](crate::index::AssetRef)s on this node.
    pub refs: u32,
    /// Whether this node is the one registered in the active-key map.
    pub active: bool,
}

impl IndexNode {
    pub(crate) fn new(
        key: IndexKey,
        instance: InstanceId,
        asset: Arc<dyn Any + Send + Sync>,
    ) -> Self {
        Self {
            key,
            asset: Some(asset),
            instance,
            prev: None,
            next: None,
            refs: 1,
            active: false,
        }
    }
}

/// Slab of [`IndexNode`]s with free-list recycling.
///
/// Freed slots are reused in LIFO order on subsequent acquires; the slab
/// only grows when no freed slot is available.
pub(crate) struct NodePool {
    slots: Vec<Option<IndexNode>>,
    free: Vec<NodeIndex>,
}

impl NodePool {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Places a node into the pool, reusing a freed slot when possible.
    pub(crate) fn acquire(&mut self, node: IndexNode) -> NodeIndex {
        if let Some(idx) = self.free.pop() {
            self.slots[idx as usize] = Some(node);
            idx
        } else {
            let idx = self.slots.len() as NodeIndex;
            self.slots.push(Some(node));
            idx
        }
    }

    /// Takes a node out of the pool and recycles its slot.
    ///
    /// The node is returned by value so the caller can drop its asset
    /// payload after releasing the indexer lock.
    ///
    /// # Panics
    /// Panics if `idx` does not refer to a live node.
    pub(crate) fn release(&mut self, idx: NodeIndex) -> IndexNode {
        let node = self.slots[idx as usize]
            .take()
            .unwrap_or_else(|| panic!("released vacant index node {idx}"));
        self.free.push(idx);
        node
    }

    /// # Panics
    /// Panics if `idx` does not refer to a live node.
    pub(crate) fn get(&self, idx: NodeIndex) -> &IndexNode {
        self.slots[idx as usize]
            .as_ref()
            .unwrap_or_else(|| panic!("accessed vacant index node {idx}"))
    }

    /// # Panics
    /// Panics if `idx` does not refer to a live node.
    pub(crate) fn get_mut(&mut self, idx: NodeIndex) -> &mut IndexNode {
        self.slots[idx as usize]
            .as_mut()
            .unwrap_or_else(|| panic!("accessed vacant index node {idx}"))
    }

    /// Number of live nodes.
    pub(crate) fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of retired nodes waiting on the free list.
    pub(crate) fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Total slots ever allocated (live + free).
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}
