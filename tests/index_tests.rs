//! Asset Index Tests
//!
//! Tests for:
//! - Pass-through references for untracked asset types
//! - Handle cache: re-indexing the same instance shares its entry
//! - Duplicate-key chains: single active registration, FIFO promotion
//! - Release isolation between instances of one key
//! - Node pool reuse across index/dispose cycles
//! - Thread safety of a shared indexer

use std::sync::Arc;

use effigy::index::{AssetIndexer, Indexable};

struct Hat {
    name: String,
}

impl Hat {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }
}

impl Indexable for Hat {
    fn index_name(&self) -> &str {
        &self.name
    }
}

struct Badge {
    name: String,
}

impl Indexable for Badge {
    fn index_name(&self) -> &str {
        &self.name
    }
}

fn tracked_indexer() -> Arc<AssetIndexer> {
    let indexer = Arc::new(AssetIndexer::new());
    indexer.track::<Hat>();
    indexer
}

// ============================================================================
// Tracked-Type Registration
// ============================================================================

#[test]
fn untracked_type_gets_pass_through_ref() {
    let indexer = tracked_indexer();
    let badge = Arc::new(Badge {
        name: "vip".into(),
    });

    let r = indexer.index(Arc::clone(&badge));
    assert!(!r.is_tracked());
    assert_eq!(r.name, "vip");

    // The index itself is never touched.
    let stats = indexer.stats();
    assert_eq!(stats.live_nodes, 0);
    assert_eq!(stats.active_keys, 0);
    assert_eq!(stats.cached_handles, 0);
    assert!(!indexer.is_indexed::<Badge>("vip"));

    let r2 = r.clone();
    drop(r);
    drop(r2);
    assert_eq!(indexer.stats().live_nodes, 0);
}

#[test]
fn tracked_type_is_registered() {
    let indexer = tracked_indexer();
    assert!(indexer.is_tracked::<Hat>());
    assert!(!indexer.is_tracked::<Badge>());

    let _r = indexer.index(Hat::new("red"));
    assert!(indexer.is_indexed::<Hat>("red"));
}

// ============================================================================
// Handle Cache: Same Instance Indexed Twice
// ============================================================================

#[test]
fn same_instance_indexed_twice_shares_one_entry() {
    let indexer = tracked_indexer();
    let hat = Hat::new("red");

    let r1 = indexer.index(Arc::clone(&hat));
    let r2 = indexer.index(Arc::clone(&hat));
    assert!(r1.is_tracked() && r2.is_tracked());

    let stats = indexer.stats();
    assert_eq!(stats.live_nodes, 1, "one instance, one node");
    assert_eq!(stats.cached_handles, 1);
    assert_eq!(stats.active_keys, 1);

    // Either reference alone keeps the key registered.
    drop(r1);
    assert!(indexer.is_indexed::<Hat>("red"));
    drop(r2);
    assert!(!indexer.is_indexed::<Hat>("red"));
    assert_eq!(indexer.stats().live_nodes, 0);
}

#[test]
fn refs_to_one_instance_dispose_in_any_order() {
    let indexer = tracked_indexer();
    let hat = Hat::new("red");

    let r1 = indexer.index(Arc::clone(&hat));
    let r2 = indexer.index(Arc::clone(&hat));
    drop(r2);
    assert!(indexer.is_indexed::<Hat>("red"));
    drop(r1);
    assert!(!indexer.is_indexed::<Hat>("red"));
}

#[test]
fn cloning_a_ref_shares_the_entry() {
    let indexer = tracked_indexer();
    let r1 = indexer.index(Hat::new("red"));
    let r2 = r1.clone();

    assert_eq!(indexer.stats().live_nodes, 1);
    drop(r1);
    assert!(indexer.is_indexed::<Hat>("red"));
    drop(r2);
    assert!(!indexer.is_indexed::<Hat>("red"));
}

// ============================================================================
// Duplicate-Key Chains
// ============================================================================

#[test]
fn second_instance_of_a_key_queues_behind_the_active() {
    let indexer = tracked_indexer();
    let first = Hat::new("red");
    let second = Hat::new("red");

    let _r1 = indexer.index(Arc::clone(&first));
    let _r2 = indexer.index(Arc::clone(&second));

    let stats = indexer.stats();
    assert_eq!(stats.live_nodes, 2, "both instances live");
    assert_eq!(stats.active_keys, 1, "only one registration per key");

    let active = indexer.get::<Hat>("red").unwrap();
    assert!(Arc::ptr_eq(&active, &first), "first in stays active");
}

#[test]
fn disposing_the_active_promotes_the_pending() {
    let indexer = tracked_indexer();
    let first = Hat::new("red");
    let second = Hat::new("red");

    let r1 = indexer.index(Arc::clone(&first));
    let _r2 = indexer.index(Arc::clone(&second));

    drop(r1);
    let active = indexer.get::<Hat>("red").unwrap();
    assert!(Arc::ptr_eq(&active, &second), "pending instance takes over");
    assert_eq!(indexer.stats().live_nodes, 1);
    assert_eq!(indexer.stats().active_keys, 1);
}

#[test]
fn disposing_a_pending_never_disturbs_the_active() {
    let indexer = tracked_indexer();
    let first = Hat::new("red");
    let second = Hat::new("red");

    let _r1 = indexer.index(Arc::clone(&first));
    let r2 = indexer.index(Arc::clone(&second));

    drop(r2);
    let active = indexer.get::<Hat>("red").unwrap();
    assert!(Arc::ptr_eq(&active, &first), "active unchanged");
    assert_eq!(indexer.stats().live_nodes, 1);
}

#[test]
fn promotion_is_fifo_across_three_instances() {
    let indexer = tracked_indexer();
    let a = Hat::new("red");
    let b = Hat::new("red");
    let c = Hat::new("red");

    let ra = indexer.index(Arc::clone(&a));
    let rb = indexer.index(Arc::clone(&b));
    let rc = indexer.index(Arc::clone(&c));

    drop(ra);
    assert!(Arc::ptr_eq(&indexer.get::<Hat>("red").unwrap(), &b));
    drop(rb);
    assert!(Arc::ptr_eq(&indexer.get::<Hat>("red").unwrap(), &c));
    drop(rc);
    assert!(indexer.get::<Hat>("red").is_none());
}

#[test]
fn unlinking_a_middle_pending_keeps_chain_order() {
    let indexer = tracked_indexer();
    let a = Hat::new("red");
    let b = Hat::new("red");
    let c = Hat::new("red");

    let ra = indexer.index(Arc::clone(&a));
    let rb = indexer.index(Arc::clone(&b));
    let _rc = indexer.index(Arc::clone(&c));

    drop(rb);
    drop(ra);
    assert!(
        Arc::ptr_eq(&indexer.get::<Hat>("red").unwrap(), &c),
        "promotion skips the unlinked instance"
    );
}

// ============================================================================
// Name Canonicalization
// ============================================================================

#[test]
fn clone_suffixes_resolve_to_the_same_key() {
    let indexer = tracked_indexer();
    let original = Hat::new("Red Hat");
    let cloned = Hat::new("Red Hat (Clone)");

    let _r1 = indexer.index(Arc::clone(&original));
    let _r2 = indexer.index(Arc::clone(&cloned));

    let stats = indexer.stats();
    assert_eq!(stats.active_keys, 1, "suffix strips to the original key");
    assert_eq!(stats.live_nodes, 2);
    assert!(indexer.is_indexed::<Hat>("Red Hat(Clone)(Clone)"));
}

#[test]
fn types_partition_the_key_space() {
    let indexer = tracked_indexer();
    indexer.track::<Badge>();

    let _hat = indexer.index(Hat::new("red"));
    let _badge = indexer.index(Arc::new(Badge {
        name: "red".into(),
    }));

    assert_eq!(indexer.stats().active_keys, 2);
    assert!(indexer.is_indexed::<Hat>("red"));
    assert!(indexer.is_indexed::<Badge>("red"));
}

// ============================================================================
// Node Pool
// ============================================================================

#[test]
fn pool_returns_to_baseline_after_index_dispose_cycles() {
    let indexer = tracked_indexer();

    let refs: Vec<_> = (0..3)
        .map(|i| indexer.index(Hat::new(&format!("hat-{i}"))))
        .collect();
    assert_eq!(indexer.stats().live_nodes, 3);
    assert_eq!(indexer.stats().pooled_nodes, 0);

    drop(refs);
    let stats = indexer.stats();
    assert_eq!(stats.live_nodes, 0);
    assert_eq!(stats.pooled_nodes, 3, "retired nodes land in the pool");

    // A fresh round draws from the pool instead of growing it.
    let _r = indexer.index(Hat::new("another"));
    let stats = indexer.stats();
    assert_eq!(stats.live_nodes, 1);
    assert_eq!(stats.pooled_nodes, 2);
}

// ============================================================================
// Thread Safety
// ============================================================================

#[test]
fn concurrent_index_and_dispose_settles_clean() {
    use std::thread;

    let indexer = tracked_indexer();

    let mut workers = Vec::new();
    for t in 0..4 {
        let indexer = Arc::clone(&indexer);
        workers.push(thread::spawn(move || {
            for i in 0..50 {
                let r = indexer.index(Hat::new(&format!("hat-{}", (t + i) % 8)));
                let extra = r.clone();
                drop(r);
                drop(extra);
            }
        }));
    }
    for w in workers {
        w.join().unwrap();
    }

    let stats = indexer.stats();
    assert_eq!(stats.live_nodes, 0);
    assert_eq!(stats.active_keys, 0);
    assert_eq!(stats.cached_handles, 0);
}

#[test]
fn concurrent_duplicates_keep_a_single_registration() {
    use std::thread;

    let indexer = tracked_indexer();

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let indexer = Arc::clone(&indexer);
            thread::spawn(move || indexer.index(Hat::new("popular")))
        })
        .collect();
    let refs: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    let stats = indexer.stats();
    assert_eq!(stats.live_nodes, 8);
    assert_eq!(stats.active_keys, 1, "eight instances, one registration");

    drop(refs);
    assert_eq!(indexer.stats().live_nodes, 0);
    assert!(!indexer.is_indexed::<Hat>("popular"));
}
