//! Reference-Counted Asset Index
//!
//! Composition systems resolve assets by canonical name. This module
//! keeps that resolution unambiguous when the same logical asset is
//! delivered more than once (two content bundles shipping the same
//! wearable, a retry re-downloading a catalog entry):
//!
//! - [`AssetIndexer`] — the index itself: one registered instance per
//!   key, duplicates queued FIFO behind it, pooled nodes.
//! - [`AssetRef`] — ownership handle; the entry lives while any ref does.
//! - [`IndexKey`] / [`canonical_name`] — name canonicalization and the
//!   `(type, name)` key space.
//! - [`Indexable`] — implemented by asset types that want indexing.
//!
//! See [`AssetIndexer`] for the chain/promotion semantics.

mod indexer;
mod key;
mod node;
mod reference;

pub use indexer::{AssetIndexer, Indexable, IndexerStats};
pub use key::{IndexKey, InstanceId, UNNAMED, canonical_name};
pub use reference::AssetRef;
