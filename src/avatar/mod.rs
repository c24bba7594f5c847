//! Avatar Composition
//!
//! The top layer: [`AvatarComposer`] wires the loaders, the asset
//! index, the outfit rules, and the flag store into one equip pipeline.
//!
//! ```text
//! equip_wearable
//!   ├─ load payloads (cache → loader, concurrent)
//!   ├─ index payloads (duplicate suppression)
//!   ├─ apply slot rules (evictions, visibility)
//!   ├─ release evicted wearables' references
//!   └─ emit ComposerEvents
//! ```
//!
//! Each [`Avatar`] owns its equip state and the references keeping its
//! payloads registered; dropping the avatar returns everything to the
//! pool.

mod composer;
mod payload;

pub use composer::{Avatar, AvatarComposer, ComposerEvent};
pub use payload::{
    AssetPayload, CatalogLoader, MemoryLoader, WearableLoader, WearableLoaderVariant,
};
