use std::sync::{Arc, Weak};

use futures::future::try_join_all;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::avatar::payload::{
    AssetPayload, CatalogLoader, MemoryLoader, WearableLoaderVariant,
};
use crate::catalog::{Catalog, CatalogSource};
use crate::errors::Result;
use crate::flags::{FeatureFlags, keys};
use crate::index::{AssetIndexer, AssetRef};
use crate::outfit::{EquipOutcome, OutfitController, SlotId, SlotRegistry, Wearable};
use crate::utils::runtime;

/// Notifications emitted while outfits change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerEvent {
    WearableEquipped {
        avatar: Uuid,
        wearable: Uuid,
        slot: SlotId,
    },
    /// Removed by a direct unequip or clear.
    WearableUnequipped {
        avatar: Uuid,
        wearable: Uuid,
        slot: SlotId,
    },
    /// Removed because another wearable's rules displaced it.
    WearableEvicted {
        avatar: Uuid,
        wearable: Uuid,
        slot: SlotId,
    },
    VisibilityChanged {
        avatar: Uuid,
        slot: SlotId,
        hidden: bool,
    },
}

/// One avatar: identity, equip state, and the asset references its
/// wearables hold.
///
/// Dropping an avatar drops every held reference, retiring their index
/// entries and returning their nodes to the pool.
pub struct Avatar {
    id: Uuid,
    outfit: OutfitController,
    held: FxHashMap<Uuid, SmallVec<[AssetRef<AssetPayload>; 2]>>,
}

impl Avatar {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn outfit(&self) -> &OutfitController {
        &self.outfit
    }

    /// Total asset references held across equipped wearables.
    #[must_use]
    pub fn held_ref_count(&self) -> usize {
        self.held.values().map(SmallVec::len).sum()
    }
}

/// Ties the pieces together: loads wearable payloads, routes them
/// through the asset index, applies outfit rules, and emits events.
///
/// Events queue unbounded until drained from [`AvatarComposer::events`].
pub struct AvatarComposer {
    indexer: Arc<AssetIndexer>,
    registry: Arc<SlotRegistry>,
    catalog: Arc<Catalog>,
    flags: Arc<FeatureFlags>,
    loader: WearableLoaderVariant,
    /// Live payloads by catalog key, so a key equipping onto several
    /// avatars shares one instance while any of them holds it. Entries
    /// whose payload has dropped are swept on the next miss.
    payload_cache: Mutex<FxHashMap<String, Weak<AssetPayload>>>,
    events_tx: flume::Sender<ComposerEvent>,
    events_rx: flume::Receiver<ComposerEvent>,
}

impl AvatarComposer {
    /// Composer over an in-memory loader. Test and tooling entry point.
    pub fn with_memory_loader(
        registry: Arc<SlotRegistry>,
        mut catalog: Catalog,
        loader: Arc<MemoryLoader>,
        flags: Arc<FeatureFlags>,
    ) -> Result<Self> {
        Self::apply_catalog_flags(&mut catalog, &flags)?;
        Ok(Self::build(
            registry,
            Arc::new(catalog),
            WearableLoaderVariant::Memory(loader),
            flags,
        ))
    }

    /// Composer that fetches payloads from the catalog's selected
    /// environment.
    pub fn with_catalog_source(
        registry: Arc<SlotRegistry>,
        mut catalog: Catalog,
        flags: Arc<FeatureFlags>,
    ) -> Result<Self> {
        Self::apply_catalog_flags(&mut catalog, &flags)?;
        let catalog = Arc::new(catalog);
        let source = CatalogSource::for_catalog(&catalog)?;
        let verify = flags.bool_or(keys::VERIFY_CHECKSUMS, true);
        let loader = WearableLoaderVariant::Catalog(Arc::new(CatalogLoader::new(
            Arc::clone(&catalog),
            source,
            verify,
        )));
        Ok(Self::build(registry, catalog, loader, flags))
    }

    fn apply_catalog_flags(catalog: &mut Catalog, flags: &FeatureFlags) -> Result<()> {
        let env = flags.str_or(keys::CATALOG_ENVIRONMENT, catalog.environment());
        if env != catalog.environment() {
            catalog.select_environment(&env)?;
        }
        Ok(())
    }

    fn build(
        registry: Arc<SlotRegistry>,
        catalog: Arc<Catalog>,
        loader: WearableLoaderVariant,
        flags: Arc<FeatureFlags>,
    ) -> Self {
        let indexer = Arc::new(AssetIndexer::new());
        if flags.bool_or(keys::INDEX_DEDUP, true) {
            indexer.track::<AssetPayload>();
        } else {
            log::warn!("duplicate-suppression indexing disabled by flag");
        }
        let (events_tx, events_rx) = flume::unbounded();
        Self {
            indexer,
            registry,
            catalog,
            flags,
            loader,
            payload_cache: Mutex::new(FxHashMap::default()),
            events_tx,
            events_rx,
        }
    }

    #[must_use]
    pub fn create_avatar(&self) -> Avatar {
        let avatar = Avatar {
            id: Uuid::new_v4(),
            outfit: OutfitController::new(Arc::clone(&self.registry)),
            held: FxHashMap::default(),
        };
        log::debug!("avatar {} created", avatar.id);
        avatar
    }

    /// Loads a wearable's payloads concurrently, indexes them, equips
    /// the wearable, and releases whatever its rules displaced.
    pub async fn equip_wearable(
        &self,
        avatar: &mut Avatar,
        wearable: Arc<Wearable>,
    ) -> Result<EquipOutcome> {
        let loads = wearable.asset_keys().iter().map(|key| self.load_payload(key));
        let payloads = try_join_all(loads).await?;
        let refs: SmallVec<[AssetRef<AssetPayload>; 2]> = payloads
            .into_iter()
            .map(|payload| self.indexer.index(payload))
            .collect();

        let outcome = avatar.outfit.equip(Arc::clone(&wearable));
        for evicted in &outcome.evicted {
            avatar.held.remove(&evicted.id());
            self.emit(ComposerEvent::WearableEvicted {
                avatar: avatar.id,
                wearable: evicted.id(),
                slot: evicted.slot(),
            });
        }
        avatar.held.insert(wearable.id(), refs);
        self.emit(ComposerEvent::WearableEquipped {
            avatar: avatar.id,
            wearable: wearable.id(),
            slot: wearable.slot(),
        });
        self.emit_visibility(avatar.id, &outcome);
        log::debug!("avatar {}: equipped '{}'", avatar.id, wearable.name());
        Ok(outcome)
    }

    /// Synchronous wrapper around [`AvatarComposer::equip_wearable`].
    pub fn equip_wearable_blocking(
        &self,
        avatar: &mut Avatar,
        wearable: Arc<Wearable>,
    ) -> Result<EquipOutcome> {
        runtime::loader_runtime().block_on(self.equip_wearable(avatar, wearable))
    }

    /// Removes the slot's occupant and releases its asset references.
    pub fn unequip_slot(&self, avatar: &mut Avatar, slot: SlotId) -> EquipOutcome {
        let outcome = avatar.outfit.unequip(slot);
        for removed in &outcome.evicted {
            avatar.held.remove(&removed.id());
            self.emit(ComposerEvent::WearableUnequipped {
                avatar: avatar.id,
                wearable: removed.id(),
                slot: removed.slot(),
            });
        }
        self.emit_visibility(avatar.id, &outcome);
        outcome
    }

    /// Removes everything the avatar wears.
    pub fn clear_outfit(&self, avatar: &mut Avatar) -> EquipOutcome {
        let outcome = avatar.outfit.clear();
        for removed in &outcome.evicted {
            avatar.held.remove(&removed.id());
            self.emit(ComposerEvent::WearableUnequipped {
                avatar: avatar.id,
                wearable: removed.id(),
                slot: removed.slot(),
            });
        }
        self.emit_visibility(avatar.id, &outcome);
        outcome
    }

    /// The event stream. Drain with `try_iter()`.
    #[must_use]
    pub fn events(&self) -> &flume::Receiver<ComposerEvent> {
        &self.events_rx
    }

    #[must_use]
    pub fn indexer(&self) -> &Arc<AssetIndexer> {
        &self.indexer
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SlotRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    async fn load_payload(&self, key: &str) -> Result<Arc<AssetPayload>> {
        if let Some(hit) = self.payload_cache.lock().get(key).and_then(Weak::upgrade) {
            log::trace!("payload cache hit for '{key}'");
            return Ok(hit);
        }
        // Two racing loads of one key may both miss and materialize two
        // instances; the index chains the duplicate behind the first.
        let payload = self.loader.load(key).await?;
        let mut cache = self.payload_cache.lock();
        cache.retain(|_, weak| weak.strong_count() > 0);
        cache.insert(key.to_owned(), Arc::downgrade(&payload));
        Ok(payload)
    }

    fn emit(&self, event: ComposerEvent) {
        self.events_tx.send(event).ok();
    }

    fn emit_visibility(&self, avatar: Uuid, outcome: &EquipOutcome) {
        for &slot in &outcome.newly_hidden {
            self.emit(ComposerEvent::VisibilityChanged {
                avatar,
                slot,
                hidden: true,
            });
        }
        for &slot in &outcome.newly_visible {
            self.emit(ComposerEvent::VisibilityChanged {
                avatar,
                slot,
                hidden: false,
            });
        }
    }
}
