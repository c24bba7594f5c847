use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::errors::{EffigyError, Result};
use crate::outfit::slots::{SlotId, SlotRegistry};

/// Namespace for deriving stable wearable ids from their content names.
const WEARABLE_NAMESPACE: Uuid = Uuid::from_u128(0x9c0a_52d4_71be_4f21_a66c_3f08_d3e1_b944);

bitflags::bitflags! {
    /// Tag bits describing how a wearable is authored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WearableTraits: u32 {
        /// Mesh is skinned to the avatar rig.
        const SKINNED = 1 << 0;
        /// Rigidly attached to a single joint.
        const RIGID = 1 << 1;
        /// Ships its own animation clips.
        const ANIMATED = 1 << 2;
        /// Responds to user color customization.
        const TINTABLE = 1 << 3;
    }
}

/// A wearable item: the unit the outfit engine equips into a slot.
///
/// The id is derived from slot + name, so the same logical item carries
/// the same id wherever it is defined; use [`Wearable::with_id`] when an
/// upstream catalog already assigns one.
#[derive(Debug, Clone)]
pub struct Wearable {
    id: Uuid,
    name: String,
    slot: SlotId,
    asset_keys: SmallVec<[String; 2]>,
    traits: WearableTraits,
}

impl Wearable {
    pub fn new(name: impl Into<String>, slot: SlotId) -> Self {
        let name = name.into();
        let mut seed = name.clone().into_bytes();
        seed.extend_from_slice(&u64::to_le_bytes(slot.index() as u64));
        Self {
            id: Uuid::new_v5(&WEARABLE_NAMESPACE, &seed),
            name,
            slot,
            asset_keys: SmallVec::new(),
            traits: WearableTraits::empty(),
        }
    }

    /// Replaces the derived id with an upstream-assigned one.
    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Adds a catalog key this wearable's payload is loaded from.
    #[must_use]
    pub fn with_asset_key(mut self, key: impl Into<String>) -> Self {
        self.asset_keys.push(key.into());
        self
    }

    #[must_use]
    pub fn with_traits(mut self, traits: WearableTraits) -> Self {
        self.traits = traits;
        self
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// Catalog keys of the payloads backing this wearable.
    #[must_use]
    pub fn asset_keys(&self) -> &[String] {
        &self.asset_keys
    }

    #[must_use]
    pub fn traits(&self) -> WearableTraits {
        self.traits
    }

    #[must_use]
    pub fn has_trait(&self, traits: WearableTraits) -> bool {
        self.traits.contains(traits)
    }
}

/// One wearable declaration, as found in a wardrobe config document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WearableConfig {
    pub name: String,
    /// Target slot, by registry name.
    pub slot: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub asset_keys: Vec<String>,
    /// Trait names, case-insensitive (`"skinned"`, `"tintable"`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<String>,
}

impl Wearable {
    /// Resolves a config document against a slot registry.
    pub fn from_config(registry: &SlotRegistry, config: &WearableConfig) -> Result<Self> {
        let slot = registry.require(&config.slot)?;
        let mut traits = WearableTraits::empty();
        for raw in &config.traits {
            let flag = WearableTraits::from_name(&raw.to_ascii_uppercase())
                .ok_or_else(|| EffigyError::InvalidManifest(format!("unknown trait '{raw}'")))?;
            traits |= flag;
        }
        let mut wearable = Self::new(config.name.clone(), slot).with_traits(traits);
        for key in &config.asset_keys {
            wearable = wearable.with_asset_key(key);
        }
        Ok(wearable)
    }
}
