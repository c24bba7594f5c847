//! Outfit Slot Registry
//!
//! Slots are the named equip locations of an avatar ("hair", "hat",
//! "jacket", ...). A [`SlotRegistry`] declares them once, in order, and
//! records the two rule relations the equip engine resolves:
//!
//! - `incompatible_with` — the slots cannot be occupied together. The
//!   relation is symmetric and is normalized at build time, so declaring
//!   it on either side is enough.
//! - `suppresses` — a directional visibility rule: while the declaring
//!   slot is occupied, the suppressed slots stay equipped but hidden.
//!
//! Registries are immutable after construction and cheap to share.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::errors::{EffigyError, Result};
use crate::utils::Symbol;
use crate::utils::interner;

/// Dense index of a declared slot. Valid only for the registry that
/// issued it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct SlotId(u16);

impl SlotId {
    /// Position of the slot in declaration order.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// One slot declaration, as found in a slot-rule config document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Slot name, unique within the registry.
    pub name: String,
    /// Slots hidden while this slot is occupied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppresses: Vec<String>,
    /// Slots that cannot be occupied together with this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incompatible_with: Vec<String>,
}

impl SlotConfig {
    /// A plain slot with no rules.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

struct SlotDef {
    name: Symbol,
    suppresses: SmallVec<[SlotId; 4]>,
    incompatible: SmallVec<[SlotId; 4]>,
}

// Slot counts are capped at u16 range in `from_configs`.
fn slot_id(index: usize) -> SlotId {
    SlotId(index as u16)
}

/// Immutable set of declared slots and their rules.
pub struct SlotRegistry {
    slots: Vec<SlotDef>,
    by_name: FxHashMap<Symbol, SlotId>,
}

impl SlotRegistry {
    /// Builds a registry from slot declarations.
    ///
    /// Duplicate names, rules naming undeclared slots, and rules a slot
    /// declares against itself are rejected. The symmetric closure of
    /// `incompatible_with` is computed here.
    pub fn from_configs(configs: &[SlotConfig]) -> Result<Self> {
        let mut by_name = FxHashMap::default();
        let mut slots = Vec::with_capacity(configs.len());

        if u16::try_from(configs.len()).is_err() {
            return Err(EffigyError::InvalidManifest(
                "more than 65535 outfit slots declared".into(),
            ));
        }

        for (i, config) in configs.iter().enumerate() {
            let id = slot_id(i);
            let name = interner::intern(config.name.trim());
            if by_name.insert(name, id).is_some() {
                return Err(EffigyError::DuplicateSlot(config.name.clone()));
            }
            slots.push(SlotDef {
                name,
                suppresses: SmallVec::new(),
                incompatible: SmallVec::new(),
            });
        }

        let resolve = |raw: &str| -> Result<SlotId> {
            interner::get(raw.trim())
                .and_then(|sym| by_name.get(&sym).copied())
                .ok_or_else(|| EffigyError::UnknownSlot(raw.to_owned()))
        };

        for (i, config) in configs.iter().enumerate() {
            let id = slot_id(i);
            for raw in &config.suppresses {
                let target = resolve(raw)?;
                if target == id {
                    return Err(EffigyError::SelfReferentialRule(config.name.clone()));
                }
                if !slots[id.index()].suppresses.contains(&target) {
                    slots[id.index()].suppresses.push(target);
                }
            }
            for raw in &config.incompatible_with {
                let target = resolve(raw)?;
                if target == id {
                    return Err(EffigyError::SelfReferentialRule(config.name.clone()));
                }
                // Symmetric closure: record the exclusion on both sides.
                if !slots[id.index()].incompatible.contains(&target) {
                    slots[id.index()].incompatible.push(target);
                }
                if !slots[target.index()].incompatible.contains(&id) {
                    slots[target.index()].incompatible.push(id);
                }
            }
        }

        log::debug!("slot registry built: {} slots", slots.len());
        Ok(Self { slots, by_name })
    }

    /// Builds a registry from a JSON array of [`SlotConfig`] documents.
    pub fn from_json(json: &str) -> Result<Self> {
        let configs: Vec<SlotConfig> = serde_json::from_str(json)?;
        Self::from_configs(&configs)
    }

    /// The common humanoid slot set with stock rules: hats hide hair,
    /// full-coverage garments hide the layers under them, and the two
    /// full-coverage slots exclude each other.
    pub fn standard() -> Result<Self> {
        interner::preload_common_slots();
        let mut configs: Vec<SlotConfig> = [
            "head", "hair", "face", "torso", "jacket", "legs", "feet", "hands", "glasses",
            "earrings", "necklace", "wristwear", "backpack",
        ]
        .into_iter()
        .map(SlotConfig::plain)
        .collect();
        configs.push(SlotConfig {
            name: "hat".into(),
            suppresses: vec!["hair".into()],
            ..SlotConfig::default()
        });
        configs.push(SlotConfig {
            name: "fullbody".into(),
            suppresses: vec!["torso".into(), "jacket".into(), "legs".into()],
            ..SlotConfig::default()
        });
        configs.push(SlotConfig {
            name: "costume".into(),
            suppresses: vec![
                "torso".into(),
                "jacket".into(),
                "legs".into(),
                "hat".into(),
                "backpack".into(),
            ],
            incompatible_with: vec!["fullbody".into()],
        });
        Self::from_configs(&configs)
    }

    /// Looks up a slot by name.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<SlotId> {
        let sym = interner::get(name.trim())?;
        self.by_name.get(&sym).copied()
    }

    /// Looks up a slot by name, erroring if it was never declared.
    pub fn require(&self, name: &str) -> Result<SlotId> {
        self.id(name)
            .ok_or_else(|| EffigyError::UnknownSlot(name.to_owned()))
    }

    /// Declared name of a slot.
    #[must_use]
    pub fn name(&self, slot: SlotId) -> &'static str {
        interner::resolve(self.slots[slot.index()].name)
    }

    /// Number of declared slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All slot ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        (0..self.slots.len()).map(slot_id)
    }

    /// Slots hidden while `slot` is occupied.
    #[must_use]
    pub fn suppresses(&self, slot: SlotId) -> &[SlotId] {
        &self.slots[slot.index()].suppresses
    }

    /// Slots that cannot be occupied together with `slot` (symmetric).
    #[must_use]
    pub fn incompatible_with(&self, slot: SlotId) -> &[SlotId] {
        &self.slots[slot.index()].incompatible
    }

    pub(crate) fn contains(&self, slot: SlotId) -> bool {
        slot.index() < self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_fixture() -> Vec<SlotConfig> {
        vec![
            SlotConfig::plain("hair"),
            SlotConfig {
                name: "hat".into(),
                suppresses: vec!["hair".into()],
                ..SlotConfig::default()
            },
            SlotConfig {
                name: "costume".into(),
                incompatible_with: vec!["jacket".into()],
                ..SlotConfig::default()
            },
            SlotConfig::plain("jacket"),
        ]
    }

    #[test]
    fn declaration_order_is_preserved() {
        let reg = SlotRegistry::from_configs(&rules_fixture()).unwrap();
        assert_eq!(reg.len(), 4);
        let names: Vec<_> = reg.ids().map(|id| reg.name(id)).collect();
        assert_eq!(names, ["hair", "hat", "costume", "jacket"]);
    }

    #[test]
    fn incompatibility_is_symmetric() {
        let reg = SlotRegistry::from_configs(&rules_fixture()).unwrap();
        let costume = reg.id("costume").unwrap();
        let jacket = reg.id("jacket").unwrap();
        assert!(reg.incompatible_with(costume).contains(&jacket));
        assert!(reg.incompatible_with(jacket).contains(&costume));
    }

    #[test]
    fn suppression_is_directional() {
        let reg = SlotRegistry::from_configs(&rules_fixture()).unwrap();
        let hat = reg.id("hat").unwrap();
        let hair = reg.id("hair").unwrap();
        assert!(reg.suppresses(hat).contains(&hair));
        assert!(reg.suppresses(hair).is_empty());
    }

    #[test]
    fn duplicate_slot_rejected() {
        let configs = vec![SlotConfig::plain("hat"), SlotConfig::plain("hat")];
        assert!(matches!(
            SlotRegistry::from_configs(&configs),
            Err(EffigyError::DuplicateSlot(_))
        ));
    }

    #[test]
    fn unknown_rule_target_rejected() {
        let configs = vec![SlotConfig {
            name: "hat".into(),
            suppresses: vec!["wig".into()],
            ..SlotConfig::default()
        }];
        assert!(matches!(
            SlotRegistry::from_configs(&configs),
            Err(EffigyError::UnknownSlot(_))
        ));
    }

    #[test]
    fn self_rule_rejected() {
        let configs = vec![SlotConfig {
            name: "hat".into(),
            suppresses: vec!["hat".into()],
            ..SlotConfig::default()
        }];
        assert!(matches!(
            SlotRegistry::from_configs(&configs),
            Err(EffigyError::SelfReferentialRule(_))
        ));
    }

    #[test]
    fn from_json_round_trip() {
        let json = r#"[
            {"name": "hair"},
            {"name": "hat", "suppresses": ["hair"]}
        ]"#;
        let reg = SlotRegistry::from_json(json).unwrap();
        let hat = reg.id("hat").unwrap();
        assert_eq!(reg.suppresses(hat).len(), 1);
    }

    #[test]
    fn standard_set_has_expected_rules() {
        let reg = SlotRegistry::standard().unwrap();
        let costume = reg.id("costume").unwrap();
        let fullbody = reg.id("fullbody").unwrap();
        assert!(reg.incompatible_with(costume).contains(&fullbody));
        assert!(reg.incompatible_with(fullbody).contains(&costume));
        let hat = reg.id("hat").unwrap();
        assert_eq!(reg.name(reg.suppresses(hat)[0]), "hair");
    }
}
