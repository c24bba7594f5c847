//! Equip State + Conflict Resolution
//!
//! [`OutfitController`] tracks what one avatar wears. Every mutation
//! resolves the registry rules in the same way:
//!
//! 1. the target slot's occupant is evicted (one wearable per slot);
//! 2. occupants of slots incompatible with the target are evicted;
//! 3. the hidden set is recomputed from scratch as the union of
//!    `suppresses(s)` over every occupied slot `s`.
//!
//! Recomputing rather than patching keeps hiding order-independent: the
//! hidden set depends only on which slots are occupied, never on the
//! order they were equipped in. Suppressed wearables stay equipped and
//! reappear the moment their suppressor leaves.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::outfit::slots::{SlotId, SlotRegistry};
use crate::outfit::wearable::Wearable;

/// What one equip/unequip call changed.
#[derive(Debug, Default)]
pub struct EquipOutcome {
    /// Wearables removed by the operation (slot occupant + incompatible
    /// occupants), in eviction order.
    pub evicted: SmallVec<[Arc<Wearable>; 2]>,
    /// Slots that became hidden, in declaration order.
    pub newly_hidden: SmallVec<[SlotId; 2]>,
    /// Slots that became visible again, in declaration order.
    pub newly_visible: SmallVec<[SlotId; 2]>,
}

impl EquipOutcome {
    /// True when nothing was evicted and no visibility changed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.evicted.is_empty() && self.newly_hidden.is_empty() && self.newly_visible.is_empty()
    }
}

/// Per-avatar equip state over a shared [`SlotRegistry`].
pub struct OutfitController {
    registry: Arc<SlotRegistry>,
    equipped: Vec<Option<Arc<Wearable>>>,
    hidden: FxHashSet<SlotId>,
}

impl OutfitController {
    #[must_use]
    pub fn new(registry: Arc<SlotRegistry>) -> Self {
        let equipped = vec![None; registry.len()];
        Self {
            registry,
            equipped,
            hidden: FxHashSet::default(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SlotRegistry> {
        &self.registry
    }

    /// Equips a wearable into its slot, resolving conflicts.
    pub fn equip(&mut self, wearable: Arc<Wearable>) -> EquipOutcome {
        let slot = wearable.slot();
        debug_assert!(
            self.registry.contains(slot),
            "wearable targets a slot from another registry"
        );

        let before = self.hidden.clone();
        let mut outcome = EquipOutcome::default();

        if let Some(prev) = self.equipped[slot.index()].take() {
            log::debug!(
                "'{}' replaces '{}' in slot {}",
                wearable.name(),
                prev.name(),
                self.registry.name(slot)
            );
            outcome.evicted.push(prev);
        }
        for &other in self.registry.incompatible_with(slot) {
            if let Some(prev) = self.equipped[other.index()].take() {
                log::debug!(
                    "'{}' evicts '{}' from incompatible slot {}",
                    wearable.name(),
                    prev.name(),
                    self.registry.name(other)
                );
                outcome.evicted.push(prev);
            }
        }

        self.equipped[slot.index()] = Some(wearable);
        self.recompute_hidden();
        self.diff_visibility(&before, &mut outcome);
        outcome
    }

    /// Removes the occupant of `slot`, if any.
    pub fn unequip(&mut self, slot: SlotId) -> EquipOutcome {
        debug_assert!(self.registry.contains(slot));

        let before = self.hidden.clone();
        let mut outcome = EquipOutcome::default();

        if let Some(prev) = self.equipped[slot.index()].take() {
            log::debug!(
                "'{}' removed from slot {}",
                prev.name(),
                self.registry.name(slot)
            );
            outcome.evicted.push(prev);
            self.recompute_hidden();
            self.diff_visibility(&before, &mut outcome);
        }
        outcome
    }

    /// Removes every wearable.
    pub fn clear(&mut self) -> EquipOutcome {
        let before = self.hidden.clone();
        let mut outcome = EquipOutcome::default();

        for slot in &mut self.equipped {
            if let Some(prev) = slot.take() {
                outcome.evicted.push(prev);
            }
        }
        self.recompute_hidden();
        self.diff_visibility(&before, &mut outcome);
        outcome
    }

    /// Occupant of `slot`.
    #[must_use]
    pub fn at(&self, slot: SlotId) -> Option<&Arc<Wearable>> {
        self.equipped[slot.index()].as_ref()
    }

    /// Occupied slots and their wearables, in declaration order.
    pub fn equipped(&self) -> impl Iterator<Item = (SlotId, &Arc<Wearable>)> + '_ {
        self.registry
            .ids()
            .filter_map(|id| self.equipped[id.index()].as_ref().map(|w| (id, w)))
    }

    /// Equipped wearables whose slot is not suppressed.
    pub fn visible(&self) -> impl Iterator<Item = (SlotId, &Arc<Wearable>)> + '_ {
        self.equipped().filter(|(id, _)| !self.hidden.contains(id))
    }

    /// Whether `slot` is currently suppressed by an occupied slot.
    ///
    /// Applies to empty slots too: a wearable equipped into a hidden
    /// slot starts out hidden.
    #[must_use]
    pub fn is_hidden(&self, slot: SlotId) -> bool {
        self.hidden.contains(&slot)
    }

    #[must_use]
    pub fn equipped_count(&self) -> usize {
        self.equipped.iter().filter(|w| w.is_some()).count()
    }

    fn recompute_hidden(&mut self) {
        self.hidden.clear();
        for id in self.registry.ids() {
            if self.equipped[id.index()].is_some() {
                self.hidden.extend(self.registry.suppresses(id));
            }
        }
    }

    fn diff_visibility(&self, before: &FxHashSet<SlotId>, outcome: &mut EquipOutcome) {
        for id in self.registry.ids() {
            match (before.contains(&id), self.hidden.contains(&id)) {
                (false, true) => outcome.newly_hidden.push(id),
                (true, false) => outcome.newly_visible.push(id),
                _ => {}
            }
        }
    }
}
