//! Outfit Slots, Wearables, and Conflict Resolution
//!
//! An avatar's outfit is a set of named slots, each holding at most one
//! wearable. Slot rules declared in the [`SlotRegistry`] drive two
//! effects when outfits change:
//!
//! - **eviction** — equipping into a slot removes its occupant and the
//!   occupants of incompatible slots;
//! - **suppression** — occupied slots hide other slots' wearables
//!   without unequipping them.
//!
//! [`OutfitController`] applies those rules per avatar and reports the
//! resulting deltas as [`EquipOutcome`]s.

mod controller;
mod slots;
mod wearable;

pub use controller::{EquipOutcome, OutfitController};
pub use slots::{SlotConfig, SlotId, SlotRegistry};
pub use wearable::{Wearable, WearableConfig, WearableTraits};
