//! Global String Interner
//!
//! Converts strings into integer `Symbol`s for cheap comparison and
//! hashing. Index keys and slot names are compared on every equip and
//! release, so they are interned once and handled as symbols afterwards.

use lasso::{Spur, ThreadedRodeo};
use once_cell::sync::Lazy;

/// Global interner instance
static INTERNER: Lazy<ThreadedRodeo> = Lazy::new(ThreadedRodeo::new);

/// Compact integer identifier for an interned string.
///
/// Symbols compare and hash in O(1).
pub type Symbol = Spur;

/// Interns a string, returning its Symbol.
///
/// Returns the existing Symbol when the string is already in the pool,
/// otherwise adds it and returns a fresh one.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the Symbol of an already-interned string.
///
/// Returns `None` when the string has never been interned. Never
/// allocates.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a Symbol back to its string.
///
/// # Panics
/// Panics if the Symbol is invalid (does not normally happen).
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Pre-interns the common outfit slot names.
///
/// Called during composer setup so that slot-name lookups on the equip
/// hot path never pay the interning cost.
pub fn preload_common_slots() {
    let common = [
        // Body coverage
        "head",
        "hair",
        "face",
        "torso",
        "jacket",
        "legs",
        "feet",
        "hands",
        // Accessories
        "hat",
        "glasses",
        "earrings",
        "necklace",
        "wristwear",
        "backpack",
        // Full-body pieces
        "fullbody",
        "costume",
    ];

    for name in common {
        intern(name);
    }
}
