//! Index Keys and Instance Identity
//!
//! An asset is indexed under a key derived from its raw display name, not
//! the name itself. Host engines decorate instantiated asset names with
//! suffixes (`"(Clone)"`, `"(Instance)"`), and the same logical wearable
//! loaded from two content bundles must land on one key, so the raw name
//! is mangled into a *canonical name* first and interned as a [`Symbol`].

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::utils::interner::{self, Symbol};

/// Fallback canonical name for assets whose raw name mangles to nothing.
pub const UNNAMED: &str = "unnamed";

/// Suffixes appended by host engines when an asset is duplicated at
/// runtime. Stripped repeatedly, so `"Hat(Clone)(Clone)"` keys as `"Hat"`.
const CLONE_SUFFIXES: [&str; 2] = ["(Clone)", "(Instance)"];

/// Derives the canonical form of a raw asset name.
///
/// - trims surrounding whitespace
/// - strips trailing clone/instance suffixes, repeatedly
/// - collapses interior whitespace runs into a single `_`
/// - maps an empty result to [`UNNAMED`]
#[must_use]
pub fn canonical_name(raw: &str) -> String {
    let mut name = raw.trim();

    'strip: loop {
        for suffix in CLONE_SUFFIXES {
            if let Some(stripped) = name.strip_suffix(suffix) {
                name = stripped.trim_end();
                continue 'strip;
            }
        }
        break;
    }

    if name.is_empty() {
        return UNNAMED.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut in_gap = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            in_gap = true;
        } else {
            if in_gap && !out.is_empty() {
                out.push('_');
            }
            in_gap = false;
            out.push(ch);
        }
    }
    out
}

/// Key under which an asset is registered in the global index.
///
/// Two distinct instances with the same canonical name and concrete type
/// compare equal — that collision is exactly what the per-key chain in
/// [`AssetIndexer`](crate::index::AssetIndexer) exists to manage.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IndexKey {
    type_id: TypeId,
    name: Symbol,
}

impl IndexKey {
    /// Derives the key for an asset of type `T` with the given raw name.
    ///
    /// Interns the canonical name; use [`IndexKey::lookup`] on read paths
    /// that must not allocate.
    #[must_use]
    pub fn derive<T: 'static>(raw_name: &str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: interner::intern(&canonical_name(raw_name)),
        }
    }

    /// Looks up the key for `T` + `raw_name` without interning.
    ///
    /// Returns `None` when the canonical name has never been interned,
    /// which also means nothing was ever indexed under it.
    #[must_use]
    pub fn lookup<T: 'static>(raw_name: &str) -> Option<Self> {
        let name = interner::get(&canonical_name(raw_name))?;
        Some(Self {
            type_id: TypeId::of::<T>(),
            name,
        })
    }

    /// The interned canonical name component.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Symbol {
        self.name
    }

    /// The concrete asset type component.
    #[inline]
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", interner::resolve(self.name))
    }
}

/// Identity of one physical asset instance.
///
/// Derived from the `Arc` allocation address. The index holds a clone of
/// the `Arc` for as long as the instance has a node, so an address can
/// not be recycled while its entry is alive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct InstanceId(usize);

impl InstanceId {
    /// Identity of the given shared instance.
    #[must_use]
    pub fn of<T>(asset: &Arc<T>) -> Self {
        Self(Arc::as_ptr(asset).cast::<()>() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_trims_and_collapses() {
        assert_eq!(canonical_name("  Red Hat  "), "Red_Hat");
        assert_eq!(canonical_name("Red   \t Hat"), "Red_Hat");
        assert_eq!(canonical_name("Plain"), "Plain");
    }

    #[test]
    fn canonical_name_strips_clone_suffixes() {
        assert_eq!(canonical_name("Hat(Clone)"), "Hat");
        assert_eq!(canonical_name("Hat(Clone)(Clone)"), "Hat");
        assert_eq!(canonical_name("Hat (Instance)"), "Hat");
        assert_eq!(canonical_name("Hat(Instance)(Clone)"), "Hat");
    }

    #[test]
    fn canonical_name_empty_falls_back() {
        assert_eq!(canonical_name(""), UNNAMED);
        assert_eq!(canonical_name("   "), UNNAMED);
        assert_eq!(canonical_name("(Clone)"), UNNAMED);
    }

    #[test]
    fn keys_separate_types_with_same_name() {
        struct A;
        struct B;
        let ka = IndexKey::derive::<A>("thing");
        let kb = IndexKey::derive::<B>("thing");
        assert_ne!(ka, kb);
        assert_eq!(ka.name(), kb.name());
    }

    #[test]
    fn lookup_does_not_intern() {
        struct Probe;
        assert!(IndexKey::lookup::<Probe>("never_indexed_name_xyz").is_none());
        let k = IndexKey::derive::<Probe>("probe asset");
        assert_eq!(IndexKey::lookup::<Probe>("probe asset"), Some(k));
        // Clone suffix resolves to the same key without a new intern.
        assert_eq!(IndexKey::lookup::<Probe>("probe asset(Clone)"), Some(k));
    }

    #[test]
    fn instance_identity_tracks_allocation() {
        let a = Arc::new(5u32);
        let b = Arc::new(5u32);
        assert_eq!(InstanceId::of(&a), InstanceId::of(&Arc::clone(&a)));
        assert_ne!(InstanceId::of(&a), InstanceId::of(&b));
    }
}
