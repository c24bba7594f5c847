//! Utility Module
//!
//! Shared infrastructure used across the SDK:
//!
//! - [`interner`]: String interning for slot names and index keys
//!
//! # String Interning
//!
//! The interner provides efficient storage for frequently compared
//! identifiers like slot names and canonical asset names. Interned
//! strings (Symbols) compare in O(1).
//!
//! ```rust,ignore
//! use effigy::utils::interner;
//!
//! let sym1 = interner::intern("jacket");
//! let sym2 = interner::intern("jacket");
//! assert_eq!(sym1, sym2); // O(1) comparison
//! ```

pub mod interner;
pub(crate) mod runtime;

pub use interner::Symbol;
