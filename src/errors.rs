//! Error Types
//!
//! This module defines the error types used throughout the SDK.
//!
//! # Overview
//!
//! The main error type [`EffigyError`] covers all failure modes including:
//! - Catalog parsing, resolution, and integrity errors
//! - Outfit slot configuration errors
//! - Wearable payload loading errors
//! - Feature-flag parsing errors
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, EffigyError>`.
//!
//! ```rust,ignore
//! use effigy::errors::{EffigyError, Result};
//!
//! fn resolve_wearable() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Effigy SDK.
///
/// Each variant provides specific context about what went wrong.
#[derive(Error, Debug)]
pub enum EffigyError {
    // ========================================================================
    // Catalog Errors
    // ========================================================================
    /// The requested catalog key does not exist.
    #[error("Catalog key not found: {0}")]
    CatalogKeyNotFound(String),

    /// Two catalog entries declared the same key.
    #[error("Duplicate catalog key: {0}")]
    DuplicateCatalogKey(String),

    /// The requested environment is not declared in the catalog.
    #[error("Unknown catalog environment: {0}")]
    UnknownEnvironment(String),

    /// A manifest or config document failed validation after parsing.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// Downloaded payload bytes did not match the catalog checksum.
    #[error("Checksum mismatch for '{key}': expected {expected:016x}, got {actual:016x}")]
    ChecksumMismatch {
        /// The catalog key whose payload failed verification
        key: String,
        /// Checksum recorded in the catalog
        expected: u64,
        /// Checksum of the received bytes
        actual: u64,
    },

    // ========================================================================
    // Outfit Errors
    // ========================================================================
    /// A slot rule or wearable referenced a slot name that was never declared.
    #[error("Unknown outfit slot: {0}")]
    UnknownSlot(String),

    /// Two slot definitions declared the same name.
    #[error("Duplicate outfit slot: {0}")]
    DuplicateSlot(String),

    /// A slot declared a relationship with itself.
    #[error("Slot '{0}' declares a rule against itself")]
    SelfReferentialRule(String),

    // ========================================================================
    // Loading Errors
    // ========================================================================
    /// A wearable payload could not be produced by the loader.
    #[error("Failed to load payload for '{key}': {reason}")]
    PayloadLoadFailed {
        /// The catalog key being loaded
        key: String,
        /// Loader-specific failure description
        reason: String,
    },

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP request error.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// HTTP response error with status code.
    #[error("HTTP response error: status {status}")]
    HttpResponseError {
        /// HTTP status code
        status: u16,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// JSON parsing error (catalog manifests, slot configs, flag files).
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A feature-flag override string could not be parsed.
    #[error("Invalid flag override '{0}' (expected key=value)")]
    InvalidFlagOverride(String),

    /// A flag file held a value no flag type can represent.
    #[error("Invalid flag value for '{0}'")]
    InvalidFlagValue(String),

    // ========================================================================
    // Async & Threading Errors
    // ========================================================================
    /// Task join error (when async loading tasks fail to complete).
    #[error("Task join error: {0}")]
    TaskJoinError(String),

    // ========================================================================
    // Feature Gates
    // ========================================================================
    /// Feature not enabled.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(String),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<tokio::task::JoinError> for EffigyError {
    fn from(err: tokio::task::JoinError) -> Self {
        EffigyError::TaskJoinError(err.to_string())
    }
}

/// Alias for `Result<T, EffigyError>`.
pub type Result<T> = std::result::Result<T, EffigyError>;
