//! Catalog and Flag Tests
//!
//! Tests for:
//! - Manifest loading from disk and verified fetching
//! - Environment switching rebinding the payload source
//! - Label queries over loaded catalogs
//! - Flag layering driving catalog environment selection

use std::path::PathBuf;

use effigy::catalog::{self, CatalogSource, content_checksum};
use effigy::flags::{FeatureFlags, keys};

struct TempContentDir {
    root: PathBuf,
}

impl TempContentDir {
    fn new(tag: &str) -> Self {
        let root = std::env::temp_dir().join(format!("effigy-{tag}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&root).unwrap();
        Self { root }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn path_str(&self) -> String {
        self.root.display().to_string()
    }
}

impl Drop for TempContentDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Two local "environments" with different payloads for the same key.
fn two_env_fixture() -> (TempContentDir, TempContentDir, String) {
    let dev = TempContentDir::new("dev");
    let prod = TempContentDir::new("prod");
    dev.write("red_hat.bin", b"dev bytes");
    prod.write("red_hat.bin", b"prod bytes");

    let manifest = format!(
        r#"{{
            "default_environment": "dev",
            "environments": {{ "dev": {dev:?}, "prod": {prod:?} }},
            "entries": [
                {{ "key": "hats/red", "path": "red_hat.bin", "labels": ["hats"] }},
                {{ "key": "hats/blue", "path": "blue_hat.bin", "labels": ["hats", "featured"] }}
            ]
        }}"#,
        dev = dev.path_str(),
        prod = prod.path_str(),
    );
    let manifest_path = dev.write("catalog.json", manifest.as_bytes());
    (dev, prod, manifest_path.display().to_string())
}

// ============================================================================
// Loading and Fetching
// ============================================================================

#[test]
fn loads_manifest_from_disk_and_fetches() {
    let (_dev, _prod, manifest_path) = two_env_fixture();

    let catalog = catalog::load_catalog_blocking(&manifest_path).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.environment(), "dev");

    let source = CatalogSource::for_catalog(&catalog).unwrap();
    let bytes = source.fetch_blocking(&catalog, "hats/red").unwrap();
    assert_eq!(bytes, b"dev bytes");
}

#[test]
fn environment_switch_rebinds_the_source() {
    let (_dev, _prod, manifest_path) = two_env_fixture();

    let mut catalog = catalog::load_catalog_blocking(&manifest_path).unwrap();
    catalog.select_environment("prod").unwrap();

    let source = CatalogSource::for_catalog(&catalog).unwrap();
    let bytes = source.fetch_blocking(&catalog, "hats/red").unwrap();
    assert_eq!(bytes, b"prod bytes", "fetch follows the selected environment");
}

#[test]
fn checksum_guards_the_fetch_path() {
    let dir = TempContentDir::new("sum");
    let payload = b"authentic payload";
    dir.write("item.bin", payload);
    let manifest = format!(
        r#"{{
            "default_environment": "local",
            "environments": {{ "local": {base:?} }},
            "entries": [
                {{ "key": "good", "path": "item.bin", "checksum": "{good:016x}" }},
                {{ "key": "bad", "path": "item.bin", "checksum": "{bad:016x}" }}
            ]
        }}"#,
        base = dir.path_str(),
        good = content_checksum(payload),
        bad = content_checksum(b"other bytes"),
    );
    let manifest_path = dir.write("catalog.json", manifest.as_bytes());

    let catalog = catalog::load_catalog_blocking(manifest_path.to_str().unwrap()).unwrap();
    let source = CatalogSource::for_catalog(&catalog).unwrap();

    assert!(source.fetch_blocking(&catalog, "good").is_ok());
    assert!(matches!(
        source.fetch_blocking(&catalog, "bad"),
        Err(effigy::EffigyError::ChecksumMismatch { .. })
    ));
}

#[test]
fn label_queries_over_a_loaded_catalog() {
    let (_dev, _prod, manifest_path) = two_env_fixture();
    let catalog = catalog::load_catalog_blocking(&manifest_path).unwrap();

    assert_eq!(catalog.keys_with_label("featured"), ["hats/blue"]);
    assert_eq!(catalog.keys_with_label("hats"), ["hats/blue", "hats/red"]);
    assert!(catalog.labels_of("hats/red").unwrap().contains(&"hats"));
}

// ============================================================================
// Flags Driving Catalog Behavior
// ============================================================================

#[test]
fn flag_override_selects_the_environment() {
    let (_dev, _prod, manifest_path) = two_env_fixture();
    let mut catalog = catalog::load_catalog_blocking(&manifest_path).unwrap();

    let flags = FeatureFlags::new();
    flags.apply_overrides("catalog.environment=prod").unwrap();

    let env = flags.str_or(keys::CATALOG_ENVIRONMENT, catalog.environment());
    catalog.select_environment(&env).unwrap();
    assert_eq!(catalog.environment(), "prod");
}

#[test]
fn env_layer_overrides_the_flag_file() {
    let flags = FeatureFlags::new();
    flags
        .load_json(r#"{ "catalog.environment": "dev", "catalog.verify_checksums": true }"#)
        .unwrap();
    flags
        .apply_overrides("catalog.environment=staging")
        .unwrap();

    assert_eq!(flags.str_or(keys::CATALOG_ENVIRONMENT, "x"), "staging");
    assert!(flags.bool_or(keys::VERIFY_CHECKSUMS, false), "file layer survives");
}
