use std::fs;
use std::path::Path;

use effigy::catalog::{self, CatalogSource, content_checksum};
use effigy::flags::{FeatureFlags, keys};

fn write_environment(root: &Path, tag: &str) -> anyhow::Result<()> {
    fs::create_dir_all(root)?;
    fs::write(root.join("red_hat.bin"), b"red hat mesh")?;
    fs::write(root.join("banner.bin"), format!("{tag} banner"))?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // === 1. Two local "environments" serving the same keys ===
    let base = std::env::temp_dir().join(format!("effigy-demo-{}", uuid::Uuid::new_v4()));
    let dev = base.join("dev");
    let prod = base.join("prod");
    write_environment(&dev, "dev")?;
    write_environment(&prod, "prod")?;

    // === 2. A manifest declaring both ===
    // The red hat ships identical bytes everywhere and records their
    // checksum; the banner differs per environment and records none.
    let manifest = format!(
        r#"{{
            "default_environment": "dev",
            "environments": {{ "dev": {dev:?}, "prod": {prod:?} }},
            "entries": [
                {{ "key": "hats/red", "path": "red_hat.bin",
                   "checksum": "{sum:016x}", "labels": ["hats"] }},
                {{ "key": "ui/banner", "path": "banner.bin" }}
            ]
        }}"#,
        dev = dev.display().to_string(),
        prod = prod.display().to_string(),
        sum = content_checksum(b"red hat mesh"),
    );
    let manifest_path = base.join("catalog.json");
    fs::write(&manifest_path, manifest)?;

    // === 3. Load, resolve, and fetch with verification ===
    let mut cat = catalog::load_catalog_blocking(manifest_path.to_str().unwrap())?;
    println!("environment: {}", cat.environment());
    println!("resolves to: {}", cat.resolve("hats/red")?.url);

    let source = CatalogSource::for_catalog(&cat)?;
    let bytes = source.fetch_blocking(&cat, "hats/red")?;
    println!("fetched {} verified bytes", bytes.len());

    // === 4. A flag override switches the environment ===
    let flags = FeatureFlags::new();
    flags.apply_overrides("catalog.environment=prod")?;
    let env = flags.str_or(keys::CATALOG_ENVIRONMENT, cat.environment());
    cat.select_environment(&env)?;

    let source = CatalogSource::for_catalog(&cat)?;
    let bytes = source.fetch_blocking(&cat, "ui/banner")?;
    println!(
        "environment '{}' serves: {}",
        cat.environment(),
        String::from_utf8_lossy(&bytes),
    );

    fs::remove_dir_all(&base)?;
    Ok(())
}
