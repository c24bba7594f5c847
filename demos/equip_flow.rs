use std::sync::Arc;

use effigy::avatar::{AssetPayload, AvatarComposer, MemoryLoader};
use effigy::catalog::Catalog;
use effigy::flags::FeatureFlags;
use effigy::outfit::{SlotRegistry, Wearable};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // === 1. Slot registry with the stock humanoid rules ===
    let registry = Arc::new(SlotRegistry::standard()?);

    // === 2. In-memory payload templates keyed like a catalog ===
    let loader = Arc::new(MemoryLoader::new());
    loader.insert("hair/bob", "Bob Cut", b"bob cut mesh".to_vec());
    loader.insert("hats/red", "Red Hat", b"red hat mesh".to_vec());
    loader.insert("hats/top", "Top Hat", b"top hat mesh".to_vec());

    let catalog = Catalog::from_json(
        r#"{ "default_environment": "local",
             "environments": { "local": "" },
             "entries": [] }"#,
    )?;

    let composer = AvatarComposer::with_memory_loader(
        Arc::clone(&registry),
        catalog,
        loader,
        Arc::new(FeatureFlags::new()),
    )?;

    // === 3. Equip hair, then a hat that suppresses it ===
    let mut avatar = composer.create_avatar();
    let bob = Arc::new(
        Wearable::new("Bob Cut", registry.require("hair")?).with_asset_key("hair/bob"),
    );
    let red_hat = Arc::new(
        Wearable::new("Red Hat", registry.require("hat")?).with_asset_key("hats/red"),
    );
    composer.equip_wearable_blocking(&mut avatar, bob)?;
    composer.equip_wearable_blocking(&mut avatar, red_hat)?;

    let hair = registry.require("hair")?;
    println!(
        "hair hidden under the hat: {} (still equipped: {})",
        avatar.outfit().is_hidden(hair),
        avatar.outfit().at(hair).is_some(),
    );

    // === 4. Swap hats: the red hat is evicted and its payload released ===
    let top_hat = Arc::new(
        Wearable::new("Top Hat", registry.require("hat")?).with_asset_key("hats/top"),
    );
    composer.equip_wearable_blocking(&mut avatar, top_hat)?;
    println!(
        "red hat still indexed: {}",
        composer.indexer().is_indexed::<AssetPayload>("Red Hat"),
    );

    // === 5. Drain the event stream ===
    for event in composer.events().try_iter() {
        println!("event: {event:?}");
    }

    let stats = composer.indexer().stats();
    println!(
        "index: {} live nodes, {} pooled, {} active keys",
        stats.live_nodes, stats.pooled_nodes, stats.active_keys,
    );
    Ok(())
}
