use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tempfile::tempdir;
use verdant_store::model::{
    Area, EventKind, GardenEvent, Plant, Planter, Provenance, Seedling, SeedlingStatus, Settings,
};
use verdant_store::store::{self, Backend, FlatStore};
use verdant_store::GardenStore;

fn plant(id: &str, name: &str) -> Plant {
    Plant {
        id: id.to_string(),
        name: name.to_string(),
        icon: Some("🍅".to_string()),
        color: None,
        days_to_harvest: Some(80),
        spacing_cm: Some(40),
        frost_hardy: Some(false),
        sun: None,
        sow_months: Vec::new(),
        harvest_months: Vec::new(),
        companions: vec!["basil".to_string()],
        antagonists: Vec::new(),
        stock: 5,
        provenance: Provenance::Custom,
    }
}

fn area(id: &str, name: &str) -> Area {
    Area {
        id: id.to_string(),
        name: name.to_string(),
        color: Some("#2e7d32".to_string()),
        planters: vec![Planter::new("bed-1", "Raised bed", 2, 4)],
        profile_id: None,
    }
}

fn event(id: &str, secs: i64) -> GardenEvent {
    GardenEvent {
        id: id.to_string(),
        kind: EventKind::Planted,
        timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        plant_id: Some("tomato".to_string()),
        planter_id: None,
        note: None,
    }
}

fn seedling(id: &str) -> Seedling {
    Seedling {
        id: id.to_string(),
        plant: plant("tomato", "Tomato"),
        planted_date: Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap()),
        seed_count: 12,
        location: Some("windowsill".to_string()),
        method: None,
        status: SeedlingStatus::Germinated,
    }
}

/// The full repository contract, behaviorally identical for both backends.
async fn exercise_contract(store: Arc<dyn GardenStore>) {
    store.ready().await.unwrap();

    // Round-trip: what was saved comes back equal.
    let a = area("a1", "Backyard");
    store.save_area(&a).await.unwrap();
    assert_eq!(store.get_areas().await.unwrap(), vec![a.clone()]);

    // Upsert idempotence: same id saved twice, exactly one record.
    store.save_area(&a).await.unwrap();
    assert_eq!(store.get_areas().await.unwrap().len(), 1);

    // Upsert replaces by id.
    let renamed = Area { name: "Backyard (renamed)".to_string(), ..a.clone() };
    store.save_area(&renamed).await.unwrap();
    let areas = store.get_areas().await.unwrap();
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0].name, "Backyard (renamed)");

    let p = plant("tomato", "Tomato");
    store.save_plant(&p).await.unwrap();
    assert_eq!(store.get_plants().await.unwrap(), vec![p]);

    let s = seedling("batch-1");
    store.save_seedling(&s).await.unwrap();
    assert_eq!(store.get_seedlings().await.unwrap(), vec![s]);

    // Event ordering: newest timestamp first, whatever the save order.
    store.save_event(&event("older", 1_000)).await.unwrap();
    store.save_event(&event("newest", 3_000)).await.unwrap();
    store.save_event(&event("middle", 2_000)).await.unwrap();
    let ids: Vec<String> = store
        .get_events()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, ["newest", "middle", "older"]);

    // Settings: never absent, merge keeps unspecified defaults.
    assert_eq!(store.get_settings().await.unwrap(), Settings::default());
    let custom = Settings { location: "Amsterdam".to_string(), ..Settings::default() };
    store.save_settings(&custom).await.unwrap();
    let loaded = store.get_settings().await.unwrap();
    assert_eq!(loaded.location, "Amsterdam");
    assert_eq!(loaded.growth_zone, "6b");
    assert_eq!(loaded.weather_provider, "open-meteo");

    // Deleting an unknown id neither fails nor changes anything.
    store.delete_area("does-not-exist").await.unwrap();
    assert_eq!(store.get_areas().await.unwrap().len(), 1);

    store.delete_area("a1").await.unwrap();
    assert!(store.get_areas().await.unwrap().is_empty());

    // clear_all wipes collections and resets settings to defaults.
    store.clear_all().await.unwrap();
    assert!(store.get_plants().await.unwrap().is_empty());
    assert!(store.get_seedlings().await.unwrap().is_empty());
    assert!(store.get_events().await.unwrap().is_empty());
    assert_eq!(store.get_settings().await.unwrap(), Settings::default());
}

#[tokio::test]
async fn test_flat_backend_honors_the_contract() {
    let dir = tempdir().unwrap();
    let store = store::open(dir.path(), Backend::Flat).await.unwrap();
    exercise_contract(store).await;
}

#[tokio::test]
async fn test_indexed_backend_honors_the_contract() {
    let dir = tempdir().unwrap();
    let store = store::open(dir.path(), Backend::Indexed).await.unwrap();
    exercise_contract(store).await;
}

#[tokio::test]
async fn test_opening_indexed_backend_migrates_flat_data() {
    let dir = tempdir().unwrap();

    // A user's pre-migration dataset, written by the flat backend.
    let flat = FlatStore::open(dir.path()).unwrap();
    flat.save(&area("a1", "Backyard")).unwrap();
    flat.save(&plant("tomato", "Tomato")).unwrap();
    flat.save(&event("e1", 1_000)).unwrap();
    flat.save_settings(&Settings { location: "Utrecht".to_string(), ..Settings::default() })
        .unwrap();

    // First indexed startup migrates everything.
    let store = store::open(dir.path(), Backend::Indexed).await.unwrap();
    assert_eq!(store.get_areas().await.unwrap().len(), 1);
    assert_eq!(store.get_plants().await.unwrap().len(), 1);
    assert_eq!(store.get_events().await.unwrap().len(), 1);
    assert_eq!(store.get_settings().await.unwrap().location, "Utrecht");

    // The old keys are gone and the flag keeps later startups from
    // re-running the transfer.
    assert_eq!(flat.read_marker(verdant_store::AREAS).unwrap(), None);
    assert_eq!(
        flat.read_marker(verdant_store::MIGRATION_FLAG).unwrap().as_deref(),
        Some("1")
    );

    // New data written after migration survives the next startup.
    store.save_area(&area("a2", "Front")).await.unwrap();
    drop(store);
    let reopened = store::open(dir.path(), Backend::Indexed).await.unwrap();
    assert_eq!(reopened.get_areas().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_backends_store_the_same_wire_format() {
    // A record written by one backend and carried over by migration reads
    // back identically from the other.
    let dir = tempdir().unwrap();
    let original = area("a1", "Backyard");

    let flat = FlatStore::open(dir.path()).unwrap();
    flat.save(&original).unwrap();

    let store = store::open(dir.path(), Backend::Indexed).await.unwrap();
    assert_eq!(store.get_areas().await.unwrap(), vec![original]);
}
