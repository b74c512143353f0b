//! One-time migration of the flat blob namespace into the indexed store.
//!
//! The completion flag is the single source of truth for "has migration
//! happened". It is set only after every destination write has succeeded,
//! and only then are the source keys removed. A crash anywhere in between
//! loses nothing: with the flag unset the next run starts from scratch,
//! and destination writes are id-keyed upserts, so re-applying them is
//! harmless.

use log::{info, warn};

use crate::model::{Area, GardenEvent, Plant, Seedling};
use crate::schema::Record;
use crate::store::{FlatStore, IndexedStore};
use crate::{Result, MIGRATION_FLAG, SETTINGS};

/// Value stored under [`MIGRATION_FLAG`] once the transfer has completed.
const FLAG_SET: &str = "1";

/// What one migration run carried over.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// True when the completion flag was already set and the run was a
    /// no-op.
    pub skipped: bool,
    pub areas: usize,
    pub plants: usize,
    pub seedlings: usize,
    pub events: usize,
}

/// Moves everything under the flat key namespace into the indexed store,
/// exactly once.
///
/// Idempotent: a completed run short-circuits every later call, and an
/// aborted run (any destination write failing) leaves the flag unset and
/// all source keys intact for the next startup to retry.
pub async fn migrate(flat: &FlatStore, indexed: &IndexedStore) -> Result<MigrationReport> {
    if flat.read_marker(MIGRATION_FLAG)?.as_deref() == Some(FLAG_SET) {
        return Ok(MigrationReport { skipped: true, ..MigrationReport::default() });
    }

    // Validated source reads: corrupt records are dropped here exactly as
    // a normal collection read would drop them.
    let areas = flat.get_all::<Area>();
    let plants = flat.get_all::<Plant>();
    let seedlings = flat.get_all::<Seedling>();
    let events = flat.get_all::<GardenEvent>();
    let settings = flat.get_settings();

    // Destination writes go through the indexed adapter's own save
    // methods. The first failure aborts the whole run.
    for area in &areas {
        indexed.save(area).await?;
    }
    for plant in &plants {
        indexed.save(plant).await?;
    }
    for seedling in &seedlings {
        indexed.save(seedling).await?;
    }
    for event in &events {
        indexed.save(event).await?;
    }
    indexed.save_settings(&settings).await?;

    // Point of no return: flag first, then source cleanup. A failed
    // removal leaves a stale source key behind but never re-runs the
    // migration.
    flat.write_marker(MIGRATION_FLAG, FLAG_SET)?;
    for key in [
        Area::COLLECTION,
        Plant::COLLECTION,
        Seedling::COLLECTION,
        GardenEvent::COLLECTION,
        SETTINGS,
    ] {
        if let Err(e) = flat.remove_key(key) {
            warn!("could not remove migrated flat key {}: {}", key, e);
        }
    }

    let report = MigrationReport {
        skipped: false,
        areas: areas.len(),
        plants: plants.len(),
        seedlings: seedlings.len(),
        events: events.len(),
    };
    info!(
        "migrated flat store: {} areas, {} plants, {} seedlings, {} events",
        report.areas, report.plants, report.seedlings, report.events
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Settings;
    use crate::{GardenStore, AREAS, CUSTOM_PLANTS, EVENTS, SEEDLINGS};
    use tempfile::tempdir;

    fn seeded_flat() -> FlatStore {
        let flat = FlatStore::in_memory();
        flat.write_marker(
            AREAS,
            r#"[{"id":"a1","name":"Backyard","planters":[]}, {"id":123}]"#,
        )
        .unwrap();
        flat.write_marker(
            CUSTOM_PLANTS,
            r#"[{"id":"tomato","name":"Tomato","stock":12}]"#,
        )
        .unwrap();
        flat.write_marker(
            EVENTS,
            r#"[{"id":"e1","type":"watered","timestamp":"2024-05-01T08:00:00Z"}]"#,
        )
        .unwrap();
        flat.write_marker(SETTINGS, r#"{"location":"Amsterdam"}"#).unwrap();
        flat
    }

    #[tokio::test]
    async fn test_migration_moves_valid_records_and_cleans_up() {
        let dir = tempdir().unwrap();
        let flat = seeded_flat();
        let indexed = IndexedStore::new(dir.path());
        indexed.ready().await.unwrap();

        let report = migrate(&flat, &indexed).await.unwrap();
        assert_eq!(
            report,
            MigrationReport { skipped: false, areas: 1, plants: 1, seedlings: 0, events: 1 }
        );

        // The corrupt area record was dropped, not transferred.
        let areas = indexed.get_all::<Area>().await.unwrap();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].id, "a1");

        let settings = IndexedStore::get_settings(&indexed).await.unwrap();
        assert_eq!(settings.location, "Amsterdam");
        assert_eq!(settings.growth_zone, "6b");

        // Flag set, old keys removed.
        assert_eq!(flat.read_marker(MIGRATION_FLAG).unwrap().as_deref(), Some("1"));
        assert_eq!(flat.read_marker(AREAS).unwrap(), None);
        assert_eq!(flat.read_marker(CUSTOM_PLANTS).unwrap(), None);
        assert_eq!(flat.read_marker(SEEDLINGS).unwrap(), None);
        assert_eq!(flat.read_marker(EVENTS).unwrap(), None);
        assert_eq!(flat.read_marker(SETTINGS).unwrap(), None);
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let dir = tempdir().unwrap();
        let flat = seeded_flat();
        let indexed = IndexedStore::new(dir.path());
        indexed.ready().await.unwrap();

        migrate(&flat, &indexed).await.unwrap();
        let before = indexed.get_all::<Area>().await.unwrap();

        let report = migrate(&flat, &indexed).await.unwrap();
        assert!(report.skipped);
        assert_eq!(report.areas, 0);
        assert_eq!(indexed.get_all::<Area>().await.unwrap(), before);
        assert_eq!(flat.read_marker(MIGRATION_FLAG).unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_failed_destination_write_leaves_source_intact() {
        let dir = tempdir().unwrap();
        let flat = seeded_flat();
        let indexed = IndexedStore::new(dir.path());

        // A plain file where the areas table directory belongs makes the
        // very first destination write fail.
        std::fs::write(dir.path().join(AREAS), "in the way").unwrap();

        assert!(migrate(&flat, &indexed).await.is_err());

        assert_eq!(flat.read_marker(MIGRATION_FLAG).unwrap(), None);
        assert!(flat.read_marker(AREAS).unwrap().is_some());
        assert!(flat.read_marker(CUSTOM_PLANTS).unwrap().is_some());
        assert!(flat.read_marker(SETTINGS).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_retry_after_failure_completes() {
        let dir = tempdir().unwrap();
        let flat = seeded_flat();
        let indexed = IndexedStore::new(dir.path());

        std::fs::write(dir.path().join(AREAS), "in the way").unwrap();
        assert!(migrate(&flat, &indexed).await.is_err());

        // Next startup: the obstruction is gone and the retry succeeds
        // from scratch.
        std::fs::remove_file(dir.path().join(AREAS)).unwrap();
        let report = migrate(&flat, &indexed).await.unwrap();
        assert!(!report.skipped);
        assert_eq!(report.areas, 1);
        assert_eq!(flat.read_marker(MIGRATION_FLAG).unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_empty_source_still_resolves_settings() {
        let dir = tempdir().unwrap();
        let flat = FlatStore::in_memory();
        let indexed = IndexedStore::new(dir.path());
        indexed.ready().await.unwrap();

        let report = migrate(&flat, &indexed).await.unwrap();
        assert_eq!(
            report,
            MigrationReport { skipped: false, areas: 0, plants: 0, seedlings: 0, events: 0 }
        );
        assert_eq!(
            GardenStore::get_settings(&indexed).await.unwrap(),
            Settings::default()
        );
        assert_eq!(flat.read_marker(MIGRATION_FLAG).unwrap().as_deref(), Some("1"));
    }
}
