//! Indexed per-row adapter: one table directory per collection, one JSON
//! row file per entity.
//!
//! Semantically identical to the flat adapter, but each entity is stored
//! and retrieved as an individual row: a corrupt row is skipped without
//! touching its neighbors, and writes to different rows never interfere.
//! Row writes use the same write-then-rename strategy as the blob store,
//! so a crash mid-write never corrupts the previous row.
//!
//! Every operation re-reads the underlying storage; the adapter holds no
//! cached state, so sequential callers always observe each other's
//! effects. Access paths the application sorts or filters by (events by
//! timestamp, plants by provenance) are derived at read time.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::warn;
use serde::Serialize;
use serde_json::Value;
use tokio::fs;

use crate::model::{Area, GardenEvent, Plant, Seedling, Settings};
use crate::schema::{self, Record};
use crate::{GardenStore, Result, AREAS, CUSTOM_PLANTS, EVENTS, SEEDLINGS, SETTINGS};

/// Table directories the adapter manages.
const TABLES: [&str; 5] = [AREAS, CUSTOM_PLANTS, SEEDLINGS, EVENTS, SETTINGS];

/// The asynchronous per-row backend.
pub struct IndexedStore {
    root: PathBuf,
}

impl IndexedStore {
    /// Creates a handle rooted in `root`. Nothing is touched on disk until
    /// [`ready`](IndexedStore::ready) runs.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    fn table(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn row_path(&self, table: &str, id: &str) -> PathBuf {
        self.table(table).join(format!("{}.json", id))
    }

    /// Creates every table directory.
    pub async fn ready(&self) -> Result<()> {
        for table in TABLES {
            fs::create_dir_all(self.table(table)).await?;
        }
        Ok(())
    }

    /// Reads every row of a table as raw JSON. Rows that cannot be read or
    /// parsed are reported and skipped independently.
    async fn scan_table(&self, table: &str) -> Result<Vec<Value>> {
        let dir = self.table(table);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut rows = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let content = match fs::read(&path).await {
                Ok(c) => c,
                Err(e) => {
                    warn!("could not read {} row {:?}: {}", table, path, e);
                    continue;
                }
            };

            match serde_json::from_slice(&content) {
                Ok(value) => rows.push(value),
                Err(e) => {
                    warn!("could not parse {} row {:?}: {}", table, path, e);
                }
            }
        }

        Ok(rows)
    }

    async fn write_row<T: Serialize>(&self, table: &str, id: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;

        fs::create_dir_all(self.table(table)).await?;
        let file_path = self.row_path(table, id);
        let temp_path = file_path.with_extension("json.tmp");

        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &file_path).await?;

        Ok(())
    }

    /// All valid records of a collection, each row validated independently.
    pub async fn get_all<T: Record>(&self) -> Result<Vec<T>> {
        let rows = self.scan_table(T::COLLECTION).await?;
        Ok(rows.into_iter().filter_map(schema::validate_item).collect())
    }

    /// Upserts one row by id.
    pub async fn save<T: Record>(&self, record: &T) -> Result<()> {
        self.write_row(T::COLLECTION, record.id(), record).await
    }

    /// Removes one row by id. A missing row is a no-op.
    pub async fn delete<T: Record>(&self, id: &str) -> Result<()> {
        match fs::remove_file(self.row_path(T::COLLECTION, id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolves the settings singleton from its sentinel row.
    pub async fn get_settings(&self) -> Result<Settings> {
        let path = self.row_path(SETTINGS, SETTINGS);
        let raw = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    warn!("could not parse settings row: {}; using defaults", e);
                    Value::Null
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Value::Null,
            Err(e) => {
                warn!("could not read settings row: {}; using defaults", e);
                Value::Null
            }
        };
        Ok(schema::settings_or_default(raw))
    }

    /// Replaces the settings singleton wholesale.
    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.write_row(SETTINGS, SETTINGS, settings).await
    }

    /// Wipes every table, then recreates them empty.
    pub async fn clear_all(&self) -> Result<()> {
        for table in TABLES {
            match fs::remove_dir_all(self.table(table)).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.ready().await
    }
}

#[async_trait]
impl GardenStore for IndexedStore {
    async fn ready(&self) -> Result<()> {
        IndexedStore::ready(self).await
    }

    async fn get_areas(&self) -> Result<Vec<Area>> {
        self.get_all().await
    }

    async fn save_area(&self, area: &Area) -> Result<()> {
        self.save(area).await
    }

    async fn delete_area(&self, id: &str) -> Result<()> {
        self.delete::<Area>(id).await
    }

    async fn get_plants(&self) -> Result<Vec<Plant>> {
        self.get_all().await
    }

    async fn save_plant(&self, plant: &Plant) -> Result<()> {
        self.save(plant).await
    }

    async fn delete_plant(&self, id: &str) -> Result<()> {
        self.delete::<Plant>(id).await
    }

    async fn get_seedlings(&self) -> Result<Vec<Seedling>> {
        self.get_all().await
    }

    async fn save_seedling(&self, seedling: &Seedling) -> Result<()> {
        self.save(seedling).await
    }

    async fn delete_seedling(&self, id: &str) -> Result<()> {
        self.delete::<Seedling>(id).await
    }

    async fn get_events(&self) -> Result<Vec<GardenEvent>> {
        let mut events = self.get_all::<GardenEvent>().await?;
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(events)
    }

    async fn save_event(&self, event: &GardenEvent) -> Result<()> {
        self.save(event).await
    }

    async fn delete_event(&self, id: &str) -> Result<()> {
        self.delete::<GardenEvent>(id).await
    }

    async fn get_settings(&self) -> Result<Settings> {
        IndexedStore::get_settings(self).await
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        IndexedStore::save_settings(self, settings).await
    }

    async fn clear_all(&self) -> Result<()> {
        IndexedStore::clear_all(self).await
    }
}
