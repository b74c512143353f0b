//! Flat-blob adapter: each collection is one serialized JSON blob.
//!
//! Reads treat a missing, unreadable or unparsable blob as an empty
//! collection and run every element through strict-or-drop validation.
//! Upserts are whole-collection read-modify-write: re-read and re-validate
//! the list, replace the matching element in place (preserving the
//! position of its siblings) or append, then write the entire blob back.
//! Serialization always completes before the storage write is attempted,
//! so a failed write leaves the previous blob exactly as it was.
//!
//! There is no locking. A single active writer is assumed; concurrent
//! writers from another process can race this read-modify-write and
//! silently lose updates. That gap is documented, not solved, here.

use std::path::Path;

use async_trait::async_trait;
use log::warn;
use serde_json::Value;

use crate::model::{Area, GardenEvent, Plant, Seedling, Settings};
use crate::schema::{self, Record};
use crate::store::blob::{BlobStore, FsBlobStore, MemBlobStore};
use crate::{GardenStore, Result, SETTINGS};

/// The synchronous whole-blob backend.
pub struct FlatStore {
    blobs: Box<dyn BlobStore>,
}

impl FlatStore {
    /// Opens a flat store backed by one file per collection in `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Ok(Self::with_backend(Box::new(FsBlobStore::new(dir)?)))
    }

    /// A flat store over an in-memory medium, for tests.
    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(MemBlobStore::default()))
    }

    pub fn with_backend(blobs: Box<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    fn read_raw(&self, key: &str) -> Value {
        match self.blobs.read(key) {
            Ok(Some(text)) => match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) => {
                    warn!("could not parse {} blob: {}; treating as absent", key, e);
                    Value::Null
                }
            },
            Ok(None) => Value::Null,
            Err(e) => {
                warn!("could not read {} blob: {}; treating as absent", key, e);
                Value::Null
            }
        }
    }

    /// All valid records of a collection; corrupt items are dropped and
    /// reported, never surfaced as errors.
    pub fn get_all<T: Record>(&self) -> Vec<T> {
        schema::validate_all(self.read_raw(T::COLLECTION))
    }

    fn write_all<T: Record>(&self, records: &[T]) -> Result<()> {
        let text = serde_json::to_string(records)?;
        self.blobs.write(T::COLLECTION, &text)
    }

    /// Upserts by id: replaces the matching record in place, keeping every
    /// sibling at its position, or appends when the id is new.
    pub fn save<T: Record>(&self, record: &T) -> Result<()> {
        let mut records = self.get_all::<T>();
        match records.iter().position(|r| r.id() == record.id()) {
            Some(i) => records[i] = record.clone(),
            None => records.push(record.clone()),
        }
        self.write_all(&records)
    }

    /// Removes the record with `id`. A no-op when the id is unknown; the
    /// blob is not rewritten in that case.
    pub fn delete<T: Record>(&self, id: &str) -> Result<()> {
        let mut records = self.get_all::<T>();
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Ok(());
        }
        self.write_all(&records)
    }

    /// Resolves the settings singleton; never absent, never partial.
    pub fn get_settings(&self) -> Settings {
        schema::settings_or_default(self.read_raw(SETTINGS))
    }

    /// Replaces the settings singleton wholesale.
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let text = serde_json::to_string(settings)?;
        self.blobs.write(SETTINGS, &text)
    }

    /// Reads a raw marker value outside any entity schema. The migration
    /// flag lives here.
    pub fn read_marker(&self, key: &str) -> Result<Option<String>> {
        self.blobs.read(key)
    }

    /// Writes a raw marker value outside any entity schema.
    pub fn write_marker(&self, key: &str, value: &str) -> Result<()> {
        self.blobs.write(key, value)
    }

    /// Removes one key from the blob namespace, entity or marker alike.
    pub fn remove_key(&self, key: &str) -> Result<()> {
        self.blobs.remove(key)
    }

    /// Wipes every key in the namespace.
    pub fn clear_all(&self) -> Result<()> {
        self.blobs.clear()
    }
}

#[async_trait]
impl GardenStore for FlatStore {
    async fn ready(&self) -> Result<()> {
        // The blob medium was prepared when the store was constructed.
        Ok(())
    }

    async fn get_areas(&self) -> Result<Vec<Area>> {
        Ok(self.get_all())
    }

    async fn save_area(&self, area: &Area) -> Result<()> {
        self.save(area)
    }

    async fn delete_area(&self, id: &str) -> Result<()> {
        self.delete::<Area>(id)
    }

    async fn get_plants(&self) -> Result<Vec<Plant>> {
        Ok(self.get_all())
    }

    async fn save_plant(&self, plant: &Plant) -> Result<()> {
        self.save(plant)
    }

    async fn delete_plant(&self, id: &str) -> Result<()> {
        self.delete::<Plant>(id)
    }

    async fn get_seedlings(&self) -> Result<Vec<Seedling>> {
        Ok(self.get_all())
    }

    async fn save_seedling(&self, seedling: &Seedling) -> Result<()> {
        self.save(seedling)
    }

    async fn delete_seedling(&self, id: &str) -> Result<()> {
        self.delete::<Seedling>(id)
    }

    async fn get_events(&self) -> Result<Vec<GardenEvent>> {
        let mut events = self.get_all::<GardenEvent>();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(events)
    }

    async fn save_event(&self, event: &GardenEvent) -> Result<()> {
        self.save(event)
    }

    async fn delete_event(&self, id: &str) -> Result<()> {
        self.delete::<GardenEvent>(id)
    }

    async fn get_settings(&self) -> Result<Settings> {
        Ok(FlatStore::get_settings(self))
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        FlatStore::save_settings(self, settings)
    }

    async fn clear_all(&self) -> Result<()> {
        FlatStore::clear_all(self)
    }
}
