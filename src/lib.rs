//! Verdant Store is the persistence and validation layer of the Verdant
//! garden planner.
//!
//! Every persisted entity passes through a schema-validation engine on its
//! way out of storage: corrupt records are dropped one by one instead of
//! poisoning their collection, and the settings singleton is always
//! resolvable by merging stored fields over documented defaults.
//!
//! ## Core Components
//! - [`model`]: The persisted entity types (areas, plants, seedlings, events, settings).
//! - [`schema`]: The "validate, or drop/default" engine applied to untrusted stored data.
//! - [`store`]: The two interchangeable backends behind [`GardenStore`], plus the factory.
//! - [`migrate`]: The one-time, idempotent flat-to-indexed migration procedure.

pub mod migrate;
pub mod model;
pub mod schema;
pub mod store;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Area, GardenEvent, Plant, Seedling, Settings};

/// Errors returned by the Verdant Store.
///
/// Malformed stored data is never an error: it is recovered per record by
/// the [`schema`] engine. These variants cover genuine storage faults.
#[derive(Error, Debug)]
pub enum Error {
    /// An I/O error occurred while reading or writing the backing storage.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for Verdant Store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Flat-store key / indexed table name for the area collection.
pub const AREAS: &str = "areas";
/// Flat-store key / indexed table name for user-defined catalog plants.
pub const CUSTOM_PLANTS: &str = "customPlants";
/// Flat-store key / indexed table name for seedling batches.
pub const SEEDLINGS: &str = "seedlings";
/// Flat-store key / indexed table name for the garden event log.
pub const EVENTS: &str = "events";
/// Flat-store key for the settings singleton; also the fixed sentinel row
/// key of the indexed settings table.
pub const SETTINGS: &str = "settings";
/// Raw marker key set once the flat-to-indexed migration has completed.
/// Stored as the plain string `"1"`, outside any entity schema.
pub const MIGRATION_FLAG: &str = "migration-flag";

/// The primary interface for garden data access.
///
/// This contract is the only surface the application may use; both the
/// flat-blob backend and the indexed per-row backend implement it with
/// identical observable behavior. Callers must await [`ready`] once before
/// any other call.
///
/// None of these operations fail for "not found" or for malformed stored
/// data — those are absorbed per record by the [`schema`] engine. They
/// return `Err` only for faults of the underlying storage medium, after
/// the offending write has been abandoned with prior state intact.
///
/// [`ready`]: GardenStore::ready
#[async_trait]
pub trait GardenStore: Send + Sync {
    /// Prepares the backend to accept reads and writes.
    async fn ready(&self) -> Result<()>;

    /// Returns all valid areas; corrupt records are dropped and reported.
    async fn get_areas(&self) -> Result<Vec<Area>>;
    /// Upserts an area by id.
    async fn save_area(&self, area: &Area) -> Result<()>;
    /// Removes an area by id. A no-op when the id is unknown. Dependent
    /// garden events are not cascade-deleted; pruning them is the
    /// caller's responsibility.
    async fn delete_area(&self, id: &str) -> Result<()>;

    /// Returns all valid user-defined catalog plants.
    async fn get_plants(&self) -> Result<Vec<Plant>>;
    /// Upserts a catalog plant by id.
    async fn save_plant(&self, plant: &Plant) -> Result<()>;
    /// Removes a catalog plant by id. A no-op when the id is unknown.
    async fn delete_plant(&self, id: &str) -> Result<()>;

    /// Returns all valid seedling batches.
    async fn get_seedlings(&self) -> Result<Vec<Seedling>>;
    /// Upserts a seedling batch by id.
    async fn save_seedling(&self, seedling: &Seedling) -> Result<()>;
    /// Removes a seedling batch by id. A no-op when the id is unknown.
    async fn delete_seedling(&self, id: &str) -> Result<()>;

    /// Returns all valid garden events, newest timestamp first. The
    /// ordering is a guaranteed post-condition, independent of storage
    /// order and backend.
    async fn get_events(&self) -> Result<Vec<GardenEvent>>;
    /// Upserts a garden event by id.
    async fn save_event(&self, event: &GardenEvent) -> Result<()>;
    /// Removes a garden event by id. A no-op when the id is unknown.
    async fn delete_event(&self, id: &str) -> Result<()>;

    /// Returns the settings singleton. Never absent and never partial:
    /// stored fields are merged over the documented defaults.
    async fn get_settings(&self) -> Result<Settings>;
    /// Replaces the settings singleton wholesale.
    async fn save_settings(&self, settings: &Settings) -> Result<()>;

    /// Wipes every collection and the settings singleton. Used by tests
    /// and by migration cleanup; never exposed to end users.
    async fn clear_all(&self) -> Result<()>;
}
