//! # Storage Layer
//!
//! Two interchangeable backends implement the [`GardenStore`] contract:
//!
//! - [`FlatStore`]: synchronous, each collection serialized as one blob
//!   under a string key. Writes are whole-collection read-modify-write,
//!   which is race-free only under the single-active-writer assumption
//!   this layer makes everywhere.
//! - [`IndexedStore`]: asynchronous, one row file per entity in a table
//!   directory per collection, so row writes and per-row validation
//!   failures are independent of each other.
//!
//! Callers obtain a store through [`open`] and own its lifecycle
//! (construct → `ready()` → use); there is no process-wide singleton.
//! Opening the indexed backend also runs the one-time
//! [`migrate`](crate::migrate) procedure against the flat namespace in
//! the same data directory.

pub mod blob;
pub mod flat;
pub mod indexed;

pub use flat::FlatStore;
pub use indexed::IndexedStore;

use std::path::Path;
use std::sync::Arc;

use crate::{migrate, GardenStore, Result};

/// Which backend [`open`] should construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Flat,
    Indexed,
}

/// Initializes a [`GardenStore`] rooted in `data_dir`.
///
/// The returned handle is readied and immediately usable. For
/// [`Backend::Indexed`] this is the application start-up path: the
/// flat-to-indexed migration runs here, once, before the handle is
/// returned. A failed migration is reported and left for the next
/// start-up to retry; it never prevents the store from opening.
///
/// # Examples
///
/// ```no_run
/// use verdant_store::store::{self, Backend};
/// use verdant_store::GardenStore;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let store = store::open("./data", Backend::Indexed).await?;
///     let _areas = store.get_areas().await?;
///     Ok(())
/// }
/// ```
pub async fn open(data_dir: impl AsRef<Path>, backend: Backend) -> Result<Arc<dyn GardenStore>> {
    let data_dir = data_dir.as_ref();
    match backend {
        Backend::Flat => {
            let store = FlatStore::open(data_dir)?;
            store.ready().await?;
            Ok(Arc::new(store))
        }
        Backend::Indexed => {
            let store = IndexedStore::new(data_dir);
            store.ready().await?;
            let flat = FlatStore::open(data_dir)?;
            if let Err(e) = migrate::migrate(&flat, &store).await {
                log::error!("flat-to-indexed migration failed, will retry on next startup: {}", e);
            }
            Ok(Arc::new(store))
        }
    }
}
