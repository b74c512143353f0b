//! Schema validation for untrusted stored data.
//!
//! Everything leaving storage is raw JSON that may have been written by an
//! older version, edited by hand, or truncated by a failing disk. Two
//! policies cover every read path:
//!
//! - **Strict-or-drop** ([`validate_item`], [`validate_all`]): a record
//!   either deserializes into a fully typed entity or is dropped, reported
//!   through the log sink. Applied per item, so one corrupt record never
//!   invalidates its siblings.
//! - **Merge-with-defaults** ([`settings_or_default`]): always produces a
//!   complete [`Settings`] by overlaying whichever stored fields are
//!   usable onto the documented defaults. Used only for the settings
//!   singleton, which must never be absent.
//!
//! The schema declarations themselves are the serde derives on the
//! [`model`](crate::model) types; their `Default` impls are the explicit
//! default-value table.

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::{Area, GardenEvent, Plant, Seedling, Settings};

/// A persisted top-level entity: ties a type to its collection name and
/// to the id that upserts and deletes are keyed on.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Flat-store key and indexed table name of the collection.
    const COLLECTION: &'static str;

    /// The record's id, unique within its collection.
    fn id(&self) -> &str;
}

impl Record for Area {
    const COLLECTION: &'static str = crate::AREAS;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Plant {
    const COLLECTION: &'static str = crate::CUSTOM_PLANTS;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Seedling {
    const COLLECTION: &'static str = crate::SEEDLINGS;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for GardenEvent {
    const COLLECTION: &'static str = crate::EVENTS;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Strict-or-drop validation of one stored record.
///
/// Returns the typed entity, or `None` after reporting the record when its
/// shape is invalid. No data is recovered from an invalid record.
pub fn validate_item<T: Record>(raw: Value) -> Option<T> {
    match serde_json::from_value::<T>(raw) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("dropping invalid {} record: {}", T::COLLECTION, e);
            None
        }
    }
}

/// Validates a whole stored collection, keeping only the valid records.
///
/// A raw value that is not an array is treated as an empty collection; an
/// absent (`null`) value is empty without comment, any other shape is
/// reported first.
pub fn validate_all<T: Record>(raw: Value) -> Vec<T> {
    match raw {
        Value::Array(items) => items.into_iter().filter_map(validate_item).collect(),
        Value::Null => Vec::new(),
        other => {
            warn!(
                "expected {} to hold an array, found {}; treating as empty",
                T::COLLECTION,
                json_type(&other)
            );
            Vec::new()
        }
    }
}

/// Merge-with-defaults resolution of the settings singleton.
///
/// Never fails: a raw value that is not an object is treated as an empty
/// object, and each field that is present and well typed overlays the
/// default while every other field keeps it.
pub fn settings_or_default(raw: Value) -> Settings {
    let defaults = Settings::default();
    let obj = match raw {
        Value::Object(map) => map,
        Value::Null => return defaults,
        other => {
            warn!(
                "expected settings to hold an object, found {}; using defaults",
                json_type(&other)
            );
            return defaults;
        }
    };

    Settings {
        location: field(&obj, "location", defaults.location),
        growth_zone: field(&obj, "growthZone", defaults.growth_zone),
        weather_provider: field(&obj, "weatherProvider", defaults.weather_provider),
        ai_provider: field(&obj, "aiProvider", defaults.ai_provider),
        locale: field(&obj, "locale", defaults.locale),
        profile_id: field(&obj, "profileId", defaults.profile_id),
        coordinates: field(&obj, "coordinates", defaults.coordinates),
    }
}

fn field<T: DeserializeOwned>(obj: &Map<String, Value>, key: &str, fallback: T) -> T {
    match obj.get(key) {
        None | Some(Value::Null) => fallback,
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(value) => value,
            Err(e) => {
                warn!("settings field {} is invalid ({}); keeping default", key, e);
                fallback
            }
        },
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
