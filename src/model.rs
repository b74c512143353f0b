//! Persisted entity types for the garden planner.
//!
//! All entities are identified by an opaque string id, unique within their
//! collection, and serialize to the camelCase JSON the application has
//! always stored. Fields the planner historically omitted carry
//! `#[serde(default)]` so old records keep loading; genuinely tri-state
//! facts (frost hardiness) stay `Option<bool>` rather than collapsing
//! "unspecified" into `false`.
//!
//! Validation beyond shape lives in the deserializers themselves: a
//! [`Month`] outside 1..=12 or a [`Planter`] grid that disagrees with its
//! declared dimensions makes the whole record invalid, which the
//! [`schema`](crate::schema) engine then drops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A calendar month, 1-based: `1` is the first month, `12` the last.
///
/// Deserialization rejects out-of-range values, so a stored record with a
/// bad month never reaches the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Month(u8);

impl Month {
    /// Returns `None` unless `m` is within `1..=12`.
    pub fn new(m: u8) -> Option<Self> {
        (1..=12).contains(&m).then_some(Month(m))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let m = u8::deserialize(deserializer)?;
        Month::new(m)
            .ok_or_else(|| serde::de::Error::custom(format!("month {} out of range 1..=12", m)))
    }
}

/// How much sun a plant wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SunRequirement {
    Full,
    Partial,
    Shade,
}

/// Where a catalog entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Bundled,
    Synced,
    #[default]
    Custom,
}

/// A catalog species or variety.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub days_to_harvest: Option<u32>,
    #[serde(default)]
    pub spacing_cm: Option<u32>,
    /// Tri-state: `None` means hardiness was never specified, which is
    /// distinct from a recorded `false`.
    #[serde(default)]
    pub frost_hardy: Option<bool>,
    #[serde(default)]
    pub sun: Option<SunRequirement>,
    #[serde(default)]
    pub sow_months: Vec<Month>,
    #[serde(default)]
    pub harvest_months: Vec<Month>,
    /// Catalog ids of plants that grow well next to this one.
    #[serde(default)]
    pub companions: Vec<String>,
    /// Catalog ids of plants that should not share a bed with this one.
    #[serde(default)]
    pub antagonists: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub provenance: Provenance,
}

/// Kind of a logged pest event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PestEventKind {
    Pest,
    Treatment,
}

/// A pest sighting or treatment logged against one planted instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PestEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: PestEventKind,
    pub description: String,
}

/// A plant placed in one grid cell, with its own dates and pest log.
///
/// The embedded [`Plant`] is a snapshot taken at planting time; later
/// catalog edits do not rewrite it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantInstance {
    pub instance_id: String,
    pub plant: Plant,
    #[serde(default)]
    pub planted_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub harvest_date: Option<DateTime<Utc>>,
    /// Variety override for this planting, when it differs from the
    /// catalog entry.
    #[serde(default)]
    pub variety: Option<String>,
    /// Ordered oldest-first, as logged.
    #[serde(default)]
    pub pest_events: Vec<PestEvent>,
}

/// One grid cell, holding at most one planted instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanterSquare {
    #[serde(default)]
    pub plant: Option<PlantInstance>,
}

/// A named span of rows or columns inside a planter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanterBand {
    pub name: String,
    pub start: u32,
    pub end: u32,
}

/// A bed or container: a rows×cols grid of squares.
///
/// Position of a square is implicit in its grid coordinates. When a grid
/// is present its dimensions must equal `rows`×`cols`; deserialization
/// enforces this, so a planter whose stored grid disagrees with its
/// declared shape invalidates the record that carries it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Planter {
    pub id: String,
    pub name: String,
    pub rows: u32,
    pub cols: u32,
    #[serde(default)]
    pub grid: Vec<Vec<PlanterSquare>>,
    #[serde(default)]
    pub row_bands: Vec<PlanterBand>,
    #[serde(default)]
    pub col_bands: Vec<PlanterBand>,
    #[serde(default)]
    pub color: Option<String>,
}

// Deserialized through a helper so the grid invariant is checked before a
// value ever exists.
impl<'de> Deserialize<'de> for Planter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let helper = PlanterHelper::deserialize(deserializer)?;

        if !helper.grid.is_empty() {
            let rows_ok = helper.grid.len() == helper.rows as usize;
            let cols_ok = helper
                .grid
                .iter()
                .all(|row| row.len() == helper.cols as usize);
            if !rows_ok || !cols_ok {
                return Err(serde::de::Error::custom(format!(
                    "planter {} grid does not match declared {}x{} dimensions",
                    helper.id, helper.rows, helper.cols
                )));
            }
        }

        Ok(Planter {
            id: helper.id,
            name: helper.name,
            rows: helper.rows,
            cols: helper.cols,
            grid: helper.grid,
            row_bands: helper.row_bands,
            col_bands: helper.col_bands,
            color: helper.color,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanterHelper {
    id: String,
    name: String,
    rows: u32,
    cols: u32,
    #[serde(default)]
    grid: Vec<Vec<PlanterSquare>>,
    #[serde(default)]
    row_bands: Vec<PlanterBand>,
    #[serde(default)]
    col_bands: Vec<PlanterBand>,
    #[serde(default)]
    color: Option<String>,
}

impl Planter {
    /// Creates an empty planter with a fully populated rows×cols grid.
    pub fn new(id: impl Into<String>, name: impl Into<String>, rows: u32, cols: u32) -> Self {
        let grid = (0..rows)
            .map(|_| (0..cols).map(|_| PlanterSquare::default()).collect())
            .collect();
        Self {
            id: id.into(),
            name: name.into(),
            rows,
            cols,
            grid,
            row_bands: Vec::new(),
            col_bands: Vec::new(),
            color: None,
        }
    }
}

/// A top-level named garden zone containing planters, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub planters: Vec<Planter>,
    #[serde(default)]
    pub profile_id: Option<String>,
}

/// Lifecycle stage of a seedling batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedlingStatus {
    #[default]
    Sown,
    Germinated,
    Hardening,
    Transplanted,
}

/// A germinating batch of seed, tracked independently of grid placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seedling {
    pub id: String,
    pub plant: Plant,
    #[serde(default)]
    pub planted_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seed_count: u32,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub status: SeedlingStatus,
}

/// The fixed set of actions the garden log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Planted,
    Harvested,
    Watered,
    Fertilized,
    PestSpotted,
    PestTreated,
    Note,
}

/// An immutable log entry of an action taken in the garden.
///
/// Collections of events always read back newest timestamp first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenEvent {
    pub id: String,
    /// Stored under the `type` key, as the log has always written it.
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub plant_id: Option<String>,
    #[serde(default)]
    pub planter_id: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Geographic coordinates, set once the user pins their garden location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Which AI integration, if any, the user has configured.
///
/// A closed sum type tagged by `kind`; every consumption site matches
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    None,
    /// Bring-your-own-key: requests go straight to the vendor.
    Byok { key: String },
    /// Requests go through a proxy the user operates.
    #[serde(rename_all = "camelCase")]
    Proxy {
        proxy_url: String,
        #[serde(default)]
        token: Option<String>,
    },
}

/// Singleton user preferences. Never absent: reads resolve through
/// [`schema::settings_or_default`](crate::schema::settings_or_default),
/// which overlays whatever is stored onto these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_growth_zone")]
    pub growth_zone: String,
    #[serde(default = "default_weather_provider")]
    pub weather_provider: String,
    #[serde(default)]
    pub ai_provider: AiProvider,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_profile_id")]
    pub profile_id: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

fn default_growth_zone() -> String {
    "6b".to_string()
}

fn default_weather_provider() -> String {
    "open-meteo".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_profile_id() -> String {
    "default".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            location: String::new(),
            growth_zone: default_growth_zone(),
            weather_provider: default_weather_provider(),
            ai_provider: AiProvider::None,
            locale: default_locale(),
            profile_id: default_profile_id(),
            coordinates: None,
        }
    }
}
