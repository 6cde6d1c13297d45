//! core::fields
//!
//! Persisted field records for each layer of the hierarchy.
//!
//! # Schema Design
//!
//! - One record type per layer, serialized in camelCase
//! - Optional values are stored as explicit `null`, never omitted, so a
//!   cleared field overwrites the stored value
//! - Categories are referenced from trays by [`CategoryId`], not embedded
//!
//! The store only sees an opaque [`Record`]; [`LayerFields`] converts
//! between that record and the typed form for a known [`Level`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::expiry::ExpiryRange;
use super::types::{CategoryId, Level, TraySize};

/// The opaque field record exchanged with the document store.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Errors converting between records and typed fields.
#[derive(Debug, Error)]
pub enum FieldsError {
    #[error("failed to decode {level} fields: {message}")]
    Decode { level: Level, message: String },

    #[error("failed to encode {level} fields: {message}")]
    Encode { level: Level, message: String },

    #[error("{level} fields did not encode to an object")]
    NotAnObject { level: Level },
}

/// A tray category, stored on the warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub short_name: Option<String>,
    pub under_stock_threshold: Option<u32>,
    pub over_stock_threshold: Option<u32>,
    pub group: Option<String>,
    pub default_expiry: Option<ExpiryRange>,
}

impl Category {
    /// A category with a fresh id and no thresholds.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::generate(),
            name: name.into(),
            short_name: None,
            under_stock_threshold: None,
            over_stock_threshold: None,
            group: None,
            default_expiry: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseFields {
    pub name: String,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub tray_sizes: Vec<TraySize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneFields {
    pub index: usize,
    pub name: String,
    /// Hex colour, e.g. `#ff0000`.
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BayFields {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfFields {
    pub index: usize,
    pub name: String,
    #[serde(default)]
    pub is_picking_area: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFields {
    pub index: usize,
    pub size: Option<TraySize>,
    /// Number of trays the column can hold; `None` is uncapped.
    pub max_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrayFields {
    pub index: usize,
    /// Denormalized "{zone} {bay}{shelf}" name, refreshed when staged.
    pub location_name: String,
    pub category_id: Option<CategoryId>,
    pub expiry: Option<ExpiryRange>,
    /// Weight in kilograms.
    pub weight: Option<f64>,
    pub comment: Option<String>,
    /// UTC milliseconds of the last local edit.
    pub last_modified: i64,
    /// Who made the last edit.
    pub blame: String,
}

impl TrayFields {
    /// An empty tray at `index`.
    pub fn empty(index: usize) -> Self {
        Self {
            index,
            location_name: String::new(),
            category_id: None,
            expiry: None,
            weight: None,
            comment: None,
            last_modified: chrono::Utc::now().timestamp_millis(),
            blame: String::new(),
        }
    }

    /// Stamp the edit time and author.
    pub fn touch(&mut self, blame: &str) {
        self.last_modified = chrono::Utc::now().timestamp_millis();
        self.blame = blame.to_string();
    }
}

/// Typed fields of any layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerFields {
    Warehouse(WarehouseFields),
    Zone(ZoneFields),
    Bay(BayFields),
    Shelf(ShelfFields),
    Column(ColumnFields),
    Tray(TrayFields),
}

impl LayerFields {
    pub fn level(&self) -> Level {
        match self {
            LayerFields::Warehouse(_) => Level::Warehouse,
            LayerFields::Zone(_) => Level::Zone,
            LayerFields::Bay(_) => Level::Bay,
            LayerFields::Shelf(_) => Level::Shelf,
            LayerFields::Column(_) => Level::Column,
            LayerFields::Tray(_) => Level::Tray,
        }
    }

    /// Ordering index among siblings. The warehouse is always 0.
    pub fn index(&self) -> usize {
        match self {
            LayerFields::Warehouse(_) => 0,
            LayerFields::Zone(f) => f.index,
            LayerFields::Bay(f) => f.index,
            LayerFields::Shelf(f) => f.index,
            LayerFields::Column(f) => f.index,
            LayerFields::Tray(f) => f.index,
        }
    }

    pub fn set_index(&mut self, index: usize) {
        match self {
            LayerFields::Warehouse(_) => {}
            LayerFields::Zone(f) => f.index = index,
            LayerFields::Bay(f) => f.index = index,
            LayerFields::Shelf(f) => f.index = index,
            LayerFields::Column(f) => f.index = index,
            LayerFields::Tray(f) => f.index = index,
        }
    }

    /// Display name, where the layer has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            LayerFields::Warehouse(f) => Some(&f.name),
            LayerFields::Zone(f) => Some(&f.name),
            LayerFields::Bay(f) => Some(&f.name),
            LayerFields::Shelf(f) => Some(&f.name),
            LayerFields::Column(_) | LayerFields::Tray(_) => None,
        }
    }

    /// Encode into the opaque store record.
    pub fn to_record(&self) -> Result<Record, FieldsError> {
        let level = self.level();
        let value = match self {
            LayerFields::Warehouse(f) => serde_json::to_value(f),
            LayerFields::Zone(f) => serde_json::to_value(f),
            LayerFields::Bay(f) => serde_json::to_value(f),
            LayerFields::Shelf(f) => serde_json::to_value(f),
            LayerFields::Column(f) => serde_json::to_value(f),
            LayerFields::Tray(f) => serde_json::to_value(f),
        }
        .map_err(|e| FieldsError::Encode {
            level,
            message: e.to_string(),
        })?;

        match value {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(FieldsError::NotAnObject { level }),
        }
    }

    /// Decode a store record as the fields of `level`.
    pub fn from_record(level: Level, record: Record) -> Result<Self, FieldsError> {
        Ok(match level {
            Level::Warehouse => LayerFields::Warehouse(decode(level, record)?),
            Level::Zone => LayerFields::Zone(decode(level, record)?),
            Level::Bay => LayerFields::Bay(decode(level, record)?),
            Level::Shelf => LayerFields::Shelf(decode(level, record)?),
            Level::Column => LayerFields::Column(decode(level, record)?),
            Level::Tray => LayerFields::Tray(decode(level, record)?),
        })
    }
}

fn decode<T: DeserializeOwned>(level: Level, record: Record) -> Result<T, FieldsError> {
    serde_json::from_value(serde_json::Value::Object(record)).map_err(|e| FieldsError::Decode {
        level,
        message: e.to_string(),
    })
}
