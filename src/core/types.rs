//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`DocId`] - Opaque document identifier
//! - [`DocPath`] - Hierarchical, slash-joined storage path
//! - [`Level`] - One of the six layers of the storage hierarchy
//! - [`CategoryId`] - Stable identifier of a tray category
//! - [`TraySize`] - Named tray footprint used by columns
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use shelfwork::core::types::{DocId, DocPath, Level};
//!
//! let warehouse = DocId::new("w1").unwrap();
//! let zone = DocId::new("z1").unwrap();
//! let path = DocPath::document(Level::Warehouse.collection_name(), &warehouse)
//!     .child(Level::Zone.collection_name(), &zone);
//! assert_eq!(path.as_str(), "warehouses/w1/zones/z1");
//!
//! assert!(DocId::new("").is_err());
//! assert!(DocId::new("a/b").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid document id: {0}")]
    InvalidDocId(String),

    #[error("invalid category id: {0}")]
    InvalidCategoryId(String),

    #[error("unknown layer: {0}")]
    UnknownLevel(String),
}

/// An opaque document identifier.
///
/// Identifiers are path segments, so they cannot be empty and cannot
/// contain `/`.
///
/// # Example
///
/// ```
/// use shelfwork::core::types::DocId;
///
/// let id = DocId::new("MOCK_WAREHOUSE_0").unwrap();
/// assert_eq!(id.as_str(), "MOCK_WAREHOUSE_0");
///
/// let generated = DocId::generate();
/// assert_eq!(generated.as_str().len(), 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocId(String);

impl DocId {
    /// Create a validated document id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidDocId` if the id is empty, contains `/`,
    /// or contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidDocId("id cannot be empty".into()));
        }
        if id.contains('/') {
            return Err(TypeError::InvalidDocId(format!(
                "id cannot contain '/': {}",
                id
            )));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidDocId(format!(
                "id cannot contain whitespace: {:?}",
                id
            )));
        }
        Ok(Self(id))
    }

    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DocId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocId> for String {
    fn from(id: DocId) -> Self {
        id.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A slash-joined storage path.
///
/// Paths alternate collection names and document ids:
/// `warehouses/{id}/zones/{id}/bays/{id}/shelves/{id}/columns/{id}/trays/{id}`.
/// A path with an odd number of segments names a collection, an even
/// number names a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocPath(String);

impl DocPath {
    /// Path of a top-level collection.
    pub fn collection(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Path of a document in a top-level collection.
    pub fn document(collection: &str, id: &DocId) -> Self {
        Self(format!("{}/{}", collection, id))
    }

    /// Append a `collection/id` pair beneath this document.
    pub fn child(&self, collection: &str, id: &DocId) -> Self {
        Self(format!("{}/{}/{}", self.0, collection, id))
    }

    /// Path of a sub-collection beneath this document.
    pub fn sub_collection(&self, collection: &str) -> Self {
        Self(format!("{}/{}", self.0, collection))
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the path names a collection (odd number of segments).
    pub fn is_collection(&self) -> bool {
        self.segments().count() % 2 == 1
    }

    /// The final segment: a document id or a collection name.
    pub fn last_segment(&self) -> Option<&str> {
        self.0.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// The containing collection of a document path.
    pub fn parent_collection(&self) -> Option<DocPath> {
        if self.is_collection() {
            return None;
        }
        self.0.rsplit_once('/').map(|(head, _)| DocPath(head.to_string()))
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The six layers of the storage hierarchy.
///
/// Ordered bottom-up so that `Level::Tray < Level::Warehouse`; "load down
/// to shelf" means every level `>= Level::Shelf` becomes resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Tray,
    Column,
    Shelf,
    Bay,
    Zone,
    Warehouse,
}

impl Level {
    /// All levels from the top of the hierarchy down.
    pub const TOP_DOWN: [Level; 6] = [
        Level::Warehouse,
        Level::Zone,
        Level::Bay,
        Level::Shelf,
        Level::Column,
        Level::Tray,
    ];

    /// Name of the storage collection holding documents of this level.
    pub fn collection_name(self) -> &'static str {
        match self {
            Level::Warehouse => "warehouses",
            Level::Zone => "zones",
            Level::Bay => "bays",
            Level::Shelf => "shelves",
            Level::Column => "columns",
            Level::Tray => "trays",
        }
    }

    /// The level directly beneath this one, if any.
    pub fn child(self) -> Option<Level> {
        match self {
            Level::Warehouse => Some(Level::Zone),
            Level::Zone => Some(Level::Bay),
            Level::Bay => Some(Level::Shelf),
            Level::Shelf => Some(Level::Column),
            Level::Column => Some(Level::Tray),
            Level::Tray => None,
        }
    }

    /// The level directly above this one, if any.
    pub fn parent(self) -> Option<Level> {
        match self {
            Level::Warehouse => None,
            Level::Zone => Some(Level::Warehouse),
            Level::Bay => Some(Level::Zone),
            Level::Shelf => Some(Level::Bay),
            Level::Column => Some(Level::Shelf),
            Level::Tray => Some(Level::Column),
        }
    }

    /// Top layer: no parent.
    pub fn is_top(self) -> bool {
        self.parent().is_none()
    }

    /// Bottom layer: no children.
    pub fn is_bottom(self) -> bool {
        self.child().is_none()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Warehouse => "warehouse",
            Level::Zone => "zone",
            Level::Bay => "bay",
            Level::Shelf => "shelf",
            Level::Column => "column",
            Level::Tray => "tray",
        };
        f.write_str(name)
    }
}

impl FromStr for Level {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warehouse" | "warehouses" => Ok(Level::Warehouse),
            "zone" | "zones" => Ok(Level::Zone),
            "bay" | "bays" => Ok(Level::Bay),
            "shelf" | "shelves" => Ok(Level::Shelf),
            "column" | "columns" => Ok(Level::Column),
            "tray" | "trays" => Ok(Level::Tray),
            other => Err(TypeError::UnknownLevel(other.to_string())),
        }
    }
}

/// Stable identifier of a tray category.
///
/// Trays store this id rather than the category itself, so renaming a
/// category never rewrites trays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryId(String);

impl CategoryId {
    /// Create a validated category id.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::InvalidCategoryId(
                "category id cannot be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Generate a fresh random category id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CategoryId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CategoryId> for String {
    fn from(id: CategoryId) -> Self {
        id.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named tray footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraySize {
    pub label: String,
    /// Width relative to a standard tray.
    pub size_ratio: f64,
}

impl TraySize {
    pub fn new(label: impl Into<String>, size_ratio: f64) -> Self {
        Self {
            label: label.into(),
            size_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod doc_id {
        use super::*;

        #[test]
        fn valid() {
            assert!(DocId::new("abc").is_ok());
            assert!(DocId::new("MOCK_WAREHOUSE_1").is_ok());
        }

        #[test]
        fn invalid() {
            assert!(DocId::new("").is_err());
            assert!(DocId::new("a/b").is_err());
            assert!(DocId::new("has space").is_err());
        }

        #[test]
        fn generated_ids_differ() {
            assert_ne!(DocId::generate(), DocId::generate());
        }

        #[test]
        fn serde_rejects_invalid() {
            let parsed: Result<DocId, _> = serde_json::from_str("\"a/b\"");
            assert!(parsed.is_err());
        }
    }

    mod doc_path {
        use super::*;

        fn id(s: &str) -> DocId {
            DocId::new(s).unwrap()
        }

        #[test]
        fn builds_nested_paths() {
            let path = DocPath::document("warehouses", &id("w"))
                .child("zones", &id("z"))
                .child("bays", &id("b"));
            assert_eq!(path.as_str(), "warehouses/w/zones/z/bays/b");
            assert!(!path.is_collection());
            assert_eq!(path.last_segment(), Some("b"));
        }

        #[test]
        fn parent_collection() {
            let path = DocPath::document("warehouses", &id("w")).child("zones", &id("z"));
            assert_eq!(
                path.parent_collection().unwrap().as_str(),
                "warehouses/w/zones"
            );
            assert!(path.parent_collection().unwrap().parent_collection().is_none());
        }

        #[test]
        fn sub_collection() {
            let doc = DocPath::document("warehouses", &id("w"));
            let zones = doc.sub_collection("zones");
            assert!(zones.is_collection());
            assert_eq!(zones.as_str(), "warehouses/w/zones");
        }
    }

    mod level {
        use super::*;

        #[test]
        fn ordering_is_bottom_up() {
            assert!(Level::Tray < Level::Column);
            assert!(Level::Shelf < Level::Warehouse);
        }

        #[test]
        fn child_and_parent_are_inverse() {
            for level in Level::TOP_DOWN {
                if let Some(child) = level.child() {
                    assert_eq!(child.parent(), Some(level));
                }
            }
            assert!(Level::Warehouse.is_top());
            assert!(Level::Tray.is_bottom());
            assert!(!Level::Bay.is_top() && !Level::Bay.is_bottom());
        }

        #[test]
        fn parse() {
            assert_eq!("shelf".parse::<Level>().unwrap(), Level::Shelf);
            assert_eq!("Trays".parse::<Level>().unwrap(), Level::Tray);
            assert!("aisle".parse::<Level>().is_err());
        }

        #[test]
        fn display_round_trips() {
            for level in Level::TOP_DOWN {
                assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
            }
        }
    }
}
