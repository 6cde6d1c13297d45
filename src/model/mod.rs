//! model
//!
//! The layered warehouse model: entity nodes, the layer tree, partial
//! loading, and staged persistence.
//!
//! # Modules
//!
//! - [`node`] - Entity nodes with dirty tracking and the child load state
//! - [`tree`] - Arena-backed layer hierarchy rooted at one warehouse
//! - [`load`] - Partial-load controller (flat and level-bounded deep loads)
//! - [`stage`] - Staging/commit engine with atomic batches and rollback
//! - [`registry`] - Session-scoped repository of open warehouses
//! - [`search`] - Tray search by category, weight, comment and picking area
//! - [`demo`] - Deterministic demo warehouse generator
//!
//! # Invariants
//!
//! 1. Sibling indices are dense (0..n) after every stage
//! 2. A node's children are either unknown or fully resident, never partial
//! 3. Staging only ever writes nodes it has loaded
//! 4. A failed commit leaves no snapshot or structural change applied in memory

pub mod demo;
pub mod load;
pub mod node;
pub mod registry;
pub mod search;
pub mod stage;
pub mod tree;

pub use load::LoadScope;
pub use node::{Children, EntityNode, LayerNode, NodeKey};
pub use registry::WarehouseRegistry;
pub use search::{CategoryFilter, SearchQuery, SortKey, WeightFilter};
pub use stage::{CommitReport, StageOptions, StageReport};
pub use tree::WarehouseTree;

use thiserror::Error;

use crate::core::fields::FieldsError;
use crate::core::types::{DocPath, Level};
use crate::store::StoreError;

/// Errors from model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The identifier did not resolve to a stored document.
    #[error("not found: {0}")]
    NotFound(DocPath),

    /// The store rejected a commit batch; nothing was applied.
    #[error("commit rejected: {0}")]
    StageConflict(#[source] StoreError),

    /// The operation does not fit the node's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A load from the store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored document could not be decoded.
    #[error("bad document at {path}: {source}")]
    Decode {
        path: DocPath,
        #[source]
        source: FieldsError,
    },

    /// Local fields could not be encoded for writing.
    #[error("cannot encode {path}: {source}")]
    Encode {
        path: DocPath,
        #[source]
        source: FieldsError,
    },

    /// The node key does not belong to this tree (or was purged).
    #[error("unknown node")]
    UnknownNode,

    /// A node of one layer was used where another was expected.
    #[error("expected a {expected} node, found a {found} node")]
    WrongLevel { expected: Level, found: Level },
}

impl ModelError {
    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ModelError::Store(StoreError::Unavailable(_) | StoreError::Io(_) | StoreError::Locked)
                | ModelError::StageConflict(
                    StoreError::Unavailable(_) | StoreError::Io(_) | StoreError::Locked
                )
        )
    }
}
