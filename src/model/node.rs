//! model::node
//!
//! Entity nodes and their load state.
//!
//! An [`EntityNode`] owns its fields and a snapshot of the fields as last
//! persisted. Dirty detection is structural equality between the two; a
//! node that has never been persisted is always dirty.

use crate::core::fields::LayerFields;
use crate::core::types::{DocId, Level};

slotmap::new_key_type! {
    /// Handle of a node inside a [`WarehouseTree`](super::WarehouseTree).
    pub struct NodeKey;
}

/// A persisted record with dirty tracking.
#[derive(Debug, Clone)]
pub struct EntityNode {
    id: DocId,
    fields: LayerFields,
    persisted: Option<LayerFields>,
    loaded: bool,
}

impl EntityNode {
    /// A node created locally and never written.
    pub fn new_unsaved(id: DocId, fields: LayerFields) -> Self {
        Self {
            id,
            fields,
            persisted: None,
            loaded: true,
        }
    }

    /// A node read from the store.
    pub fn from_store(id: DocId, fields: LayerFields) -> Self {
        Self {
            id,
            persisted: Some(fields.clone()),
            fields,
            loaded: true,
        }
    }

    /// A placeholder whose fields have not been fetched yet.
    pub fn unloaded(id: DocId, placeholder: LayerFields) -> Self {
        Self {
            id,
            fields: placeholder,
            persisted: None,
            loaded: false,
        }
    }

    pub fn id(&self) -> &DocId {
        &self.id
    }

    pub fn level(&self) -> Level {
        self.fields.level()
    }

    pub fn fields(&self) -> &LayerFields {
        &self.fields
    }

    /// Mutable access for setters. Never performs I/O.
    pub fn fields_mut(&mut self) -> &mut LayerFields {
        &mut self.fields
    }

    pub fn persisted(&self) -> Option<&LayerFields> {
        self.persisted.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// True iff the fields differ from the last persisted snapshot, or the
    /// node has never been persisted.
    pub fn is_dirty(&self) -> bool {
        self.persisted.as_ref() != Some(&self.fields)
    }

    /// Replace fields with freshly loaded ones and reset the snapshot.
    pub fn replace_loaded(&mut self, fields: LayerFields) {
        self.persisted = Some(fields.clone());
        self.fields = fields;
        self.loaded = true;
    }

    /// Take a snapshot of the current fields, returning the previous one.
    pub fn mark_persisted(&mut self) -> Option<LayerFields> {
        self.persisted.replace(self.fields.clone())
    }

    /// Put back a snapshot returned by [`mark_persisted`](Self::mark_persisted).
    pub fn restore_persisted(&mut self, previous: Option<LayerFields>) {
        self.persisted = previous;
    }
}

/// Whether a node's children are resident.
///
/// `Unloaded` is the "flat" state: the node exists but its children are
/// unknown. `Loaded` is "deep": the list is complete and ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Children {
    Unloaded,
    Loaded(Vec<NodeKey>),
}

impl Children {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Children::Loaded(_))
    }

    pub fn as_slice(&self) -> Option<&[NodeKey]> {
        match self {
            Children::Unloaded => None,
            Children::Loaded(keys) => Some(keys),
        }
    }
}

/// A node of the layer hierarchy.
#[derive(Debug, Clone)]
pub struct LayerNode {
    pub entity: EntityNode,
    /// Navigational link to the parent; `None` only for the warehouse.
    pub parent: Option<NodeKey>,
    pub children: Children,
}

impl LayerNode {
    pub fn level(&self) -> Level {
        self.entity.level()
    }

    pub fn id(&self) -> &DocId {
        self.entity.id()
    }
}
