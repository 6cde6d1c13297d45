//! model::load
//!
//! Partial-load controller.
//!
//! # Load States
//!
//! A node is *flat* (`Children::Unloaded`) or *deep* (`Children::Loaded`).
//! A child list becomes `Loaded` only after the whole collection has been
//! fetched and decoded; any failure leaves it `Unloaded` so the load can
//! be retried.
//!
//! # Depth
//!
//! Loads are bounded by level. `LoadScope::Deep(Level::Shelf)` on a
//! warehouse makes zones, bays and shelves resident and never touches
//! columns or trays.

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::node::{Children, EntityNode, LayerNode, NodeKey};
use super::tree::WarehouseTree;
use super::ModelError;
use crate::core::fields::LayerFields;
use crate::core::types::{DocId, Level};
use crate::store::DocumentStore;

/// How far below a node to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadScope {
    /// Just the direct children.
    Flat,
    /// Every level down to and including the given one.
    Deep(Level),
}

impl LoadScope {
    /// Deepest level made resident when loading below `level`, or `None`
    /// if nothing would be loaded.
    fn deepest_below(self, level: Level) -> Option<Level> {
        let child = level.child()?;
        match self {
            LoadScope::Flat => Some(child),
            LoadScope::Deep(deepest) if deepest < level => Some(deepest),
            LoadScope::Deep(_) => None,
        }
    }
}

impl WarehouseTree {
    /// Open a stored warehouse and load it down to `deepest`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no warehouse has `id`, or the first load error below.
    pub async fn open(
        store: std::sync::Arc<dyn DocumentStore>,
        id: DocId,
        deepest: Level,
    ) -> Result<Self, ModelError> {
        let mut tree = Self::new(store, id);
        let root = tree.root();
        tree.load(root, false).await?;
        tree.load_children(root, LoadScope::Deep(deepest)).await?;
        Ok(tree)
    }

    /// Fetch the fields of `key` from the store.
    ///
    /// No-op when already loaded unless `force` is set. Reloading replaces
    /// local edits and resets the persisted snapshot.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the document does not exist
    /// - `Store` / `Decode` on fetch or decode failure
    pub async fn load(&mut self, key: NodeKey, force: bool) -> Result<(), ModelError> {
        let node = self.node(key)?;
        if node.entity.is_loaded() && !force {
            return Ok(());
        }
        let level = node.level();
        let path = self.path(key)?;

        debug!(path = %path, "loading document");
        let record = self
            .store
            .load_document(&path)
            .await?
            .ok_or_else(|| ModelError::NotFound(path.clone()))?;
        let fields = LayerFields::from_record(level, record)
            .map_err(|source| ModelError::Decode { path, source })?;

        self.node_mut(key)?.entity.replace_loaded(fields);
        Ok(())
    }

    /// Make the children of `key` resident, down to the scope's level.
    ///
    /// Already-loaded child lists are kept as they are; only unloaded ones
    /// below are fetched. A failing collection stays unloaded while its
    /// siblings continue; the first error is returned once the walk ends.
    pub async fn load_children(&mut self, key: NodeKey, scope: LoadScope) -> Result<(), ModelError> {
        let Some(deepest) = scope.deepest_below(self.level(key)?) else {
            return Ok(());
        };

        let mut queue = VecDeque::from([key]);
        let mut first_error = None;
        while let Some(current) = queue.pop_front() {
            if self.level(current)? <= deepest {
                continue;
            }
            if let Err(e) = self.fetch_children(current).await {
                warn!(node = %self.id(current)?, error = %e, "failed to load children");
                first_error.get_or_insert(e);
                continue;
            }
            queue.extend(self.children(current)?.iter().copied());
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Fetch and attach the direct children of `key` if not yet resident.
    async fn fetch_children(&mut self, key: NodeKey) -> Result<(), ModelError> {
        let node = self.node(key)?;
        if node.children.is_loaded() {
            return Ok(());
        }
        let Some(child_level) = node.level().child() else {
            return Ok(());
        };

        let parent_path = self.path(key)?;
        let collection = child_level.collection_name();
        let path = parent_path.sub_collection(collection);
        debug!(path = %path, "loading collection");
        let documents = self.store.load_collection(&path, "index").await?;

        let mut decoded = Vec::with_capacity(documents.len());
        for document in documents {
            let fields = LayerFields::from_record(child_level, document.record).map_err(|source| {
                ModelError::Decode {
                    path: parent_path.child(collection, &document.id),
                    source,
                }
            })?;
            decoded.push((document.id, fields));
        }
        decoded.sort_by_key(|(_, fields)| fields.index());

        let mut keys = Vec::with_capacity(decoded.len());
        for (id, fields) in decoded {
            let children = if child_level.is_bottom() {
                Children::Loaded(Vec::new())
            } else {
                Children::Unloaded
            };
            keys.push(self.nodes.insert(LayerNode {
                entity: EntityNode::from_store(id, fields),
                parent: Some(key),
                children,
            }));
        }
        self.node_mut(key)?.children = Children::Loaded(keys);
        Ok(())
    }
}
