//! model::registry
//!
//! Session-scoped repository of warehouses.
//!
//! A registry is created when a session starts and torn down with
//! [`WarehouseRegistry::sign_out`]. It keeps the flat warehouse listing
//! and every tree the session has opened; nothing is process-global.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::load::LoadScope;
use super::stage::{CommitReport, StageOptions};
use super::tree::WarehouseTree;
use super::ModelError;
use crate::core::fields::{LayerFields, WarehouseFields};
use crate::core::types::{DocId, DocPath, Level};
use crate::store::DocumentStore;

/// Per-session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Deepest level made resident when a warehouse is opened.
    pub open_depth: Level,
    /// Recorded as `blame` on tray edits.
    pub user: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            open_depth: Level::Shelf,
            user: "unknown".to_string(),
        }
    }
}

/// A warehouse as it appears in the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseSummary {
    pub id: DocId,
    pub name: String,
}

/// Unsaved work in one warehouse at sign-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uncommitted {
    pub warehouse: DocId,
    /// Staged writes and deletes never committed.
    pub pending: usize,
    /// Edited nodes never staged.
    pub dirty: usize,
}

/// What was left behind when a session ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignOutReport {
    /// Trees that were open.
    pub closed: usize,
    /// Warehouses with staged or unstaged work that was dropped.
    pub uncommitted: Vec<Uncommitted>,
}

/// Warehouses known to one session.
pub struct WarehouseRegistry {
    store: Arc<dyn DocumentStore>,
    settings: SessionSettings,
    listing: Vec<WarehouseSummary>,
    open: BTreeMap<DocId, WarehouseTree>,
}

impl std::fmt::Debug for WarehouseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseRegistry")
            .field("store", &self.store.name())
            .field("settings", &self.settings)
            .field("listing", &self.listing)
            .field("open", &self.open.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl WarehouseRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, settings: SessionSettings) -> Self {
        Self {
            store,
            settings,
            listing: Vec::new(),
            open: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Refresh the flat warehouse listing, sorted by name.
    pub async fn load_warehouses(&mut self) -> Result<&[WarehouseSummary], ModelError> {
        let collection = DocPath::collection(Level::Warehouse.collection_name());
        let documents = self.store.load_collection(&collection, "name").await?;

        let mut listing = Vec::with_capacity(documents.len());
        for document in documents {
            let path = DocPath::document(Level::Warehouse.collection_name(), &document.id);
            let name = match LayerFields::from_record(Level::Warehouse, document.record) {
                Ok(fields) => fields.name().unwrap_or_default().to_string(),
                Err(source) => return Err(ModelError::Decode { path, source }),
            };
            listing.push(WarehouseSummary {
                id: document.id,
                name,
            });
        }
        debug!(count = listing.len(), "loaded warehouse listing");
        self.listing = listing;
        Ok(&self.listing)
    }

    /// The listing as last loaded, plus warehouses created this session.
    pub fn warehouses(&self) -> &[WarehouseSummary] {
        &self.listing
    }

    /// Find a listed warehouse by id or, failing that, by name.
    pub fn find(&self, id_or_name: &str) -> Option<&WarehouseSummary> {
        self.listing
            .iter()
            .find(|w| w.id.as_str() == id_or_name)
            .or_else(|| {
                self.listing
                    .iter()
                    .find(|w| w.name.eq_ignore_ascii_case(id_or_name))
            })
    }

    /// Open a warehouse, loading it down to the session's open depth.
    ///
    /// An already open tree is kept, and whatever part of it above the open
    /// depth is still unloaded (after an earlier failure) is fetched again.
    ///
    /// # Errors
    ///
    /// `NotFound` if the warehouse does not exist. If loading below the
    /// root fails, the partly loaded tree is still kept open (see
    /// [`get_mut`](Self::get_mut)) and the error is returned.
    pub async fn open(&mut self, id: &DocId) -> Result<&mut WarehouseTree, ModelError> {
        let depth = self.settings.open_depth;
        if !self.open.contains_key(id) {
            let mut tree = WarehouseTree::new(Arc::clone(&self.store), id.clone());
            let root = tree.root();
            tree.load(root, false).await?;
            self.open.insert(id.clone(), tree);
        }
        let tree = self.open.get_mut(id).ok_or(ModelError::UnknownNode)?;
        let root = tree.root();
        if let Err(e) = tree.load_children(root, LoadScope::Deep(depth)).await {
            warn!(warehouse = %id, error = %e, "warehouse opened with unloaded parts");
            return Err(e);
        }
        debug!(warehouse = %id, depth = %depth, "opened warehouse");
        Ok(tree)
    }

    pub fn get(&self, id: &DocId) -> Option<&WarehouseTree> {
        self.open.get(id)
    }

    pub fn get_mut(&mut self, id: &DocId) -> Option<&mut WarehouseTree> {
        self.open.get_mut(id)
    }

    /// Create a new warehouse and open it.
    ///
    /// Without `commit` the warehouse exists only locally until staged.
    pub async fn create_warehouse(
        &mut self,
        name: &str,
        commit: bool,
    ) -> Result<DocId, ModelError> {
        let mut tree = WarehouseTree::create(
            Arc::clone(&self.store),
            WarehouseFields {
                name: name.to_string(),
                categories: Vec::new(),
                tray_sizes: Vec::new(),
            },
        );
        let root = tree.root();
        if commit {
            tree.stage(root, StageOptions::committing()).await?;
        }
        let id = tree.id(root)?.clone();

        self.listing.push(WarehouseSummary {
            id: id.clone(),
            name: name.to_string(),
        });
        self.listing.sort_by(|a, b| a.name.cmp(&b.name));
        self.open.insert(id.clone(), tree);
        Ok(id)
    }

    /// Delete a warehouse and everything under it.
    pub async fn remove_warehouse(&mut self, id: &DocId) -> Result<CommitReport, ModelError> {
        let mut tree = match self.open.remove(id) {
            Some(tree) => tree,
            None => {
                let mut tree = WarehouseTree::new(Arc::clone(&self.store), id.clone());
                let root = tree.root();
                tree.load(root, false).await?;
                tree
            }
        };
        match tree.destroy().await {
            Ok(report) => {
                self.listing.retain(|w| &w.id != id);
                debug!(warehouse = %id, deletes = report.deletes, "removed warehouse");
                Ok(report)
            }
            Err(e) => {
                self.open.insert(id.clone(), tree);
                Err(e)
            }
        }
    }

    /// End the session, dropping every open tree.
    pub fn sign_out(self) -> SignOutReport {
        let mut report = SignOutReport {
            closed: self.open.len(),
            uncommitted: Vec::new(),
        };
        for (id, tree) in self.open {
            let pending = tree.pending_len();
            let dirty = tree.dirty_count();
            if pending > 0 || dirty > 0 {
                warn!(warehouse = %id, pending, dirty, "discarding uncommitted work");
                report.uncommitted.push(Uncommitted {
                    warehouse: id,
                    pending,
                    dirty,
                });
            }
        }
        report
    }
}
