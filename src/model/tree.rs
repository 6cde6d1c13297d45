//! model::tree
//!
//! Arena-backed layer hierarchy rooted at a single warehouse.
//!
//! # Architecture
//!
//! Nodes live in a [`SlotMap`]; parent links and child lists hold
//! [`NodeKey`] handles, so the parent pointer is navigational only and no
//! reference cycles exist. A node is reachable from the root iff it appears
//! in its parent's loaded child list. Nodes detached by a pending delete
//! stay in the arena until the delete commits.
//!
//! Loading lives in [`load`](super::load), persistence in
//! [`stage`](super::stage).

use std::sync::Arc;

use slotmap::SlotMap;

use super::node::{Children, EntityNode, LayerNode, NodeKey};
use super::stage::PendingBatch;
use super::ModelError;
use crate::core::fields::{
    BayFields, Category, ColumnFields, LayerFields, ShelfFields, TrayFields, WarehouseFields,
    ZoneFields,
};
use crate::core::types::{CategoryId, DocId, DocPath, Level};
use crate::store::DocumentStore;

/// Generates a typed getter and setter pair for one layer's fields.
macro_rules! typed_fields {
    ($get:ident, $get_mut:ident, $variant:ident, $ty:ty) => {
        #[doc = concat!("The ", stringify!($variant), " fields of `key`.")]
        pub fn $get(&self, key: NodeKey) -> Result<&$ty, ModelError> {
            match self.fields(key)? {
                LayerFields::$variant(f) => Ok(f),
                other => Err(ModelError::WrongLevel {
                    expected: Level::$variant,
                    found: other.level(),
                }),
            }
        }

        #[doc = concat!("Mutable ", stringify!($variant), " fields of `key`.")]
        pub fn $get_mut(&mut self, key: NodeKey) -> Result<&mut $ty, ModelError> {
            match self.fields_mut(key)? {
                LayerFields::$variant(f) => Ok(f),
                other => Err(ModelError::WrongLevel {
                    expected: Level::$variant,
                    found: other.level(),
                }),
            }
        }
    };
}

/// One warehouse and whatever part of its hierarchy is resident.
pub struct WarehouseTree {
    pub(super) nodes: SlotMap<NodeKey, LayerNode>,
    pub(super) root: NodeKey,
    pub(super) store: Arc<dyn DocumentStore>,
    pub(super) pending: PendingBatch,
}

impl std::fmt::Debug for WarehouseTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseTree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("store", &self.store.name())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl WarehouseTree {
    /// A tree whose warehouse document has not been fetched yet.
    ///
    /// Call [`load`](Self::load) before reading fields.
    pub fn new(store: Arc<dyn DocumentStore>, id: DocId) -> Self {
        let placeholder = LayerFields::Warehouse(WarehouseFields {
            name: String::new(),
            categories: Vec::new(),
            tray_sizes: Vec::new(),
        });
        Self::with_root(
            store,
            EntityNode::unloaded(id, placeholder),
            Children::Unloaded,
        )
    }

    /// A brand new warehouse, dirty until staged.
    pub fn create(store: Arc<dyn DocumentStore>, fields: WarehouseFields) -> Self {
        Self::with_root(
            store,
            EntityNode::new_unsaved(DocId::generate(), LayerFields::Warehouse(fields)),
            Children::Loaded(Vec::new()),
        )
    }

    /// A warehouse whose fields were read as part of a listing.
    pub fn from_stored(store: Arc<dyn DocumentStore>, id: DocId, fields: WarehouseFields) -> Self {
        Self::with_root(
            store,
            EntityNode::from_store(id, LayerFields::Warehouse(fields)),
            Children::Unloaded,
        )
    }

    fn with_root(store: Arc<dyn DocumentStore>, entity: EntityNode, children: Children) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(LayerNode {
            entity,
            parent: None,
            children,
        });
        Self {
            nodes,
            root,
            store,
            pending: PendingBatch::default(),
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Number of nodes resident in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node(&self, key: NodeKey) -> Result<&LayerNode, ModelError> {
        self.nodes.get(key).ok_or(ModelError::UnknownNode)
    }

    pub(super) fn node_mut(&mut self, key: NodeKey) -> Result<&mut LayerNode, ModelError> {
        self.nodes.get_mut(key).ok_or(ModelError::UnknownNode)
    }

    pub fn id(&self, key: NodeKey) -> Result<&DocId, ModelError> {
        Ok(self.node(key)?.id())
    }

    pub fn level(&self, key: NodeKey) -> Result<Level, ModelError> {
        Ok(self.node(key)?.level())
    }

    pub fn fields(&self, key: NodeKey) -> Result<&LayerFields, ModelError> {
        Ok(self.node(key)?.entity.fields())
    }

    /// Setter path for any layer. Edits are local until staged.
    pub fn fields_mut(&mut self, key: NodeKey) -> Result<&mut LayerFields, ModelError> {
        Ok(self.node_mut(key)?.entity.fields_mut())
    }

    pub fn is_dirty(&self, key: NodeKey) -> Result<bool, ModelError> {
        Ok(self.node(key)?.entity.is_dirty())
    }

    pub fn is_loaded(&self, key: NodeKey) -> Result<bool, ModelError> {
        Ok(self.node(key)?.entity.is_loaded())
    }

    /// Whether the children of `key` are resident.
    pub fn is_deep(&self, key: NodeKey) -> Result<bool, ModelError> {
        Ok(self.node(key)?.children.is_loaded())
    }

    /// Resident, loaded nodes with edits not yet staged.
    pub fn dirty_count(&self) -> usize {
        self.subtree(self.root)
            .into_iter()
            .filter_map(|k| self.nodes.get(k))
            .filter(|n| n.entity.is_loaded() && n.entity.is_dirty())
            .count()
    }

    pub fn warehouse(&self) -> Result<&WarehouseFields, ModelError> {
        self.warehouse_fields(self.root)
    }

    pub fn warehouse_mut(&mut self) -> Result<&mut WarehouseFields, ModelError> {
        let root = self.root;
        self.warehouse_fields_mut(root)
    }

    typed_fields!(warehouse_fields, warehouse_fields_mut, Warehouse, WarehouseFields);
    typed_fields!(zone, zone_mut, Zone, ZoneFields);
    typed_fields!(bay, bay_mut, Bay, BayFields);
    typed_fields!(shelf, shelf_mut, Shelf, ShelfFields);
    typed_fields!(column, column_mut, Column, ColumnFields);
    typed_fields!(tray, tray_mut, Tray, TrayFields);

    /// Edit a tray and stamp who changed it and when.
    pub fn edit_tray(
        &mut self,
        key: NodeKey,
        blame: &str,
        edit: impl FnOnce(&mut TrayFields),
    ) -> Result<(), ModelError> {
        let tray = self.tray_mut(key)?;
        edit(&mut *tray);
        tray.touch(blame);
        Ok(())
    }

    pub fn parent(&self, key: NodeKey) -> Result<Option<NodeKey>, ModelError> {
        Ok(self.node(key)?.parent)
    }

    /// The nearest node at `level` walking up from `key`, `key` included.
    pub fn ancestor(&self, key: NodeKey, level: Level) -> Option<NodeKey> {
        let mut current = Some(key);
        while let Some(k) = current {
            let node = self.nodes.get(k)?;
            if node.level() == level {
                return Some(k);
            }
            if node.level() > level {
                return None;
            }
            current = node.parent;
        }
        None
    }

    /// Ordered children of `key`.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the children have not been loaded.
    pub fn children(&self, key: NodeKey) -> Result<&[NodeKey], ModelError> {
        let node = self.node(key)?;
        node.children.as_slice().ok_or_else(|| {
            ModelError::InvalidState(format!(
                "children of {} {} are not loaded",
                node.level(),
                node.id()
            ))
        })
    }

    /// The child at `position`, if any.
    pub fn child_at(&self, parent: NodeKey, position: usize) -> Result<Option<NodeKey>, ModelError> {
        Ok(self.children(parent)?.get(position).copied())
    }

    /// First child whose name matches, ignoring ASCII case.
    pub fn find_child(&self, parent: NodeKey, name: &str) -> Result<Option<NodeKey>, ModelError> {
        Ok(self.children(parent)?.iter().copied().find(|&k| {
            self.nodes
                .get(k)
                .and_then(|n| n.entity.fields().name())
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        }))
    }

    /// `key` and every resident descendant, in pre-order.
    pub fn subtree(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            let Some(node) = self.nodes.get(k) else {
                continue;
            };
            out.push(k);
            if let Some(children) = node.children.as_slice() {
                stack.extend(children.iter().rev().copied());
            }
        }
        out
    }

    /// Resident descendants of `key`, in pre-order, excluding `key`.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut all = self.subtree(key);
        if !all.is_empty() {
            all.remove(0);
        }
        all
    }

    /// Resident nodes of `level` under `key`, in display order.
    pub fn nodes_at(&self, key: NodeKey, level: Level) -> Vec<NodeKey> {
        self.subtree(key)
            .into_iter()
            .filter(|&k| self.nodes.get(k).is_some_and(|n| n.level() == level))
            .collect()
    }

    /// Storage path of `key`, built from its ancestor chain.
    pub fn path(&self, key: NodeKey) -> Result<DocPath, ModelError> {
        let mut chain = Vec::new();
        let mut current = Some(key);
        while let Some(k) = current {
            let node = self.node(k)?;
            chain.push(node);
            current = node.parent;
        }

        let mut path: Option<DocPath> = None;
        for node in chain.into_iter().rev() {
            let collection = node.level().collection_name();
            path = Some(match path {
                None => DocPath::document(collection, node.id()),
                Some(parent) => parent.child(collection, node.id()),
            });
        }
        path.ok_or(ModelError::UnknownNode)
    }

    /// Append a new child to a loaded parent.
    pub fn insert_child(
        &mut self,
        parent: NodeKey,
        fields: LayerFields,
    ) -> Result<NodeKey, ModelError> {
        let position = self.children(parent)?.len();
        self.insert_child_at(parent, position, fields)
    }

    /// Insert a new child at `position` among its siblings.
    ///
    /// The new node is dirty and gets `index = position`; siblings after
    /// it are renumbered when the parent is next staged.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the parent's children are not loaded, or the
    ///   position is past the end
    /// - `WrongLevel` if `fields` do not belong one level below the parent
    pub fn insert_child_at(
        &mut self,
        parent: NodeKey,
        position: usize,
        mut fields: LayerFields,
    ) -> Result<NodeKey, ModelError> {
        let parent_level = self.level(parent)?;
        let expected = parent_level.child().ok_or_else(|| {
            ModelError::InvalidState(format!("a {} cannot have children", parent_level))
        })?;
        if fields.level() != expected {
            return Err(ModelError::WrongLevel {
                expected,
                found: fields.level(),
            });
        }
        let len = self.children(parent)?.len();
        if position > len {
            return Err(ModelError::InvalidState(format!(
                "position {} is past the end of {} children",
                position, len
            )));
        }

        fields.set_index(position);
        let key = self.nodes.insert(LayerNode {
            entity: EntityNode::new_unsaved(DocId::generate(), fields),
            parent: Some(parent),
            children: Children::Loaded(Vec::new()),
        });
        if let Children::Loaded(children) = &mut self.node_mut(parent)?.children {
            children.insert(position, key);
        }
        Ok(key)
    }

    /// Remove `key` from its parent's child list. Returns the parent and
    /// the position it occupied.
    pub(super) fn detach(&mut self, key: NodeKey) -> Result<(NodeKey, usize), ModelError> {
        let parent = self
            .parent(key)?
            .ok_or_else(|| ModelError::InvalidState("the warehouse has no parent".into()))?;
        let Children::Loaded(children) = &mut self.node_mut(parent)?.children else {
            return Err(ModelError::InvalidState(
                "parent children are not loaded".into(),
            ));
        };
        let position = children
            .iter()
            .position(|&k| k == key)
            .ok_or_else(|| ModelError::InvalidState("node is already detached".into()))?;
        children.remove(position);
        Ok((parent, position))
    }

    /// Undo a [`detach`](Self::detach).
    pub(super) fn reattach(&mut self, parent: NodeKey, position: usize, key: NodeKey) {
        if let Some(LayerNode {
            children: Children::Loaded(children),
            ..
        }) = self.nodes.get_mut(parent)
        {
            let position = position.min(children.len());
            children.insert(position, key);
        }
    }

    /// Drop `key` and its resident subtree from the arena.
    pub(super) fn purge_subtree(&mut self, key: NodeKey) {
        for k in self.subtree(key) {
            self.nodes.remove(k);
        }
    }

    /// Look up a category on the warehouse by id.
    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.warehouse()
            .ok()?
            .categories
            .iter()
            .find(|c| &c.id == id)
    }

    /// Look up a category by name, ignoring ASCII case.
    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.warehouse()
            .ok()?
            .categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// The category a tray refers to. A dangling id resolves to `None`.
    pub fn category_of(&self, tray: NodeKey) -> Result<Option<&Category>, ModelError> {
        Ok(self
            .tray(tray)?
            .category_id
            .as_ref()
            .and_then(|id| self.category(id)))
    }

    /// Register a category on the warehouse.
    ///
    /// # Errors
    ///
    /// `InvalidState` if a category with the same name exists.
    pub fn add_category(&mut self, category: Category) -> Result<CategoryId, ModelError> {
        if self.category_by_name(&category.name).is_some() {
            return Err(ModelError::InvalidState(format!(
                "category '{}' already exists",
                category.name
            )));
        }
        let id = category.id.clone();
        self.warehouse_mut()?.categories.push(category);
        Ok(id)
    }

    /// Rename a category. Trays keep referring to it by id.
    pub fn rename_category(&mut self, id: &CategoryId, name: &str) -> Result<(), ModelError> {
        if let Some(existing) = self.category_by_name(name) {
            if &existing.id != id {
                return Err(ModelError::InvalidState(format!(
                    "category '{}' already exists",
                    name
                )));
            }
        }
        let category = self
            .warehouse_mut()?
            .categories
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| ModelError::InvalidState(format!("unknown category {}", id)))?;
        category.name = name.to_string();
        Ok(())
    }

    /// Human-readable tray location: `"{zone} {bay}{shelf}"`.
    pub fn location_name(&self, tray: NodeKey) -> Result<String, ModelError> {
        self.tray(tray)?;
        let name_of = |level: Level| -> Result<String, ModelError> {
            let key = self.ancestor(tray, level).ok_or_else(|| {
                ModelError::InvalidState(format!("tray has no {} ancestor", level))
            })?;
            Ok(self.fields(key)?.name().unwrap_or_default().to_string())
        };
        Ok(format!(
            "{} {}{}",
            name_of(Level::Zone)?,
            name_of(Level::Bay)?,
            name_of(Level::Shelf)?
        ))
    }

    /// Positional code of a node: positions among siblings from the zone
    /// down, joined with `_` (a tray yields `"z_b_s_c_t"`).
    ///
    /// Positions come from the resident child lists, so the code reflects
    /// inserts and deletes not yet staged. A detached node falls back to
    /// its stored index.
    pub fn location_code(&self, key: NodeKey) -> Result<String, ModelError> {
        let mut indices = Vec::new();
        let mut current = Some(key);
        while let Some(k) = current {
            let node = self.node(k)?;
            if node.level().is_top() {
                break;
            }
            let position = node
                .parent
                .and_then(|p| self.nodes.get(p))
                .and_then(|p| p.children.as_slice())
                .and_then(|siblings| siblings.iter().position(|&s| s == k))
                .unwrap_or_else(|| node.entity.fields().index());
            indices.push(position.to_string());
            current = node.parent;
        }
        indices.reverse();
        Ok(indices.join("_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn tree() -> WarehouseTree {
        WarehouseTree::create(
            Arc::new(MemoryStore::new()),
            WarehouseFields {
                name: "Durham".into(),
                categories: Vec::new(),
                tray_sizes: Vec::new(),
            },
        )
    }

    fn zone(name: &str) -> LayerFields {
        LayerFields::Zone(ZoneFields {
            index: 0,
            name: name.into(),
            color: "#ff0000".into(),
        })
    }

    fn bay(name: &str) -> LayerFields {
        LayerFields::Bay(BayFields {
            index: 0,
            name: name.into(),
        })
    }

    fn shelf(name: &str) -> LayerFields {
        LayerFields::Shelf(ShelfFields {
            index: 0,
            name: name.into(),
            is_picking_area: false,
        })
    }

    fn column() -> LayerFields {
        LayerFields::Column(ColumnFields {
            index: 0,
            size: None,
            max_height: Some(3),
        })
    }

    /// warehouse > Red > A > 1 > column > tray, tray
    fn branch(t: &mut WarehouseTree) -> (NodeKey, NodeKey, NodeKey) {
        let z = t.insert_child(t.root(), zone("Red")).unwrap();
        let b = t.insert_child(z, bay("A")).unwrap();
        let s = t.insert_child(b, shelf("1")).unwrap();
        let c = t.insert_child(s, column()).unwrap();
        let t0 = t.insert_child(c, LayerFields::Tray(TrayFields::empty(0))).unwrap();
        let t1 = t.insert_child(c, LayerFields::Tray(TrayFields::empty(0))).unwrap();
        (c, t0, t1)
    }

    #[test]
    fn new_tree_has_unloaded_root() {
        let t = WarehouseTree::new(Arc::new(MemoryStore::new()), DocId::new("w1").unwrap());
        assert!(!t.is_loaded(t.root()).unwrap());
        assert!(!t.is_deep(t.root()).unwrap());
        assert!(matches!(
            t.children(t.root()),
            Err(ModelError::InvalidState(_))
        ));
    }

    #[test]
    fn insert_sets_index_and_parent() {
        let mut t = tree();
        let a = t.insert_child(t.root(), zone("A")).unwrap();
        let b = t.insert_child(t.root(), zone("B")).unwrap();
        let c = t.insert_child_at(t.root(), 0, zone("C")).unwrap();

        assert_eq!(t.children(t.root()).unwrap(), &[c, a, b]);
        assert_eq!(t.zone(c).unwrap().index, 0);
        assert_eq!(t.zone(b).unwrap().index, 1);
        assert_eq!(t.parent(c).unwrap(), Some(t.root()));
        assert!(t.is_dirty(c).unwrap());
    }

    #[test]
    fn insert_rejects_wrong_level() {
        let mut t = tree();
        let err = t.insert_child(t.root(), bay("A")).unwrap_err();
        assert!(matches!(
            err,
            ModelError::WrongLevel {
                expected: Level::Zone,
                found: Level::Bay
            }
        ));
    }

    #[test]
    fn insert_rejects_position_past_end() {
        let mut t = tree();
        assert!(matches!(
            t.insert_child_at(t.root(), 1, zone("A")),
            Err(ModelError::InvalidState(_))
        ));
    }

    #[test]
    fn tray_cannot_have_children() {
        let mut t = tree();
        let (_, tray, _) = branch(&mut t);
        assert!(matches!(
            t.insert_child(tray, LayerFields::Tray(TrayFields::empty(0))),
            Err(ModelError::InvalidState(_))
        ));
    }

    #[test]
    fn typed_accessor_reports_level() {
        let mut t = tree();
        let z = t.insert_child(t.root(), zone("A")).unwrap();
        assert!(matches!(
            t.tray(z),
            Err(ModelError::WrongLevel {
                expected: Level::Tray,
                found: Level::Zone
            })
        ));
    }

    #[test]
    fn paths_follow_hierarchy() {
        let mut t = tree();
        let (c, tray, _) = branch(&mut t);
        let root_id = t.id(t.root()).unwrap().clone();
        let path = t.path(tray).unwrap();
        assert!(path
            .as_str()
            .starts_with(&format!("warehouses/{}/zones/", root_id)));
        assert!(path
            .as_str()
            .starts_with(&format!("{}/trays/", t.path(c).unwrap())));
        assert_eq!(path.as_str().split('/').count(), 12);
    }

    #[test]
    fn location_strings() {
        let mut t = tree();
        let (_, _, second) = branch(&mut t);
        assert_eq!(t.location_name(second).unwrap(), "Red A1");
        assert_eq!(t.location_code(second).unwrap(), "0_0_0_0_1");
        assert_eq!(t.location_code(t.root()).unwrap(), "");
    }

    #[test]
    fn location_code_tracks_unstaged_inserts() {
        let mut t = tree();
        let (c, _, second) = branch(&mut t);
        let z = t.insert_child_at(t.root(), 0, zone("Blue")).unwrap();
        t.insert_child_at(c, 0, LayerFields::Tray(TrayFields::empty(0)))
            .unwrap();

        assert_eq!(t.tray(second).unwrap().index, 1, "not yet renumbered");
        assert_eq!(t.location_code(second).unwrap(), "1_0_0_0_2");
        assert_eq!(t.location_code(z).unwrap(), "0");
    }

    #[test]
    fn ancestors_and_find() {
        let mut t = tree();
        let (c, tray, _) = branch(&mut t);
        let z = t.find_child(t.root(), "red").unwrap().unwrap();
        assert_eq!(t.ancestor(tray, Level::Zone), Some(z));
        assert_eq!(t.ancestor(tray, Level::Tray), Some(tray));
        assert_eq!(t.ancestor(c, Level::Tray), None);
        assert_eq!(t.find_child(t.root(), "blue").unwrap(), None);
    }

    #[test]
    fn subtree_is_preorder() {
        let mut t = tree();
        let (c, t0, t1) = branch(&mut t);
        assert_eq!(t.subtree(c), vec![c, t0, t1]);
        assert_eq!(t.descendants(c), vec![t0, t1]);
        assert_eq!(t.nodes_at(t.root(), Level::Tray), vec![t0, t1]);
    }

    #[test]
    fn detach_and_reattach() {
        let mut t = tree();
        let (c, t0, t1) = branch(&mut t);
        assert_eq!(t.detach(t0).unwrap(), (c, 0));
        assert_eq!(t.children(c).unwrap(), &[t1]);
        t.reattach(c, 0, t0);
        assert_eq!(t.children(c).unwrap(), &[t0, t1]);
    }

    #[test]
    fn categories_are_referenced_by_id() {
        let mut t = tree();
        let (_, tray, _) = branch(&mut t);
        let id = t.add_category(Category::new("Beans")).unwrap();
        t.edit_tray(tray, "sam", |f| f.category_id = Some(id.clone()))
            .unwrap();

        t.rename_category(&id, "Baked Beans").unwrap();
        assert_eq!(t.category_of(tray).unwrap().unwrap().name, "Baked Beans");
        assert_eq!(t.tray(tray).unwrap().blame, "sam");

        assert!(t.add_category(Category::new("baked beans")).is_err());
        assert!(t
            .rename_category(&CategoryId::new("missing").unwrap(), "X")
            .is_err());
    }
}
