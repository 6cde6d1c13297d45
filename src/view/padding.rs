//! view::padding
//!
//! Placeholder cells for empty column slots.
//!
//! A column shows its trays followed by [`TraySpace`]s up to its
//! `max_height`, or a fixed number of extra slots when it is uncapped.
//! Spaces are used as selection keys, so the cache hands out the same
//! space for a given slot for as long as that slot stays empty.
//!
//! # Reconciliation
//!
//! On every call the needed slots are `trays.len()..capacity`. Cached
//! spaces whose index is still in that range are kept, the rest dropped,
//! and only missing indices get a fresh [`SpaceId`].

use slotmap::SecondaryMap;

use super::Cell;
use crate::model::{ModelError, NodeKey, WarehouseTree};

/// Identity of a tray space, unique within one [`PaddingCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpaceId(u64);

/// An empty slot in a column. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraySpace {
    pub id: SpaceId,
    /// Slot position, counted like tray indices.
    pub index: usize,
    pub column: NodeKey,
}

/// Per-column cache of issued tray spaces.
#[derive(Debug, Default)]
pub struct PaddingCache {
    spaces: SecondaryMap<NodeKey, Vec<TraySpace>>,
    next_id: u64,
}

impl PaddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The column's trays followed by its padding spaces.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the column's trays are not loaded, `WrongLevel`
    /// if `column` is not a column.
    pub fn padded_cells(
        &mut self,
        tree: &WarehouseTree,
        column: NodeKey,
        default_padding: usize,
    ) -> Result<Vec<Cell>, ModelError> {
        let max_height = tree.column(column)?.max_height;
        let trays = tree.children(column)?;

        let filled = trays.len();
        let capacity = match max_height {
            Some(height) => (height as usize).max(filled),
            None => filled + default_padding,
        };

        let mut cells: Vec<Cell> = trays.iter().copied().map(Cell::Tray).collect();
        cells.extend(self.reconcile(column, filled..capacity).into_iter().map(Cell::Space));
        Ok(cells)
    }

    fn reconcile(&mut self, column: NodeKey, needed: std::ops::Range<usize>) -> Vec<TraySpace> {
        let mut spaces = self.spaces.remove(column).unwrap_or_default();
        spaces.retain(|s| needed.contains(&s.index));

        for index in needed {
            if !spaces.iter().any(|s| s.index == index) {
                let id = SpaceId(self.next_id);
                self.next_id += 1;
                spaces.push(TraySpace { id, index, column });
            }
        }
        spaces.sort_by_key(|s| s.index);

        self.spaces.insert(column, spaces.clone());
        spaces
    }

    /// Forget cached spaces for one column, or for every column.
    pub fn purge(&mut self, column: Option<NodeKey>) {
        match column {
            Some(column) => {
                self.spaces.remove(column);
            }
            None => self.spaces.clear(),
        }
    }

    /// Number of columns with cached spaces.
    pub fn cached_columns(&self) -> usize {
        self.spaces.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::{
        BayFields, ColumnFields, LayerFields, ShelfFields, TrayFields, WarehouseFields, ZoneFields,
    };
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn column_with(max_height: Option<u32>, trays: usize) -> (WarehouseTree, NodeKey) {
        let mut tree = WarehouseTree::create(
            Arc::new(MemoryStore::new()),
            WarehouseFields {
                name: "W".into(),
                categories: Vec::new(),
                tray_sizes: Vec::new(),
            },
        );
        let z = tree
            .insert_child(
                tree.root(),
                LayerFields::Zone(ZoneFields {
                    index: 0,
                    name: "Red".into(),
                    color: "#f00".into(),
                }),
            )
            .unwrap();
        let b = tree
            .insert_child(
                z,
                LayerFields::Bay(BayFields {
                    index: 0,
                    name: "A".into(),
                }),
            )
            .unwrap();
        let s = tree
            .insert_child(
                b,
                LayerFields::Shelf(ShelfFields {
                    index: 0,
                    name: "1".into(),
                    is_picking_area: false,
                }),
            )
            .unwrap();
        let c = tree
            .insert_child(
                s,
                LayerFields::Column(ColumnFields {
                    index: 0,
                    size: None,
                    max_height,
                }),
            )
            .unwrap();
        for _ in 0..trays {
            tree.insert_child(c, LayerFields::Tray(TrayFields::empty(0)))
                .unwrap();
        }
        (tree, c)
    }

    fn spaces(cells: &[Cell]) -> Vec<TraySpace> {
        cells
            .iter()
            .filter_map(|c| match c {
                Cell::Space(s) => Some(*s),
                Cell::Tray(_) => None,
            })
            .collect()
    }

    #[test]
    fn pads_to_capacity() {
        let (tree, c) = column_with(Some(5), 2);
        let mut cache = PaddingCache::new();
        let cells = cache.padded_cells(&tree, c, 1).unwrap();
        assert_eq!(cells.len(), 5);
        assert!(matches!(cells[0], Cell::Tray(_)));
        let indices: Vec<_> = spaces(&cells).iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![2, 3, 4]);
    }

    #[test]
    fn unchanged_column_reuses_spaces() {
        let (tree, c) = column_with(Some(5), 2);
        let mut cache = PaddingCache::new();
        let first = cache.padded_cells(&tree, c, 1).unwrap();
        let second = cache.padded_cells(&tree, c, 1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn adding_a_tray_keeps_surviving_spaces() {
        let (mut tree, c) = column_with(Some(5), 2);
        let mut cache = PaddingCache::new();
        let before = spaces(&cache.padded_cells(&tree, c, 1).unwrap());

        tree.insert_child(c, LayerFields::Tray(TrayFields::empty(0)))
            .unwrap();
        let after = spaces(&cache.padded_cells(&tree, c, 1).unwrap());

        assert_eq!(after, before[1..].to_vec());
        assert!(after.iter().all(|s| s.index != 2));
    }

    #[tokio::test]
    async fn removing_a_tray_allocates_only_the_gap() {
        let (mut tree, c) = column_with(Some(4), 3);
        let mut cache = PaddingCache::new();
        let before = spaces(&cache.padded_cells(&tree, c, 1).unwrap());
        assert_eq!(before.len(), 1);

        let last = *tree.children(c).unwrap().last().unwrap();
        tree.delete(last, false).await.unwrap();
        let after = spaces(&cache.padded_cells(&tree, c, 1).unwrap());

        assert_eq!(after.len(), 2);
        assert_eq!(after[0].index, 2);
        assert_eq!(after[1], before[0]);
        assert_ne!(after[0].id, before[0].id);
    }

    #[test]
    fn uncapped_column_gets_default_padding() {
        let (tree, c) = column_with(None, 4);
        let mut cache = PaddingCache::new();
        let cells = cache.padded_cells(&tree, c, 2).unwrap();
        assert_eq!(cells.len(), 6);
        assert_eq!(spaces(&cells)[0].index, 4);
    }

    #[test]
    fn overfull_column_has_no_spaces() {
        let (tree, c) = column_with(Some(2), 3);
        let mut cache = PaddingCache::new();
        assert_eq!(cache.padded_cells(&tree, c, 1).unwrap().len(), 3);
    }

    #[test]
    fn purge_forgets_identity() {
        let (tree, c) = column_with(Some(3), 1);
        let mut cache = PaddingCache::new();
        let before = spaces(&cache.padded_cells(&tree, c, 1).unwrap());
        assert_eq!(cache.cached_columns(), 1);

        cache.purge(Some(c));
        assert_eq!(cache.cached_columns(), 0);
        let after = spaces(&cache.padded_cells(&tree, c, 1).unwrap());
        assert_ne!(before[0].id, after[0].id);

        cache.purge(None);
        assert_eq!(cache.cached_columns(), 0);
    }
}
