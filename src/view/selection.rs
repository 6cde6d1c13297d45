//! view::selection
//!
//! Tray selection state and the range algorithm.
//!
//! # Walk Order
//!
//! A shelf grid is flattened column by column, left to right, and within
//! each column from the top slot down. Slots are stored bottom-up (index 0
//! is the lowest tray), so each column's cells are visited in reverse.
//! Dragging upward therefore extends a selection upward.
//!
//! # Range Update
//!
//! Given the selection from before the drag, an anchor and a target:
//!
//! 1. Every grid cell is reset to its state before the drag
//! 2. The grid is walked in walk order with an "inside" flag, initially off
//! 3. A cell is selected if the flag is on or it is an endpoint; the flag
//!    then flips once for each endpoint the cell is
//!
//! The result is one contiguous run from anchor to target, whichever comes
//! first, and just the anchor when both are the same cell.

use std::collections::HashMap;

use super::padding::PaddingCache;
use super::Cell;
use crate::model::{ModelError, NodeKey, WarehouseTree};

/// Which cells are selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionMap {
    cells: HashMap<Cell, bool>,
}

impl SelectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: &Cell) -> bool {
        self.cells.get(cell).copied().unwrap_or(false)
    }

    pub fn set(&mut self, cell: Cell, selected: bool) {
        self.cells.insert(cell, selected);
    }

    /// Flip a cell, returning its new state.
    pub fn toggle(&mut self, cell: Cell) -> bool {
        let selected = !self.get(&cell);
        self.set(cell, selected);
        selected
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        for selected in self.cells.values_mut() {
            *selected = false;
        }
    }

    /// Selected cells, in no particular order.
    pub fn selected(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells
            .iter()
            .filter(|(_, &selected)| selected)
            .map(|(&cell, _)| cell)
    }

    pub fn selected_count(&self) -> usize {
        self.cells.values().filter(|&&s| s).count()
    }

    /// Forget cells that are no longer in `grid`.
    pub fn retain_grid(&mut self, grid: &ShelfGrid) {
        self.cells.retain(|cell, _| grid.contains(cell));
    }
}

/// The cells of one shelf, column-major, each column bottom-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShelfGrid {
    columns: Vec<Vec<Cell>>,
}

impl ShelfGrid {
    pub fn new(columns: Vec<Vec<Cell>>) -> Self {
        Self { columns }
    }

    /// Grid for `shelf` with every column padded through `cache`.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the shelf's columns or their trays are not loaded.
    pub fn build(
        tree: &WarehouseTree,
        shelf: NodeKey,
        cache: &mut PaddingCache,
        default_padding: usize,
    ) -> Result<Self, ModelError> {
        tree.shelf(shelf)?;
        let columns = tree
            .children(shelf)?
            .iter()
            .map(|&column| cache.padded_cells(tree, column, default_padding))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Vec<Cell>] {
        &self.columns
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        self.columns.iter().any(|c| c.contains(cell))
    }

    /// Tallest column, in slots.
    pub fn height(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cells in walk order: columns ascending, rows from the top down.
    pub fn walk_order(&self) -> impl Iterator<Item = Cell> + '_ {
        self.columns
            .iter()
            .flat_map(|column| column.iter().rev().copied())
    }
}

/// Recompute `map` as `before` plus the run from `anchor` to `target`.
pub fn apply_range(
    map: &mut SelectionMap,
    before: &SelectionMap,
    grid: &ShelfGrid,
    anchor: Cell,
    target: Cell,
) {
    for cell in grid.walk_order() {
        map.set(cell, before.get(&cell));
    }

    let mut inside = false;
    for cell in grid.walk_order() {
        let is_anchor = cell == anchor;
        let is_target = cell == target;
        if inside || is_anchor || is_target {
            map.set(cell, true);
        }
        inside ^= is_anchor ^ is_target;
    }
}
