//! view
//!
//! Presentation-side state over a loaded shelf: padded columns, the
//! selection map and the gesture that drives it.
//!
//! # Modules
//!
//! - [`padding`] - Stable placeholder cells for empty slots
//! - [`selection`] - Selection map, shelf grid and the range algorithm
//! - [`gesture`] - Click / long-press-drag state machine
//!
//! Everything here is synchronous except the long-press timer, and is
//! owned by a single view.

pub mod gesture;
pub mod padding;
pub mod selection;

pub use gesture::{GestureState, LongPressTimer, SelectionController, TokioTimer};
pub use padding::{PaddingCache, SpaceId, TraySpace};
pub use selection::{apply_range, SelectionMap, ShelfGrid};

use crate::model::NodeKey;

/// One slot of a shelf grid: a real tray or an empty space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Tray(NodeKey),
    Space(TraySpace),
}

impl Cell {
    pub fn is_space(&self) -> bool {
        matches!(self, Cell::Space(_))
    }

    /// The tray behind this cell, if it is one.
    pub fn tray(&self) -> Option<NodeKey> {
        match self {
            Cell::Tray(key) => Some(*key),
            Cell::Space(_) => None,
        }
    }
}
