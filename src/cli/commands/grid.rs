//! grid command - Show a shelf as a grid and replay selections on it

use std::time::Duration;

use anyhow::{anyhow, bail, Context as _, Result};

use super::{open_session, open_warehouse, resolve_shelf};
use crate::cli::Context;
use crate::core::types::Level;
use crate::model::{LoadScope, WarehouseTree};
use crate::ui::output;
use crate::view::gesture::PressToken;
use crate::view::{Cell, LongPressTimer, PaddingCache, SelectionController, ShelfGrid};

/// Long-press timer for gestures replayed from arguments.
///
/// Nothing waits: the armed token is kept and fired by the caller.
#[derive(Debug, Default)]
struct ReplayTimer {
    armed: Option<PressToken>,
}

impl LongPressTimer for ReplayTimer {
    fn arm(&mut self, token: PressToken, _delay: Duration) {
        self.armed = Some(token);
    }

    fn cancel(&mut self, token: PressToken) {
        if self.armed == Some(token) {
            self.armed = None;
        }
    }
}

/// Print the shelf grid, after applying `clicks` then `range`.
pub fn grid(
    ctx: &Context,
    warehouse: &str,
    shelf: &str,
    range: Option<&[String]>,
    clicks: &[String],
) -> Result<()> {
    let mut session = open_session(ctx)?;
    let padding = session.config.default_padding();
    let long_press = session.config.long_press();
    let rt = tokio::runtime::Runtime::new()?;

    let rendered = rt.block_on(async {
        let tree = open_warehouse(&mut session.registry, warehouse).await?;
        let shelf_key = resolve_shelf(tree, shelf).await?;
        tree.load_children(shelf_key, LoadScope::Deep(Level::Tray))
            .await
            .context("Failed to load shelf")?;

        let mut cache = PaddingCache::new();
        let grid = ShelfGrid::build(tree, shelf_key, &mut cache, padding)?;
        let mut controller = SelectionController::new(ReplayTimer::default(), long_press);

        for address in clicks {
            let cell = cell_at(&grid, address)?;
            controller.pointer_down(cell);
            controller.pointer_up(cell);
        }
        if let Some(range) = range {
            let [from, to] = range else {
                bail!("--range takes exactly two cells");
            };
            let (from, to) = (cell_at(&grid, from)?, cell_at(&grid, to)?);
            controller.pointer_down(from);
            if let Some(token) = controller.timer().armed {
                controller.timer_elapsed(token, &grid);
            }
            controller.pointer_enter(to, &grid);
            controller.pointer_up(to);
        }

        let tree: &WarehouseTree = tree;
        let columns = grid
            .columns()
            .iter()
            .map(|column| {
                column
                    .iter()
                    .map(|cell| label(tree, cell, controller.selection().get(cell)))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok::<_, anyhow::Error>((
            output::format_grid(&columns),
            controller.selection().selected_count(),
            controller.multi_select(),
        ))
    })?;

    let (grid, selected, multi_select) = rendered;
    output::print(grid, ctx.verbosity());
    if selected > 0 {
        output::print(
            format!(
                "{} selected{}",
                selected,
                if multi_select { " (multi-select)" } else { "" }
            ),
            ctx.verbosity(),
        );
    }
    Ok(())
}

/// Parse `COLUMN:ROW` into a cell of `grid`.
fn cell_at(grid: &ShelfGrid, address: &str) -> Result<Cell> {
    let (column, row) = address
        .split_once(':')
        .ok_or_else(|| anyhow!("Cell must be COLUMN:ROW, got '{}'", address))?;
    let column: usize = column
        .trim()
        .parse()
        .with_context(|| format!("Bad column in '{}'", address))?;
    let row: usize = row
        .trim()
        .parse()
        .with_context(|| format!("Bad row in '{}'", address))?;
    grid.columns()
        .get(column)
        .and_then(|cells| cells.get(row))
        .copied()
        .ok_or_else(|| anyhow!("No cell at {} on this shelf", address))
}

fn label(tree: &WarehouseTree, cell: &Cell, selected: bool) -> Result<String> {
    let text = match cell {
        Cell::Tray(key) => match tree.category_of(*key)? {
            Some(category) => category
                .short_name
                .clone()
                .unwrap_or_else(|| category.name.clone()),
            None => "(empty)".to_string(),
        },
        Cell::Space(_) => ".".to_string(),
    };
    Ok(if selected {
        format!("*{}", text)
    } else {
        text
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKey;
    use slotmap::SlotMap;

    fn two_column_grid() -> ShelfGrid {
        let mut keys: SlotMap<NodeKey, ()> = SlotMap::with_key();
        let trays: Vec<Cell> = (0..3).map(|_| Cell::Tray(keys.insert(()))).collect();
        ShelfGrid::new(vec![vec![trays[0], trays[1]], vec![trays[2]]])
    }

    #[test]
    fn parses_cell_addresses() {
        let grid = two_column_grid();
        assert_eq!(cell_at(&grid, "0:1").unwrap(), grid.columns()[0][1]);
        assert_eq!(cell_at(&grid, " 1 : 0 ").unwrap(), grid.columns()[1][0]);
        assert!(cell_at(&grid, "1:1").is_err());
        assert!(cell_at(&grid, "2:0").is_err());
        assert!(cell_at(&grid, "x").is_err());
        assert!(cell_at(&grid, "a:0").is_err());
    }

    #[test]
    fn replay_timer_tracks_the_armed_press() {
        let mut timer = ReplayTimer::default();
        timer.arm(3, Duration::from_millis(300));
        timer.cancel(2);
        assert_eq!(timer.armed, Some(3));
        timer.cancel(3);
        assert_eq!(timer.armed, None);
    }

    #[test]
    fn replayed_range_selects_a_run() {
        let grid = two_column_grid();
        let cells: Vec<Cell> = grid.walk_order().collect();
        let mut controller =
            SelectionController::new(ReplayTimer::default(), Duration::from_millis(300));

        controller.pointer_down(cells[0]);
        let token = controller.timer().armed.unwrap();
        assert!(controller.timer_elapsed(token, &grid));
        controller.pointer_enter(cells[2], &grid);
        controller.pointer_up(cells[2]);

        assert_eq!(controller.selection().selected_count(), 3);
        assert!(controller.multi_select());
    }
}
