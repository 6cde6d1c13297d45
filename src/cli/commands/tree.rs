//! tree command - Print a warehouse's layout

use anyhow::{Context as _, Result};

use super::{describe, open_session, open_warehouse};
use crate::cli::Context;
use crate::core::types::Level;
use crate::model::{LoadScope, NodeKey, WarehouseTree};
use crate::ui::output;

/// Print the warehouse as an indented tree down to `depth`.
///
/// Defaults to the configured `load.open_depth`.
pub fn tree(ctx: &Context, warehouse: &str, depth: Option<Level>) -> Result<()> {
    let mut session = open_session(ctx)?;
    let depth = depth.unwrap_or_else(|| session.config.open_depth());
    let rt = tokio::runtime::Runtime::new()?;

    let lines = rt.block_on(async {
        let tree = open_warehouse(&mut session.registry, warehouse).await?;
        let root = tree.root();
        tree.load_children(root, LoadScope::Deep(depth))
            .await
            .context("Failed to load warehouse")?;

        let mut lines = Vec::new();
        render(tree, root, 0, depth, &mut lines)?;
        Ok::<_, anyhow::Error>(lines)
    })?;

    output::print(lines.join("\n"), ctx.verbosity());
    Ok(())
}

fn render(
    tree: &WarehouseTree,
    key: NodeKey,
    depth: usize,
    deepest: Level,
    lines: &mut Vec<String>,
) -> Result<()> {
    lines.push(output::format_tree_line(depth, describe(tree, key)?));
    if tree.level(key)? >= deepest || !tree.node(key)?.children.is_loaded() {
        return Ok(());
    }
    for &child in tree.children(key)? {
        render(tree, child, depth + 1, deepest, lines)?;
    }
    Ok(())
}
