//! tray command - Add, edit and remove trays
//!
//! Every change is staged from the tray's shelf down and committed in one
//! batch, so sibling indices and location names reach the store together.

use anyhow::{anyhow, bail, Context as _, Result};

use super::{child_at, open_session, open_warehouse, resolve_shelf};
use crate::cli::args::TrayArgs;
use crate::cli::Context;
use crate::core::expiry::ExpiryRange;
use crate::core::fields::{LayerFields, TrayFields};
use crate::core::types::{CategoryId, Level};
use crate::model::{LoadScope, NodeKey, StageOptions, WarehouseTree};
use crate::ui::output;

/// Field changes for `tray edit`.
#[derive(Debug, Default, Clone)]
pub struct TrayEdit {
    pub fields: TrayArgs,
    pub clear_category: bool,
    pub clear_expiry: bool,
    pub clear_weight: bool,
    pub clear_comment: bool,
}

/// Tray arguments checked against the warehouse.
#[derive(Debug, Default)]
struct ResolvedFields {
    category: Option<CategoryId>,
    expiry: Option<ExpiryRange>,
    weight: Option<f64>,
    comment: Option<String>,
}

impl ResolvedFields {
    fn resolve(tree: &WarehouseTree, args: &TrayArgs) -> Result<Self> {
        let category = args
            .category
            .as_deref()
            .map(|name| {
                tree.category_by_name(name)
                    .map(|c| c.id.clone())
                    .ok_or_else(|| {
                        anyhow!(
                            "No category named '{}'. Run 'sw category list' to see them.",
                            name
                        )
                    })
            })
            .transpose()?;
        let expiry = args
            .expiry
            .as_deref()
            .map(str::parse::<ExpiryRange>)
            .transpose()
            .context("Invalid --expiry")?;
        if let Some(weight) = args.weight {
            if !weight.is_finite() || weight < 0.0 {
                bail!("Weight must be a non-negative number, got {}", weight);
            }
        }
        Ok(Self {
            category,
            expiry,
            weight: args.weight,
            comment: args.comment.clone(),
        })
    }

    fn apply(self, tray: &mut TrayFields) {
        if let Some(category) = self.category {
            tray.category_id = Some(category);
        }
        if let Some(expiry) = self.expiry {
            tray.expiry = Some(expiry);
        }
        if let Some(weight) = self.weight {
            tray.weight = Some(weight);
        }
        if let Some(comment) = self.comment {
            tray.comment = Some(comment);
        }
    }
}

/// Shelf and column keys, with everything below the shelf loaded.
async fn locate_column(
    tree: &mut WarehouseTree,
    shelf: &str,
    column: usize,
) -> Result<(NodeKey, NodeKey)> {
    let shelf_key = resolve_shelf(tree, shelf).await?;
    tree.load_children(shelf_key, LoadScope::Deep(Level::Tray))
        .await
        .context("Failed to load shelf")?;
    let column_key = child_at(tree, shelf_key, column, "column")?;
    Ok((shelf_key, column_key))
}

/// Put a new tray on top of a column.
pub fn add(
    ctx: &Context,
    warehouse: &str,
    shelf: &str,
    column: usize,
    args: &TrayArgs,
) -> Result<()> {
    let mut session = open_session(ctx)?;
    let blame = session.config.user();
    let rt = tokio::runtime::Runtime::new()?;

    let location = rt.block_on(async {
        let tree = open_warehouse(&mut session.registry, warehouse).await?;
        let (shelf_key, column_key) = locate_column(tree, shelf, column).await?;

        let filled = tree.children(column_key)?.len();
        if let Some(height) = tree.column(column_key)?.max_height {
            if filled >= height as usize {
                bail!("Column {} is full ({} of {} trays)", column, filled, height);
            }
        }

        let mut fields = TrayFields::empty(filled);
        ResolvedFields::resolve(tree, args)?.apply(&mut fields);
        fields.touch(&blame);
        let tray = tree.insert_child(column_key, LayerFields::Tray(fields))?;

        tree.stage(shelf_key, StageOptions::committing())
            .await
            .context("Failed to save tray")?;
        Ok::<_, anyhow::Error>(format!("{} tray {}", tree.location_name(tray)?, filled))
    })?;
    session.close(ctx);

    output::success(format!("Added {}", location), ctx.verbosity());
    Ok(())
}

/// Change a tray's contents.
pub fn edit(
    ctx: &Context,
    warehouse: &str,
    shelf: &str,
    column: usize,
    tray: usize,
    changes: &TrayEdit,
) -> Result<()> {
    let mut session = open_session(ctx)?;
    let blame = session.config.user();
    let rt = tokio::runtime::Runtime::new()?;

    let written = rt.block_on(async {
        let tree = open_warehouse(&mut session.registry, warehouse).await?;
        let (shelf_key, column_key) = locate_column(tree, shelf, column).await?;
        let tray_key = child_at(tree, column_key, tray, "tray")?;

        let resolved = ResolvedFields::resolve(tree, &changes.fields)?;
        tree.edit_tray(tray_key, &blame, |fields| {
            if changes.clear_category {
                fields.category_id = None;
            }
            if changes.clear_expiry {
                fields.expiry = None;
            }
            if changes.clear_weight {
                fields.weight = None;
            }
            if changes.clear_comment {
                fields.comment = None;
            }
            resolved.apply(fields);
        })?;

        let report = tree
            .stage(shelf_key, StageOptions::committing())
            .await
            .context("Failed to save tray")?;
        Ok::<_, anyhow::Error>(report.writes)
    })?;
    session.close(ctx);

    output::debug(format!("{} documents written", written), ctx.verbosity());
    output::success(
        format!("Updated tray {} in column {} of {}", tray, column, shelf),
        ctx.verbosity(),
    );
    Ok(())
}

/// Remove a tray; the trays above it move down one slot.
pub fn remove(
    ctx: &Context,
    warehouse: &str,
    shelf: &str,
    column: usize,
    tray: usize,
) -> Result<()> {
    let mut session = open_session(ctx)?;
    let rt = tokio::runtime::Runtime::new()?;

    let report = rt.block_on(async {
        let tree = open_warehouse(&mut session.registry, warehouse).await?;
        let (_, column_key) = locate_column(tree, shelf, column).await?;
        let tray_key = child_at(tree, column_key, tray, "tray")?;
        tree.delete(tray_key, true)
            .await
            .context("Failed to remove tray")
    })?;
    session.close(ctx);

    if let Some(commit) = report.commit {
        output::debug(
            format!("{} written, {} deleted", commit.writes, commit.deletes),
            ctx.verbosity(),
        );
    }
    output::success(
        format!("Removed tray {} from column {} of {}", tray, column, shelf),
        ctx.verbosity(),
    );
    Ok(())
}
