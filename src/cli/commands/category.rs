//! category command - List, add and rename warehouse categories

use anyhow::{anyhow, Context as _, Result};

use super::{open_session, open_warehouse};
use crate::cli::Context;
use crate::core::expiry::ExpiryRange;
use crate::core::fields::Category;
use crate::model::StageOptions;
use crate::ui::output;

/// List the warehouse's categories in catalogue order.
pub fn list(ctx: &Context, warehouse: &str) -> Result<()> {
    let mut session = open_session(ctx)?;
    let rt = tokio::runtime::Runtime::new()?;
    let categories = rt.block_on(async {
        let tree = open_warehouse(&mut session.registry, warehouse).await?;
        Ok::<_, anyhow::Error>(tree.warehouse()?.categories.clone())
    })?;

    if categories.is_empty() {
        output::print("No categories.", ctx.verbosity());
        return Ok(());
    }
    let lines: Vec<String> = categories
        .iter()
        .map(|c| {
            let mut line = c.name.clone();
            if let Some(short) = &c.short_name {
                line.push_str(&format!(" [{}]", short));
            }
            if let Some(group) = &c.group {
                line.push_str(&format!("  group: {}", group));
            }
            if let Some(expiry) = &c.default_expiry {
                line.push_str(&format!("  expiry: {}", expiry));
            }
            line
        })
        .collect();
    output::print(output::format_list(&lines, "- "), ctx.verbosity());
    Ok(())
}

/// Add a category and commit the warehouse document.
pub fn add(
    ctx: &Context,
    warehouse: &str,
    name: &str,
    short_name: Option<String>,
    group: Option<String>,
    default_expiry: Option<&str>,
) -> Result<()> {
    let default_expiry = default_expiry
        .map(str::parse::<ExpiryRange>)
        .transpose()
        .context("Invalid --default-expiry")?;
    let category = Category {
        short_name,
        group,
        default_expiry,
        ..Category::new(name.trim())
    };

    let mut session = open_session(ctx)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let tree = open_warehouse(&mut session.registry, warehouse).await?;
        tree.add_category(category)?;
        let root = tree.root();
        tree.stage(root, StageOptions::committing())
            .await
            .context("Failed to save category")?;
        Ok::<_, anyhow::Error>(())
    })?;
    session.close(ctx);

    output::success(format!("Added category '{}'", name.trim()), ctx.verbosity());
    Ok(())
}

/// Rename a category. Trays keep their reference to it.
pub fn rename(ctx: &Context, warehouse: &str, from: &str, to: &str) -> Result<()> {
    let mut session = open_session(ctx)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let tree = open_warehouse(&mut session.registry, warehouse).await?;
        let id = tree
            .category_by_name(from)
            .map(|c| c.id.clone())
            .ok_or_else(|| anyhow!("No category named '{}'", from))?;
        tree.rename_category(&id, to.trim())?;
        let root = tree.root();
        tree.stage(root, StageOptions::committing())
            .await
            .context("Failed to save category")?;
        Ok::<_, anyhow::Error>(())
    })?;
    session.close(ctx);

    output::success(
        format!("Renamed category '{}' to '{}'", from, to.trim()),
        ctx.verbosity(),
    );
    Ok(())
}
