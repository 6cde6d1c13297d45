//! search command - Find trays by category, weight or comment

use std::collections::BTreeSet;

use anyhow::{anyhow, bail, Context as _, Result};

use super::{describe, open_session, open_warehouse};
use crate::cli::args::{SearchArgs, SortArg};
use crate::cli::Context;
use crate::core::types::Level;
use crate::model::{CategoryFilter, LoadScope, SearchQuery, SortKey, WarehouseTree, WeightFilter};
use crate::ui::output;

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::None => SortKey::None,
            SortArg::Expiry => SortKey::Expiry,
            SortArg::Category => SortKey::Category,
            SortArg::Weight => SortKey::Weight,
            SortArg::Location => SortKey::Location,
        }
    }
}

/// Turn command-line filters into a query, resolving category names.
fn build_query(tree: &WarehouseTree, args: &SearchArgs) -> Result<SearchQuery> {
    let categories = if args.any_category {
        CategoryFilter::Set
    } else if args.no_category {
        CategoryFilter::Unset
    } else if args.categories.is_empty() {
        CategoryFilter::Any
    } else {
        let ids = args
            .categories
            .iter()
            .map(|name| {
                tree.category_by_name(name)
                    .map(|c| c.id.clone())
                    .ok_or_else(|| anyhow!("No category named '{}'", name))
            })
            .collect::<Result<BTreeSet<_>>>()?;
        CategoryFilter::OneOf(ids)
    };

    let weight = if args.any_weight {
        WeightFilter::Set
    } else if args.no_weight {
        WeightFilter::Unset
    } else if args.min_weight.is_some() || args.max_weight.is_some() {
        let from = args.min_weight.unwrap_or(0.0);
        let to = args.max_weight.unwrap_or(f64::INFINITY);
        if from.is_nan() || to.is_nan() || from > to {
            bail!("Weight range {} to {} is empty", from, to);
        }
        WeightFilter::Between { from, to }
    } else {
        WeightFilter::Any
    };

    Ok(SearchQuery {
        categories,
        weight,
        comment: args.comment.clone().filter(|c| !c.trim().is_empty()),
        exclude_picking_area: !args.include_picking,
        sort: args.sort.into(),
        ascending: !args.desc,
    })
}

/// Load every tray of `warehouse` and print those matching `args`.
///
/// With `--quiet`, prints one location code per match.
pub fn search(ctx: &Context, warehouse: &str, args: &SearchArgs) -> Result<()> {
    let mut session = open_session(ctx)?;
    let rt = tokio::runtime::Runtime::new()?;

    let lines = rt.block_on(async {
        let tree = open_warehouse(&mut session.registry, warehouse).await?;
        let root = tree.root();
        tree.load_children(root, LoadScope::Deep(Level::Tray))
            .await
            .context("Failed to load trays")?;

        let tree: &WarehouseTree = tree;
        let query = build_query(tree, args)?;
        output::debug(format!("{:?}", query), ctx.verbosity());
        let found = tree.search(&query)?;
        found
            .into_iter()
            .map(|key| {
                if ctx.quiet {
                    Ok(tree.location_code(key)?)
                } else {
                    describe(tree, key)
                }
            })
            .collect::<Result<Vec<_>>>()
    })?;

    if ctx.quiet {
        for line in &lines {
            println!("{}", line);
        }
        return Ok(());
    }
    if lines.is_empty() {
        output::print("No trays match this search.", ctx.verbosity());
        return Ok(());
    }
    output::print(output::format_list(&lines, ""), ctx.verbosity());
    let noun = if lines.len() == 1 { "tray" } else { "trays" };
    output::print(format!("{} {} found", lines.len(), noun), ctx.verbosity());
    Ok(())
}
