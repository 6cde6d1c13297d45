//! init command - Create a warehouse, optionally with a demo layout

use anyhow::{bail, Context as _, Result};

use super::{open_session, Session};
use crate::cli::Context;
use crate::model::demo::populate_demo;
use crate::model::StageOptions;
use crate::ui::output;

const DEFAULT_DEMO_SEED: u64 = 1;

/// Create a warehouse named `name` and commit it.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `name` - Warehouse name, unique in the store
/// * `demo` - Fill it with the generated demo layout
/// * `seed` - Seed for demo tray contents
pub fn init(ctx: &Context, name: &str, demo: bool, seed: Option<u64>) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Warehouse name cannot be empty");
    }
    let session = open_session(ctx)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(init_impl(
        ctx,
        session,
        name,
        demo.then(|| seed.unwrap_or(DEFAULT_DEMO_SEED)),
    ))
}

async fn init_impl(
    ctx: &Context,
    mut session: Session,
    name: &str,
    demo_seed: Option<u64>,
) -> Result<()> {
    let verbosity = ctx.verbosity();
    let registry = &mut session.registry;
    registry
        .load_warehouses()
        .await
        .context("Failed to list warehouses")?;
    if registry
        .warehouses()
        .iter()
        .any(|w| w.name.eq_ignore_ascii_case(name))
    {
        bail!("A warehouse named '{}' already exists", name);
    }

    let id = registry
        .create_warehouse(name, demo_seed.is_none())
        .await
        .context("Failed to create warehouse")?;

    if let Some(seed) = demo_seed {
        let tree = registry
            .get_mut(&id)
            .context("New warehouse is not open")?;
        let summary = populate_demo(tree, seed)?;
        let root = tree.root();
        let report = tree
            .stage(root, StageOptions::committing())
            .await
            .context("Failed to save demo layout")?;
        output::debug(format!("staged {} documents", report.writes), verbosity);
        output::print(
            format!(
                "Demo layout: {} zones, {} bays, {} shelves, {} columns, {} trays",
                summary.zones, summary.bays, summary.shelves, summary.columns, summary.trays
            ),
            verbosity,
        );
    }

    if ctx.quiet {
        println!("{}", id);
    } else {
        output::success(format!("Created warehouse '{}' ({})", name, id), verbosity);
    }
    session.close(ctx);
    Ok(())
}
