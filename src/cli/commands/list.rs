//! list command - List warehouses in the store

use anyhow::{Context as _, Result};

use super::open_session;
use crate::cli::Context;
use crate::ui::output;

/// List every warehouse by name. With `--quiet`, print ids only.
pub fn list(ctx: &Context) -> Result<()> {
    let mut session = open_session(ctx)?;
    let rt = tokio::runtime::Runtime::new()?;
    let warehouses = rt
        .block_on(session.registry.load_warehouses())
        .context("Failed to list warehouses")?
        .to_vec();

    if ctx.quiet {
        for warehouse in &warehouses {
            println!("{}", warehouse.id);
        }
        return Ok(());
    }

    if warehouses.is_empty() {
        output::print(
            "No warehouses yet. Run 'sw init <name>' to create one.",
            ctx.verbosity(),
        );
        return Ok(());
    }
    let lines: Vec<String> = warehouses
        .iter()
        .map(|w| format!("{}  {}", w.name, w.id))
        .collect();
    output::print(output::format_list(&lines, ""), ctx.verbosity());
    Ok(())
}
