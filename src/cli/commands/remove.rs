//! remove command - Delete a warehouse and everything in it

use anyhow::{Context as _, Result};

use super::{open_session, resolve_warehouse};
use crate::cli::Context;
use crate::ui::output;

/// Delete the warehouse named `warehouse` in one commit.
pub fn remove(ctx: &Context, warehouse: &str) -> Result<()> {
    let mut session = open_session(ctx)?;
    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async {
        let id = resolve_warehouse(&mut session.registry, warehouse).await?;
        session
            .registry
            .remove_warehouse(&id)
            .await
            .with_context(|| format!("Failed to remove warehouse '{}'", warehouse))
    })?;

    output::success(
        format!(
            "Removed warehouse '{}' ({} documents deleted)",
            warehouse, report.deletes
        ),
        ctx.verbosity(),
    );
    Ok(())
}
