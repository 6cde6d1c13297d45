//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Opens a session on the configured store
//! 3. Drives the model (and, for `grid`, the view) layer
//! 4. Formats and displays output
//!
//! # Async Commands
//!
//! Store access is async. Handlers are synchronous and create a
//! `tokio::runtime::Runtime` to run their async part with `block_on`.

mod category;
mod config_cmd;
mod grid;
mod init;
mod list;
mod remove;
mod search;
mod tray;
mod tree;

pub use category::{add as category_add, list as category_list, rename as category_rename};
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use grid::grid;
pub use init::init;
pub use list::list;
pub use remove::remove;
pub use search::search;
pub use tray::{add as tray_add, edit as tray_edit, remove as tray_remove, TrayEdit};
pub use tree::tree;

use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};

use crate::cli::args::{CategoryAction, Command, ConfigAction, TrayAction};
use crate::cli::Context;
use crate::core::config::Config;
use crate::core::fields::LayerFields;
use crate::core::types::DocId;
use crate::model::registry::SessionSettings;
use crate::model::{LoadScope, NodeKey, WarehouseRegistry, WarehouseTree};
use crate::store::{DocumentStore, FileStore};
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { name, demo, seed } => init::init(ctx, &name, demo, seed),
        Command::List => list::list(ctx),
        Command::Remove { warehouse } => remove::remove(ctx, &warehouse),
        Command::Tree { warehouse, depth } => tree::tree(ctx, &warehouse, depth),
        Command::Search { warehouse, query } => search::search(ctx, &warehouse, &query),
        Command::Grid {
            warehouse,
            shelf,
            range,
            click,
        } => grid::grid(ctx, &warehouse, &shelf, range.as_deref(), &click),
        Command::Category { action } => match action {
            CategoryAction::List { warehouse } => category::list(ctx, &warehouse),
            CategoryAction::Add {
                warehouse,
                name,
                short_name,
                group,
                default_expiry,
            } => category::add(
                ctx,
                &warehouse,
                &name,
                short_name,
                group,
                default_expiry.as_deref(),
            ),
            CategoryAction::Rename {
                warehouse,
                from,
                to,
            } => category::rename(ctx, &warehouse, &from, &to),
        },
        Command::Tray { action } => match action {
            TrayAction::Add {
                warehouse,
                shelf,
                column,
                fields,
            } => tray::add(ctx, &warehouse, &shelf, column, &fields),
            TrayAction::Edit {
                warehouse,
                shelf,
                column,
                tray,
                fields,
                clear_category,
                clear_expiry,
                clear_weight,
                clear_comment,
            } => tray::edit(
                ctx,
                &warehouse,
                &shelf,
                column,
                tray,
                &TrayEdit {
                    fields,
                    clear_category,
                    clear_expiry,
                    clear_weight,
                    clear_comment,
                },
            ),
            TrayAction::Remove {
                warehouse,
                shelf,
                column,
                tray,
            } => tray::remove(ctx, &warehouse, &shelf, column, tray),
        },
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
            ConfigAction::List => config_cmd::list(ctx),
        },
    }
}

/// Configuration plus a registry over the store it names.
pub(crate) struct Session {
    pub config: Config,
    pub registry: WarehouseRegistry,
}

impl Session {
    /// Sign out, warning about any warehouse left with uncommitted work.
    pub fn close(self, ctx: &Context) {
        let report = self.registry.sign_out();
        for lost in &report.uncommitted {
            output::warn(
                format!(
                    "warehouse {}: {} staged and {} unstaged change(s) discarded",
                    lost.warehouse, lost.pending, lost.dirty
                ),
                ctx.verbosity(),
            );
        }
        output::debug(format!("closed {} warehouse(s)", report.closed), ctx.verbosity());
    }
}

/// Load configuration and open the store.
///
/// `--store` wins over `store.path`. The store's directory is created so
/// the first commit can write the file.
pub(crate) fn open_session(ctx: &Context) -> Result<Session> {
    let config = Config::load().context("Failed to load config")?;
    let path = match &ctx.store {
        Some(path) => path.clone(),
        None => config.store_path().context("Failed to locate store")?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    output::debug(format!("store: {}", path.display()), ctx.verbosity());

    let store: Arc<dyn DocumentStore> = Arc::new(FileStore::new(path));
    let settings = SessionSettings {
        open_depth: config.open_depth(),
        user: config.user(),
    };
    Ok(Session {
        config,
        registry: WarehouseRegistry::new(store, settings),
    })
}

/// Resolve a warehouse id or name against the store's listing.
pub(crate) async fn resolve_warehouse(
    registry: &mut WarehouseRegistry,
    id_or_name: &str,
) -> Result<DocId> {
    registry
        .load_warehouses()
        .await
        .context("Failed to list warehouses")?;
    registry
        .find(id_or_name)
        .map(|w| w.id.clone())
        .ok_or_else(|| {
            anyhow!(
                "No warehouse '{}'. Run 'sw list' to see warehouses.",
                id_or_name
            )
        })
}

/// Resolve and open a warehouse in one step.
pub(crate) async fn open_warehouse<'a>(
    registry: &'a mut WarehouseRegistry,
    id_or_name: &str,
) -> Result<&'a mut WarehouseTree> {
    let id = resolve_warehouse(registry, id_or_name).await?;
    registry
        .open(&id)
        .await
        .with_context(|| format!("Failed to open warehouse '{}'", id_or_name))
}

/// Find a shelf by its `ZONE/BAY/SHELF` path, loading levels as needed.
pub(crate) async fn resolve_shelf(tree: &mut WarehouseTree, shelf: &str) -> Result<NodeKey> {
    let parts: Vec<&str> = shelf.split('/').map(str::trim).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        bail!("Shelf must be given as ZONE/BAY/SHELF, got '{}'", shelf);
    }

    let mut key = tree.root();
    for part in parts {
        if !tree.node(key)?.children.is_loaded() {
            tree.load_children(key, LoadScope::Flat).await?;
        }
        key = tree.find_child(key, part)?.ok_or_else(|| {
            anyhow!(
                "No '{}' under {}",
                part,
                tree.fields(key)
                    .ok()
                    .and_then(LayerFields::name)
                    .unwrap_or("this location")
            )
        })?;
    }
    Ok(key)
}

/// Child of `parent` at `position`, with a readable error when missing.
pub(crate) fn child_at(
    tree: &WarehouseTree,
    parent: NodeKey,
    position: usize,
    what: &str,
) -> Result<NodeKey> {
    tree.child_at(parent, position)?.ok_or_else(|| {
        let count = tree.children(parent).map(<[_]>::len).unwrap_or(0);
        anyhow!(
            "No {} {} here ({} available)",
            what,
            position,
            count
        )
    })
}

/// One-line description of a node for listings.
pub(crate) fn describe(tree: &WarehouseTree, key: NodeKey) -> Result<String> {
    let label = match tree.fields(key)? {
        LayerFields::Warehouse(w) => w.name.clone(),
        LayerFields::Zone(z) => format!("{} ({})", z.name, z.color),
        LayerFields::Bay(b) => format!("Bay {}", b.name),
        LayerFields::Shelf(s) if s.is_picking_area => format!("Shelf {} [picking]", s.name),
        LayerFields::Shelf(s) => format!("Shelf {}", s.name),
        LayerFields::Column(c) => {
            let size = c.size.as_ref().map(|s| s.label.as_str()).unwrap_or("-");
            let filled = tree
                .children(key)
                .map(|t| t.len().to_string())
                .unwrap_or_else(|_| "?".to_string());
            let height = c
                .max_height
                .map(|h| h.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!("Column {}  {}  {}/{}", c.index, size, filled, height)
        }
        LayerFields::Tray(t) => {
            let category = tree
                .category_of(key)?
                .map(|c| c.name.as_str())
                .unwrap_or("(empty)");
            let mut line = format!("Tray {}  {}  {}", t.index, t.location_name, category);
            if let Some(expiry) = &t.expiry {
                line.push_str(&format!("  {}", expiry));
            }
            if let Some(weight) = t.weight {
                line.push_str(&format!("  {}kg", weight));
            }
            if let Some(comment) = &t.comment {
                line.push_str(&format!("  \"{}\"", comment));
            }
            line
        }
    };
    Ok(label)
}
