//! model::stage
//!
//! Staging/commit engine.
//!
//! # Pending Batch
//!
//! Each tree owns one pending [`WriteBatch`]. [`stage`](WarehouseTree::stage)
//! and [`delete`](WarehouseTree::delete) append to it and record how to undo
//! their in-memory effects; [`commit`](WarehouseTree::commit) flushes it as
//! one atomic unit.
//!
//! # Rollback
//!
//! Snapshot resets are optimistic. If the store rejects the batch, every
//! recorded effect is undone in reverse order: persisted snapshots are put
//! back (so the nodes read dirty again), indices and derived location
//! names restored, and detached subtrees re-attached where they were.
//! After a successful commit detached subtrees are purged from the arena.

use std::sync::Arc;

use tracing::{debug, warn};

use super::load::LoadScope;
use super::node::{Children, NodeKey};
use super::tree::WarehouseTree;
use super::ModelError;
use crate::core::fields::LayerFields;
use crate::core::types::Level;
use crate::store::WriteBatch;

/// Options for [`WarehouseTree::stage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageOptions {
    /// Write every visited node, dirty or not.
    pub force: bool,
    /// Flush the pending batch once staged.
    pub commit: bool,
    /// Lowest level visited.
    pub min_level: Level,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            force: false,
            commit: false,
            min_level: Level::Tray,
        }
    }
}

impl StageOptions {
    /// Stage the whole loaded subtree and commit.
    pub fn committing() -> Self {
        Self {
            commit: true,
            ..Self::default()
        }
    }
}

/// Outcome of a stage call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Writes this call added to the pending batch.
    pub writes: usize,
    /// Present when the call also committed.
    pub commit: Option<CommitReport>,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub writes: usize,
    pub deletes: usize,
}

#[derive(Debug)]
enum Undo {
    Snapshot {
        key: NodeKey,
        previous: Option<LayerFields>,
    },
    Index {
        key: NodeKey,
        previous: usize,
    },
    Location {
        key: NodeKey,
        previous: String,
    },
    Detach {
        parent: NodeKey,
        position: usize,
        key: NodeKey,
    },
}

/// Writes awaiting commit, with the undo log for their local effects.
#[derive(Debug, Default)]
pub(crate) struct PendingBatch {
    batch: WriteBatch,
    undo: Vec<Undo>,
}

impl PendingBatch {
    pub(crate) fn len(&self) -> usize {
        self.batch.len()
    }
}

/// Undo log of a batch handed to the store.
///
/// If the commit future is dropped before the store answers, the log is
/// replayed on drop so the tree never reads as persisted for writes that
/// may not have landed.
struct InFlight<'a> {
    tree: &'a mut WarehouseTree,
    undo: Option<Vec<Undo>>,
}

impl InFlight<'_> {
    /// The store answered; hand the log back for settling.
    fn settle(mut self) -> Vec<Undo> {
        self.undo.take().unwrap_or_default()
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            warn!("commit abandoned before the store answered, restoring local state");
            self.tree.rollback(undo);
        }
    }
}

impl WarehouseTree {
    /// Stage `key` and its loaded descendants down to `options.min_level`.
    ///
    /// Walks top-down. Each loaded child list is renumbered densely, tray
    /// location names are refreshed, and every dirty (or, with `force`,
    /// every) visited node is queued for writing. Nodes whose own fields
    /// were never loaded are skipped.
    ///
    /// # Errors
    ///
    /// `StageConflict` if committing and the store rejects the batch. The
    /// local state is then exactly as before the call.
    pub async fn stage(
        &mut self,
        key: NodeKey,
        options: StageOptions,
    ) -> Result<StageReport, ModelError> {
        let writes = self.enqueue_writes(key, options)?;
        debug!(
            node = %self.id(key)?,
            writes,
            pending = self.pending.len(),
            "staged"
        );
        let commit = if options.commit {
            Some(self.commit().await?)
        } else {
            None
        };
        Ok(StageReport { writes, commit })
    }

    fn enqueue_writes(&mut self, key: NodeKey, options: StageOptions) -> Result<usize, ModelError> {
        let mut writes = 0;
        let mut stack = vec![key];

        while let Some(current) = stack.pop() {
            let children: Vec<NodeKey> = match &self.node(current)?.children {
                Children::Loaded(children) => children
                    .iter()
                    .copied()
                    .filter(|&c| self.level(c).is_ok_and(|l| l >= options.min_level))
                    .collect(),
                Children::Unloaded => Vec::new(),
            };

            for (position, &child) in children.iter().enumerate() {
                let fields = self.fields_mut(child)?;
                let previous = fields.index();
                if previous != position {
                    fields.set_index(position);
                    self.pending.undo.push(Undo::Index {
                        key: child,
                        previous,
                    });
                }
            }

            if self.level(current)? == Level::Tray {
                let location = self.location_name(current)?;
                let tray = self.tray_mut(current)?;
                if tray.location_name != location {
                    let previous = std::mem::replace(&mut tray.location_name, location);
                    self.pending.undo.push(Undo::Location {
                        key: current,
                        previous,
                    });
                }
            }

            let node = self.node(current)?;
            if node.entity.is_loaded() && (options.force || node.entity.is_dirty()) {
                let path = self.path(current)?;
                let record = node
                    .entity
                    .fields()
                    .to_record()
                    .map_err(|source| ModelError::Encode {
                        path: path.clone(),
                        source,
                    })?;
                let previous = self.node_mut(current)?.entity.mark_persisted();
                self.pending.batch.set(path, record);
                self.pending.undo.push(Undo::Snapshot {
                    key: current,
                    previous,
                });
                writes += 1;
            }

            stack.extend(children.into_iter().rev());
        }
        Ok(writes)
    }

    /// Remove `key` and its whole stored subtree.
    ///
    /// The subtree is loaded to the bottom first so every descendant path
    /// is known, then deletes for all of them are queued and the node is
    /// detached from its parent. With `commit`, the parent's remaining
    /// children are renumbered and everything pending is committed.
    ///
    /// # Errors
    ///
    /// - `InvalidState` for the warehouse itself; use [`destroy`](Self::destroy)
    /// - load errors while discovering the subtree (nothing is queued)
    /// - `StageConflict` if committing fails; the node is re-attached
    pub async fn delete(&mut self, key: NodeKey, commit: bool) -> Result<StageReport, ModelError> {
        let level = self.level(key)?;
        if level.is_top() {
            return Err(ModelError::InvalidState(
                "a warehouse cannot be deleted from its own tree".into(),
            ));
        }

        self.load_children(key, LoadScope::Deep(Level::Tray)).await?;
        let paths = self
            .subtree(key)
            .into_iter()
            .map(|k| self.path(k))
            .collect::<Result<Vec<_>, _>>()?;

        let (parent, position) = self.detach(key)?;
        debug!(node = %self.id(key)?, documents = paths.len(), "queued delete");
        for path in paths {
            self.pending.batch.delete(path);
        }
        self.pending.undo.push(Undo::Detach {
            parent,
            position,
            key,
        });

        if !commit {
            return Ok(StageReport::default());
        }
        self.stage(
            parent,
            StageOptions {
                force: false,
                commit: true,
                min_level: level,
            },
        )
        .await
    }

    /// Flush the pending batch as one atomic unit.
    ///
    /// An empty batch is not sent.
    ///
    /// # Errors
    ///
    /// `StageConflict` when the store rejects the batch; every local effect
    /// of the batch is rolled back first. The same rollback runs if the
    /// returned future is dropped before the store answers.
    pub async fn commit(&mut self) -> Result<CommitReport, ModelError> {
        let PendingBatch { batch, undo } = std::mem::take(&mut self.pending);
        if batch.is_empty() {
            return Ok(CommitReport::default());
        }
        let report = CommitReport {
            writes: batch.write_count(),
            deletes: batch.delete_count(),
        };

        debug!(
            writes = report.writes,
            deletes = report.deletes,
            store = self.store.name(),
            "committing"
        );
        let store = Arc::clone(&self.store);
        let in_flight = InFlight {
            tree: &mut *self,
            undo: Some(undo),
        };
        let result = store.commit(batch).await;
        let undo = in_flight.settle();
        match result {
            Ok(()) => {
                for entry in undo {
                    if let Undo::Detach { key, .. } = entry {
                        self.purge_subtree(key);
                    }
                }
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "commit rejected, restoring local state");
                self.rollback(undo);
                Err(ModelError::StageConflict(e))
            }
        }
    }

    /// Drop everything pending and undo its local effects.
    pub fn discard_pending(&mut self) {
        let PendingBatch { undo, .. } = std::mem::take(&mut self.pending);
        self.rollback(undo);
    }

    fn rollback(&mut self, undo: Vec<Undo>) {
        for entry in undo.into_iter().rev() {
            match entry {
                Undo::Snapshot { key, previous } => {
                    if let Some(node) = self.nodes.get_mut(key) {
                        node.entity.restore_persisted(previous);
                    }
                }
                Undo::Index { key, previous } => {
                    if let Some(node) = self.nodes.get_mut(key) {
                        node.entity.fields_mut().set_index(previous);
                    }
                }
                Undo::Location { key, previous } => {
                    if let Some(node) = self.nodes.get_mut(key) {
                        if let LayerFields::Tray(tray) = node.entity.fields_mut() {
                            tray.location_name = previous;
                        }
                    }
                }
                Undo::Detach {
                    parent,
                    position,
                    key,
                } => self.reattach(parent, position, key),
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.batch.is_empty()
    }

    /// Number of writes and deletes awaiting commit.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Delete the warehouse and everything under it from the store.
    ///
    /// Pending work is discarded. On success the tree holds only the root.
    pub async fn destroy(&mut self) -> Result<CommitReport, ModelError> {
        self.discard_pending();
        let root = self.root;
        self.load_children(root, LoadScope::Deep(Level::Tray)).await?;

        let mut batch = WriteBatch::new();
        for key in self.subtree(root) {
            batch.delete(self.path(key)?);
        }
        let report = CommitReport {
            writes: 0,
            deletes: batch.len(),
        };
        self.store
            .commit(batch)
            .await
            .map_err(ModelError::StageConflict)?;

        let children = std::mem::replace(
            &mut self.node_mut(root)?.children,
            Children::Loaded(Vec::new()),
        );
        for child in children.as_slice().unwrap_or_default().to_vec() {
            self.purge_subtree(child);
        }
        debug!(deletes = report.deletes, "destroyed warehouse");
        Ok(report)
    }
}
