//! Shelfwork - warehouse storage hierarchy manager
//!
//! Shelfwork models a warehouse as a six-level hierarchy (warehouse, zone,
//! bay, shelf, column, tray) stored as nested documents. Levels are loaded
//! lazily, edits are tracked per node and staged into atomic batches, and a
//! shelf can be shown as a padded grid of trays and empty spaces with
//! click and long-press range selection.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, drives the model)
//! - [`model`] - Layer tree, partial loading, staging and the warehouse registry
//! - [`view`] - Padded shelf grids, the selection map and the selection gesture
//! - [`store`] - Document store abstraction with in-memory and JSON-file backends
//! - [`core`] - Domain types, per-level fields, expiry ranges and configuration
//! - [`ui`] - User-facing output
//!
//! # Correctness Invariants
//!
//! Shelfwork maintains the following invariants:
//!
//! 1. Sibling indices are dense (0..n) in every committed batch
//! 2. A commit applies all of its writes and deletes or none of them
//! 3. A failed commit leaves the in-memory tree as it was before staging
//! 4. Staging never writes a node whose fields were never loaded

pub mod cli;
pub mod core;
pub mod model;
pub mod store;
pub mod ui;
pub mod view;
