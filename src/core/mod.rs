//! core
//!
//! Core domain types, field schemas, and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: DocId, DocPath, Level, CategoryId
//! - [`expiry`] - Expiry ranges and calendar arithmetic
//! - [`fields`] - Persisted field records for each layer
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Nothing in `core` performs I/O against the document store

pub mod config;
pub mod expiry;
pub mod fields;
pub mod types;
