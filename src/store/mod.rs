//! store
//!
//! Boundary with the remote document store.
//!
//! # Architecture
//!
//! The layer model never talks to storage directly; it consumes the
//! [`DocumentStore`] trait. Paths are hierarchical and slash-joined, one
//! `collection/id` pair per layer:
//! `warehouses/{id}/zones/{id}/bays/{id}/shelves/{id}/columns/{id}/trays/{id}`.
//!
//! # Modules
//!
//! - `traits`: `DocumentStore`, `WriteBatch`, `StoreError`
//! - [`memory`]: In-memory store with failure injection for tests
//! - [`file`]: JSON-file store with locked, atomic commits
//! - [`lock`]: Exclusive lock used by the file store

pub mod file;
pub mod lock;
pub mod memory;
mod traits;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::*;
