//! store::memory
//!
//! In-memory document store for deterministic testing and demos.
//!
//! # Design
//!
//! The memory store keeps every document in a map keyed by path and
//! records each operation it receives. Failures can be injected per
//! operation to exercise error paths in the layer model.
//!
//! # Example
//!
//! ```
//! use shelfwork::core::fields::Record;
//! use shelfwork::core::types::{DocId, DocPath};
//! use shelfwork::store::memory::MemoryStore;
//! use shelfwork::store::{DocumentStore, WriteBatch};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let path = DocPath::document("warehouses", &DocId::new("w1").unwrap());
//!
//! let mut record = Record::new();
//! record.insert("name".into(), "Sunderland".into());
//! let mut batch = WriteBatch::new();
//! batch.set(path.clone(), record.clone());
//! store.commit(batch).await.unwrap();
//!
//! assert_eq!(store.load_document(&path).await.unwrap(), Some(record));
//! # });
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::traits::{sort_documents, Document, DocumentStore, StoreError, WriteBatch, WriteOp};
use crate::core::fields::Record;
use crate::core::types::{DocId, DocPath};

/// Documents keyed by full path.
///
/// Shared by the memory and file stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Documents {
    documents: BTreeMap<String, Record>,
}

impl Documents {
    pub(crate) fn get(&self, path: &DocPath) -> Option<Record> {
        self.documents.get(path.as_str()).cloned()
    }

    /// Direct children of the collection at `path`, sorted by `order_by`.
    pub(crate) fn collection(
        &self,
        path: &DocPath,
        order_by: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let prefix = format!("{}/", path.as_str());
        let mut documents = Vec::new();
        for (key, record) in self.documents.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            if rest.contains('/') {
                continue;
            }
            let id = DocId::new(rest).map_err(|e| StoreError::Serialize(e.to_string()))?;
            documents.push(Document {
                id,
                record: record.clone(),
            });
        }
        sort_documents(&mut documents, order_by);
        Ok(documents)
    }

    /// Apply a batch in order. Either every operation lands or none does.
    pub(crate) fn apply(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut next = self.documents.clone();
        for op in batch.into_ops() {
            match op {
                WriteOp::Set { path, record } => {
                    if path.is_collection() {
                        return Err(StoreError::Rejected(format!(
                            "cannot write a collection path: {}",
                            path
                        )));
                    }
                    next.insert(path.as_str().to_string(), record);
                }
                WriteOp::Delete { path } => {
                    next.remove(path.as_str());
                }
            }
        }
        self.documents = next;
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.documents.len()
    }

    pub(crate) fn paths(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

/// Mock document store for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    documents: Documents,
    /// Failures to inject (for testing error paths).
    fail_on: Vec<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail every load_document with the given error.
    LoadDocument(StoreError),
    /// Fail every load_collection with the given error.
    LoadCollection(StoreError),
    /// Fail load_collection for one collection path only.
    LoadCollectionAt { path: DocPath, error: StoreError },
    /// Fail every commit with the given error.
    Commit(StoreError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    LoadDocument { path: DocPath },
    LoadCollection { path: DocPath, order_by: String },
    Commit { writes: usize, deletes: usize },
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a failure to inject.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on.push(fail_on);
        self
    }

    /// Add a failure to an existing (possibly shared) store.
    pub fn inject(&self, fail_on: FailOn) {
        self.lock().fail_on.push(fail_on);
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on.clear();
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.lock().operations.clear();
    }

    /// Number of commits received, failed ones included.
    pub fn commit_count(&self) -> usize {
        self.lock()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::Commit { .. }))
            .count()
    }

    /// Read a document without recording an operation.
    pub fn peek(&self, path: &DocPath) -> Option<Record> {
        self.lock().documents.get(path)
    }

    /// Number of stored documents.
    pub fn document_count(&self) -> usize {
        self.lock().documents.len()
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.lock().documents.paths().map(str::to_string).collect()
    }

    // A poisoned mutex only happens after a panic in another test thread.
    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, op: MockOperation) {
        self.lock().operations.push(op);
    }

    fn check_fail(&self, expected: &str, path: Option<&DocPath>) -> Result<(), StoreError> {
        let inner = self.lock();
        for fail in &inner.fail_on {
            match fail {
                FailOn::LoadDocument(e) if expected == "load_document" => return Err(e.clone()),
                FailOn::LoadCollection(e) if expected == "load_collection" => {
                    return Err(e.clone())
                }
                FailOn::LoadCollectionAt { path: at, error }
                    if expected == "load_collection" && Some(at) == path =>
                {
                    return Err(error.clone())
                }
                FailOn::Commit(e) if expected == "commit" => return Err(e.clone()),
                _ => {}
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load_document(&self, path: &DocPath) -> Result<Option<Record>, StoreError> {
        self.record(MockOperation::LoadDocument { path: path.clone() });
        self.check_fail("load_document", Some(path))?;
        Ok(self.lock().documents.get(path))
    }

    async fn load_collection(
        &self,
        path: &DocPath,
        order_by: &str,
    ) -> Result<Vec<Document>, StoreError> {
        self.record(MockOperation::LoadCollection {
            path: path.clone(),
            order_by: order_by.to_string(),
        });
        self.check_fail("load_collection", Some(path))?;
        self.lock().documents.collection(path, order_by)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.record(MockOperation::Commit {
            writes: batch.write_count(),
            deletes: batch.delete_count(),
        });
        self.check_fail("commit", None)?;
        self.lock().documents.apply(batch)
    }
}
