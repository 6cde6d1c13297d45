//! store::traits
//!
//! Document store trait and the write batch it commits.
//!
//! # Design
//!
//! The `DocumentStore` trait is async because every store operation may
//! involve I/O. Writes are never applied one at a time: callers buffer
//! `set`/`delete` operations into a [`WriteBatch`] and hand the whole batch
//! to [`DocumentStore::commit`], which applies it atomically or not at all.
//!
//! # Example
//!
//! ```ignore
//! use shelfwork::store::{DocumentStore, WriteBatch};
//!
//! async fn rename(store: &dyn DocumentStore, path: &DocPath) -> Result<(), StoreError> {
//!     let mut record = store.load_document(path).await?.unwrap_or_default();
//!     record.insert("name".into(), "Sunderland".into());
//!
//!     let mut batch = WriteBatch::new();
//!     batch.set(path.clone(), record);
//!     store.commit(batch).await
//! }
//! ```

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::core::fields::Record;
use crate::core::types::{DocId, DocPath};

/// Errors from document store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The caller is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The store refused the batch.
    #[error("batch rejected: {0}")]
    Rejected(String),

    /// Local I/O failed.
    #[error("store i/o error: {0}")]
    Io(String),

    /// Stored data could not be (de)serialized.
    #[error("store serialization error: {0}")]
    Serialize(String),

    /// Another process holds the store lock.
    #[error("store is locked by another process")]
    Locked,
}

/// A document returned from a collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub record: Record,
}

/// A single buffered write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Replace the document at `path` with `record`.
    Set { path: DocPath, record: Record },
    /// Remove the document at `path`.
    Delete { path: DocPath },
}

impl WriteOp {
    pub fn path(&self) -> &DocPath {
        match self {
            WriteOp::Set { path, .. } | WriteOp::Delete { path } => path,
        }
    }
}

/// An ordered, atomic batch of writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a full-document write.
    pub fn set(&mut self, path: DocPath, record: Record) {
        self.ops.push(WriteOp::Set { path, record });
    }

    /// Buffer a document removal.
    pub fn delete(&mut self, path: DocPath) {
        self.ops.push(WriteOp::Delete { path });
    }

    /// Append every operation of `other`, preserving order.
    pub fn extend(&mut self, other: WriteBatch) {
        self.ops.extend(other.ops);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Number of `Set` operations.
    pub fn write_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, WriteOp::Set { .. }))
            .count()
    }

    /// Number of `Delete` operations.
    pub fn delete_count(&self) -> usize {
        self.len() - self.write_count()
    }
}

/// The document store consumed by the layer model.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a store can be shared behind
/// an `Arc` by every tree of a session.
///
/// # Error Handling
///
/// - `Unavailable` / `Io`: transport failure, safe to retry
/// - `PermissionDenied` / `Rejected`: the batch will not succeed as-is
/// - `Locked`: another writer is active; retry later
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store name for diagnostics (e.g., "memory", "file").
    fn name(&self) -> &'static str;

    /// Load a single document's fields.
    ///
    /// Returns `Ok(None)` if nothing is stored at `path`.
    async fn load_document(&self, path: &DocPath) -> Result<Option<Record>, StoreError>;

    /// Load every document directly inside the collection at `path`,
    /// sorted ascending by the field named `order_by`.
    async fn load_collection(
        &self,
        path: &DocPath,
        order_by: &str,
    ) -> Result<Vec<Document>, StoreError>;

    /// Apply `batch` atomically.
    ///
    /// # Errors
    ///
    /// On any error no operation of the batch has been applied.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// Sort documents ascending by a field, the way collection queries order.
///
/// Missing and `null` values sort first, then booleans, numbers, and
/// strings. Ties keep document id order so results are deterministic.
pub(crate) fn sort_documents(documents: &mut [Document], order_by: &str) {
    documents.sort_by(|a, b| {
        compare_values(a.record.get(order_by), b.record.get(order_by))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        let mut record = Record::new();
        record.insert("index".into(), value);
        Document {
            id: DocId::new(id).unwrap(),
            record,
        }
    }

    #[test]
    fn batch_counts() {
        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());
        batch.set(DocPath::collection("a"), Record::new());
        batch.delete(DocPath::collection("b"));
        batch.delete(DocPath::collection("c"));
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.write_count(), 1);
        assert_eq!(batch.delete_count(), 2);
        assert_eq!(batch.ops()[1].path().as_str(), "b");
    }

    #[test]
    fn batch_extend_preserves_order() {
        let mut first = WriteBatch::new();
        first.delete(DocPath::collection("x"));
        let mut second = WriteBatch::new();
        second.set(DocPath::collection("y"), Record::new());
        first.extend(second);
        let paths: Vec<_> = first.ops().iter().map(|op| op.path().as_str()).collect();
        assert_eq!(paths, vec!["x", "y"]);
    }

    #[test]
    fn sorts_numbers_numerically() {
        let mut docs = vec![doc("a", json!(10)), doc("b", json!(2)), doc("c", json!(0))];
        sort_documents(&mut docs, "index");
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn missing_values_sort_first_and_ties_use_id() {
        let mut docs = vec![
            doc("b", json!(1)),
            doc("z", Value::Null),
            doc("a", json!(1)),
        ];
        sort_documents(&mut docs, "index");
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "b"]);
    }

    #[test]
    fn store_error_display() {
        assert_eq!(
            StoreError::Rejected("quota".into()).to_string(),
            "batch rejected: quota"
        );
        assert_eq!(
            StoreError::Locked.to_string(),
            "store is locked by another process"
        );
    }
}
