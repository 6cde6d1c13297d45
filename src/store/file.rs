//! store::file
//!
//! Document store persisted as a single JSON file.
//!
//! # Storage
//!
//! ```json
//! { "version": 1, "documents": { "warehouses/w1": { "name": "..." } } }
//! ```
//!
//! # Commit Semantics
//!
//! A commit acquires the [`StoreLock`], re-reads the file, applies the
//! batch to the in-memory copy, and replaces the file atomically (write to
//! a temp file, then rename). If any step fails the file is unchanged.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::lock::{LockError, StoreLock};
use super::memory::Documents;
use super::traits::{Document, DocumentStore, StoreError, WriteBatch};
use crate::core::fields::Record;
use crate::core::types::DocPath;

/// Current on-disk format version.
pub const FILE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(flatten)]
    documents: Documents,
}

/// JSON-file document store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open a store at `path`. The file is created on first commit.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Documents, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Documents::default()),
            Err(e) => return Err(io_error(&self.path, e)),
        };
        parse(&self.path, &contents)
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {}", path.display(), e))
}

fn parse(path: &Path, contents: &str) -> Result<Documents, StoreError> {
    let file: StoreFile = serde_json::from_str(contents)
        .map_err(|e| StoreError::Serialize(format!("{}: {}", path.display(), e)))?;
    if file.version != FILE_FORMAT_VERSION {
        return Err(StoreError::Serialize(format!(
            "{}: unsupported store version {}",
            path.display(),
            file.version
        )));
    }
    Ok(file.documents)
}

/// Blocking commit: lock, re-read, apply, atomic replace.
fn commit_blocking(path: &Path, batch: WriteBatch) -> Result<(), StoreError> {
    let _lock = StoreLock::acquire(path).map_err(|e| match e {
        LockError::AlreadyLocked => StoreError::Locked,
        other => StoreError::Io(other.to_string()),
    })?;

    let mut documents = match fs::read_to_string(path) {
        Ok(contents) => parse(path, &contents)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Documents::default(),
        Err(e) => return Err(io_error(path, e)),
    };
    documents.apply(batch)?;

    let contents = serde_json::to_string_pretty(&StoreFile {
        version: FILE_FORMAT_VERSION,
        documents,
    })
    .map_err(|e| StoreError::Serialize(e.to_string()))?;

    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path).map_err(|e| io_error(&temp_path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| io_error(&temp_path, e))?;
    file.sync_all().map_err(|e| io_error(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| io_error(path, e))
}

#[async_trait]
impl DocumentStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load_document(&self, path: &DocPath) -> Result<Option<Record>, StoreError> {
        Ok(self.read().await?.get(path))
    }

    async fn load_collection(
        &self,
        path: &DocPath,
        order_by: &str,
    ) -> Result<Vec<Document>, StoreError> {
        self.read().await?.collection(path, order_by)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        debug!(store = %self.path.display(), ops = batch.len(), "committing batch");
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || commit_blocking(&path, batch))
            .await
            .map_err(|e| StoreError::Io(format!("commit task failed: {}", e)))?
    }
}
