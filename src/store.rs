//! DocumentStore - the load/save seam between CRUD logic and storage.
//!
//! CRUD code only sees this trait, so the file-replication backend can
//! later be swapped for a real embedded database without touching it.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::document::Document;
use crate::error::StoreError;
use crate::locator::StorageLocator;
use crate::replicator::Replicator;

/// Abstract load/save over the whole document.
pub trait DocumentStore: Send + Sync {
    /// Load the freshest available document.
    fn load(&self) -> Result<Document, StoreError>;

    /// Persist the document, stamping its sync timestamp.
    fn save(&self, document: &mut Document) -> Result<(), StoreError>;
}

/// The production store: locator for reads, replicator for writes, over
/// one shared ordered path list.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    locator: StorageLocator,
    replicator: Replicator,
}

impl FileDocumentStore {
    /// `paths[0]` is the primary location; all paths are both read
    /// candidates and write targets.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        FileDocumentStore {
            locator: StorageLocator::new(paths.clone()),
            replicator: Replicator::new(paths),
        }
    }
}

impl DocumentStore for FileDocumentStore {
    fn load(&self) -> Result<Document, StoreError> {
        Ok(self.locator.locate_newest()?.document)
    }

    fn save(&self, document: &mut Document) -> Result<(), StoreError> {
        self.replicator.save(document)?;
        Ok(())
    }
}

/// In-memory store for tests and development. Clones share storage.
#[derive(Debug, Clone)]
pub struct InMemoryDocumentStore {
    document: Arc<RwLock<Document>>,
}

impl InMemoryDocumentStore {
    pub fn new(document: Document) -> Self {
        InMemoryDocumentStore {
            document: Arc::new(RwLock::new(document)),
        }
    }

    /// Snapshot of the current document.
    pub fn snapshot(&self) -> Document {
        self.document
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new(Document::empty())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn load(&self) -> Result<Document, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, document: &mut Document) -> Result<(), StoreError> {
        document.stamp_sync(chrono::Utc::now());
        let mut guard = self
            .document
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = document.clone();
        Ok(())
    }
}
