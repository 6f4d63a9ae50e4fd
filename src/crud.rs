//! Generic collection CRUD, layered on any [`DocumentStore`].
//!
//! One service covers every collection; the old per-collection handler
//! forks collapse into parameters. Each operation is a full
//! load-modify-save cycle against the store - the document is never
//! cached across requests, and no lock guards concurrent writers
//! (last-writer-wins, as the system has always behaved).

use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::document::Document;
use crate::error::{CrudError, StoreError};
use crate::record::{max_id, merge_record, normalize_images, now_iso, RecordId};
use crate::store::DocumentStore;

pub struct CollectionCrudService<S> {
    store: S,
    upload_dirs: Vec<PathBuf>,
}

impl<S: DocumentStore> CollectionCrudService<S> {
    pub fn new(store: S) -> Self {
        CollectionCrudService {
            store,
            upload_dirs: Vec::new(),
        }
    }

    /// Directories probed when deleting a record's uploaded images.
    pub fn with_upload_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.upload_dirs = dirs;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads degrade to the empty default document when storage is
    /// entirely unavailable; real write failures are not swallowed.
    fn load_for_read(&self) -> Result<Document, CrudError> {
        match self.store.load() {
            Ok(doc) => Ok(doc),
            Err(StoreError::Unavailable) => {
                warn!("no database found, serving the empty default document");
                Ok(Document::empty())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All records of a collection, in stored order.
    pub fn list(&self, collection: &str) -> Result<Vec<Value>, CrudError> {
        Ok(self.load_for_read()?.collection(collection).to_vec())
    }

    /// One record by id.
    pub fn get(&self, collection: &str, id: &RecordId) -> Result<Value, CrudError> {
        self.load_for_read()?
            .find_by_id(collection, id)
            .cloned()
            .ok_or_else(|| not_found(collection, id))
    }

    /// Append a new record. Its id is `max(existing ids) + 1`; supplied
    /// fields are merged over the collection's default shape.
    pub fn create(
        &self,
        collection: &str,
        partial: Map<String, Value>,
    ) -> Result<Value, CrudError> {
        let mut document = self.store.load()?;
        let new_id = max_id(document.collection(collection)) + 1;

        let mut record = default_shape(collection);
        merge_record(&mut record, &partial);
        normalize_images(&mut record);

        let now = now_iso();
        record.insert("id".to_string(), json!(new_id));
        record.insert("createdAt".to_string(), Value::String(now.clone()));
        record.insert("updatedAt".to_string(), Value::String(now));

        let created = Value::Object(record);
        document.collection_mut(collection).push(created.clone());
        self.store.save(&mut document)?;

        info!(collection, id = new_id, "created record");
        Ok(created)
    }

    /// Shallow-merge `partial` over the existing record. Fields absent
    /// from the patch keep their stored values; `id` never changes.
    pub fn update(
        &self,
        collection: &str,
        id: &RecordId,
        partial: Map<String, Value>,
    ) -> Result<Value, CrudError> {
        let mut document = self.store.load()?;
        let index = document
            .position_of(collection, id)
            .ok_or_else(|| not_found(collection, id))?;

        let records = document.collection_mut(collection);
        let mut record = match records[index].as_object() {
            Some(obj) => obj.clone(),
            None => return Err(not_found(collection, id)),
        };

        merge_record(&mut record, &partial);
        normalize_images(&mut record);
        record.insert("updatedAt".to_string(), Value::String(now_iso()));

        let updated = Value::Object(record);
        records[index] = updated.clone();
        self.store.save(&mut document)?;

        info!(collection, %id, "updated record");
        Ok(updated)
    }

    /// Remove a record and best-effort unlink its uploaded image files.
    /// Returns the removed record.
    pub fn delete(&self, collection: &str, id: &RecordId) -> Result<Value, CrudError> {
        let mut document = self.store.load()?;
        let index = document
            .position_of(collection, id)
            .ok_or_else(|| not_found(collection, id))?;

        let removed = document.collection_mut(collection).remove(index);
        self.store.save(&mut document)?;

        self.unlink_images(&removed);
        info!(collection, %id, "deleted record");
        Ok(removed)
    }

    /// Delete upload files referenced by the record's `images` array.
    /// Failures are logged, never propagated - the record is already gone.
    fn unlink_images(&self, record: &Value) {
        let Some(images) = record.get("images").and_then(Value::as_array) else {
            return;
        };
        for image in images {
            let Some(path) = image.as_str() else { continue };
            if !path.contains("/uploads/") {
                continue;
            }
            let Some(filename) = Path::new(path).file_name() else {
                continue;
            };
            for dir in &self.upload_dirs {
                let candidate = dir.join(filename);
                if !candidate.exists() {
                    continue;
                }
                match std::fs::remove_file(&candidate) {
                    Ok(()) => info!(file = %candidate.display(), "deleted image file"),
                    Err(e) => {
                        warn!(file = %candidate.display(), error = %e, "could not delete image file")
                    }
                }
            }
        }
    }
}

fn not_found(collection: &str, id: &RecordId) -> CrudError {
    CrudError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

/// Baseline fields a freshly created record starts from, per collection.
/// Mirrors what the site's admin panel has always expected back.
fn default_shape(collection: &str) -> Map<String, Value> {
    let defaults = match collection {
        "products" => json!({
            "name": "",
            "images": [],
            "content": "",
            "summary": "",
            "child_nav_id": null,
            "features": "[]",
            "phone_number": "",
            "type": "san-pham",
            "isFeatured": false,
            "views": 0
        }),
        "services" => json!({
            "name": "",
            "images": [],
            "content": "",
            "summary": "",
            "child_nav_id": null,
            "type": "dich-vu",
            "isFeatured": false,
            "views": 0
        }),
        "experiences" => json!({
            "name": "",
            "images": [],
            "content": "",
            "summary": "",
            "type": "trai-nghiem",
            "isFeatured": false,
            "views": 0
        }),
        "news" => json!({
            "title": "",
            "images": [],
            "content": "",
            "summary": "",
            "isFeatured": false,
            "views": 0
        }),
        _ => json!({}),
    };
    defaults.as_object().cloned().unwrap_or_default()
}
