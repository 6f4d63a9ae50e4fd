//! Replicator - fans a document write out to every known location.
//!
//! All replicas receive the same serialized bytes so they stay
//! byte-identical. The primary (first) path additionally gets a `.backup`
//! copy of its previous contents before being overwritten, so a botched
//! write never destroys the last valid state.

use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::document::Document;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct Replicator {
    paths: Vec<PathBuf>,
}

impl Replicator {
    /// `paths[0]` is the primary; the rest are secondaries.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Replicator { paths }
    }

    /// Stamp the document's sync fields and write it everywhere.
    ///
    /// Returns how many locations were written. Secondary failures are
    /// logged and tolerated; the operation only fails when no location
    /// at all accepted the write.
    pub fn save(&self, document: &mut Document) -> Result<usize, StoreError> {
        document.stamp_sync(Utc::now());
        let serialized = document.to_pretty_json().map_err(StoreError::from)?;

        let mut written = 0;
        for (index, path) in self.paths.iter().enumerate() {
            if index == 0 {
                backup_existing(path);
            }

            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        warn!(path = %path.display(), error = %e, "could not create replica directory");
                        continue;
                    }
                    info!(dir = %parent.display(), "created replica directory");
                }
            }

            match fs::write(path, &serialized) {
                Ok(()) => {
                    debug!(path = %path.display(), bytes = serialized.len(), "synced database");
                    written += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to sync database replica");
                }
            }
        }

        if written == 0 {
            error!(attempted = self.paths.len(), "database write failed at every location");
            return Err(StoreError::PersistenceFailed {
                attempted: self.paths.len(),
            });
        }

        info!(written, total = self.paths.len(), "database synced");
        Ok(written)
    }
}

/// Best-effort copy of the primary to a `.backup` sibling before overwrite.
fn backup_existing(path: &PathBuf) {
    if !path.exists() {
        return;
    }
    let mut backup = path.as_os_str().to_owned();
    backup.push(".backup");
    if let Err(e) = fs::copy(path, PathBuf::from(&backup)) {
        warn!(path = %path.display(), error = %e, "could not back up database before write");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn doc_with_product() -> Document {
        serde_json::from_value(json!({
            "products": [{ "id": 1, "name": "A" }]
        }))
        .unwrap()
    }

    #[test]
    fn writes_identical_bytes_to_every_replica() {
        let dir = TempDir::new().unwrap();
        let primary = dir.path().join("database.json");
        let secondary = dir.path().join("public").join("database.json");

        let replicator = Replicator::new(vec![primary.clone(), secondary.clone()]);
        let mut doc = doc_with_product();
        assert_eq!(replicator.save(&mut doc).unwrap(), 2);

        let a = fs::read_to_string(&primary).unwrap();
        let b = fs::read_to_string(&secondary).unwrap();
        assert_eq!(a, b);

        let parsed: Value = serde_json::from_str(&a).unwrap();
        assert_eq!(parsed["syncInfo"]["lastSync"], parsed["_lastSync"]);
    }

    #[test]
    fn creates_missing_replica_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b").join("database.json");

        let replicator = Replicator::new(vec![dir.path().join("database.json"), nested.clone()]);
        replicator.save(&mut doc_with_product()).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn backs_up_the_primary_before_overwriting() {
        let dir = TempDir::new().unwrap();
        let primary = dir.path().join("database.json");
        fs::write(&primary, r#"{ "products": [{ "id": 9, "name": "old" }] }"#).unwrap();

        let replicator = Replicator::new(vec![primary.clone()]);
        replicator.save(&mut doc_with_product()).unwrap();

        let backup = fs::read_to_string(dir.path().join("database.json.backup")).unwrap();
        assert!(backup.contains("old"));
        let current = fs::read_to_string(&primary).unwrap();
        assert!(current.contains("\"A\""));
    }

    #[test]
    fn tolerates_one_unwritable_replica() {
        let dir = TempDir::new().unwrap();
        let primary = dir.path().join("database.json");
        // A path whose parent is a regular file can never be created.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();
        let unwritable = blocker.join("database.json");

        let replicator = Replicator::new(vec![primary.clone(), unwritable]);
        let written = replicator.save(&mut doc_with_product()).unwrap();
        assert_eq!(written, 1);
        assert!(primary.exists());
    }

    #[test]
    fn fails_when_no_location_is_writable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();

        let replicator = Replicator::new(vec![blocker.join("database.json")]);
        let err = replicator.save(&mut doc_with_product()).unwrap_err();
        assert!(matches!(err, StoreError::PersistenceFailed { attempted: 1 }));
    }
}
