//! Storage Locator - picks the freshest database file among the known
//! locations.
//!
//! Deployments historically left copies of `database.json` in several
//! places (repo root, api dir, public dir). Reads must not trust any
//! single one: the locator parses every candidate that exists and selects
//! the one with the newest sync timestamp, falling back to file mtime for
//! copies written before sync stamping existed.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::StoreError;

/// A located document together with the path it was read from.
#[derive(Debug)]
pub struct Located {
    pub path: PathBuf,
    pub document: Document,
}

/// Ordered list of candidate paths for the database file.
#[derive(Debug, Clone)]
pub struct StorageLocator {
    candidates: Vec<PathBuf>,
}

impl StorageLocator {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        StorageLocator { candidates }
    }

    /// Read every candidate that exists and return the newest parseable
    /// one. Candidates that fail to read or parse are skipped with a
    /// warning. `StoreError::Unavailable` if nothing parses.
    pub fn locate_newest(&self) -> Result<Located, StoreError> {
        let mut newest: Option<(DateTime<Utc>, Located)> = None;

        for path in &self.candidates {
            let Some((timestamp, document)) = read_candidate(path) else {
                continue;
            };
            debug!(path = %path.display(), %timestamp, "candidate database");
            let is_newer = newest
                .as_ref()
                .map(|(best, _)| timestamp > *best)
                .unwrap_or(true);
            if is_newer {
                newest = Some((
                    timestamp,
                    Located {
                        path: path.clone(),
                        document,
                    },
                ));
            }
        }

        newest.map(|(_, located)| located).ok_or(StoreError::Unavailable)
    }
}

/// Parse one candidate path, returning its effective timestamp.
///
/// The timestamp is the document's own `lastSync` when present, else the
/// file modification time.
fn read_candidate(path: &Path) -> Option<(DateTime<Utc>, Document)> {
    if !path.exists() {
        return None;
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable database file");
            return None;
        }
    };

    let document: Document = match serde_json::from_str(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping corrupt database file");
            return None;
        }
    };

    let timestamp = document.last_sync().or_else(|| file_mtime(path));
    // A parseable file with no timestamp at all still beats nothing.
    Some((timestamp.unwrap_or(DateTime::<Utc>::MIN_UTC), document))
}

fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}
