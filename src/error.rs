use std::fmt;

/// Errors raised by the storage layer (locator, replicator, document store).
#[derive(Debug)]
pub enum StoreError {
    /// No replica path could be read and parsed.
    Unavailable,
    /// Every replica write failed.
    PersistenceFailed { attempted: usize },
    /// The document could not be serialized or deserialized.
    Serde(String),
    /// An I/O error outside the skip-and-continue paths.
    Io(std::io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable => {
                write!(f, "no readable database file found in any location")
            }
            StoreError::PersistenceFailed { attempted } => {
                write!(f, "failed to write database to all {} locations", attempted)
            }
            StoreError::Serde(msg) => write!(f, "database serialization error: {}", msg),
            StoreError::Io(e) => write!(f, "database i/o error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serde(err.to_string())
    }
}

/// Errors surfaced by the collection CRUD service.
#[derive(Debug)]
pub enum CrudError {
    /// No record with the given id in the named collection.
    NotFound { collection: String, id: String },
    /// The request body is not the expected shape.
    MalformedInput(String),
    /// Underlying storage failure.
    Storage(StoreError),
}

impl fmt::Display for CrudError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrudError::NotFound { collection, id } => {
                write!(f, "{} with id {} not found", singular(collection), id)
            }
            CrudError::MalformedInput(msg) => write!(f, "malformed input: {}", msg),
            CrudError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for CrudError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrudError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for CrudError {
    fn from(err: StoreError) -> Self {
        CrudError::Storage(err)
    }
}

impl CrudError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            CrudError::NotFound { .. } => 404,
            CrudError::MalformedInput(_) => 400,
            CrudError::Storage(_) => 500,
        }
    }
}

/// Human-friendly singular label for a collection name ("products" -> "Product").
pub(crate) fn singular(collection: &str) -> String {
    let trimmed = collection.strip_suffix('s').unwrap_or(collection);
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::from("Record"),
    }
}
