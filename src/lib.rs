//! JSON-file-backed content API for the Thôn Trang Liên Nhật site.
//!
//! The database is a single flat JSON document replicated across several
//! filesystem locations. Reads pick the freshest replica; writes fan out
//! to all of them. One generic CRUD service covers every collection, and
//! an axum transport (feature `http`, on by default) exposes the REST
//! surface.

pub mod config;
mod crud;
mod document;
mod error;
#[cfg(feature = "http")]
pub mod http;
mod locator;
mod navigation;
mod record;
mod replicator;
mod store;

pub use crud::CollectionCrudService;
pub use document::{Document, DEFAULT_COLLECTIONS, KNOWN_COLLECTIONS};
pub use error::{CrudError, StoreError};
pub use locator::{Located, StorageLocator};
pub use navigation::NavigationView;
pub use record::RecordId;
pub use replicator::Replicator;
pub use store::{DocumentStore, FileDocumentStore, InMemoryDocumentStore};
