//! Transactional document store boundary.
//!
//! This module defines an infrastructure-facing abstraction over named
//! document collections without making storage assumptions: equality and
//! range queries returning snapshots, id-generating inserts, and atomic
//! multi-document write batches.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresDocumentStore;
pub use r#trait::{
    Document, DocumentId, DocumentStore, DocumentStoreError, FieldFilter, FilterOp, Query,
    WriteBatch, WriteOp,
};
