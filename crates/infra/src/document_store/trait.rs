use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

/// Storage identifier of a document, generated by the store on insert.
///
/// Distinct from the domain `JobId`: a posting's storage id changes when it
/// moves from the staged collection to the live collection; the domain id
/// does not.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh id (UUIDv7, time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A document snapshot returned by queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub data: JsonValue,
}

/// Comparison operator for field filters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// A single top-level field predicate.
///
/// Range operators compare strings lexically; timestamps must therefore be
/// in the canonical encoding (lexical order == chronological order).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: JsonValue,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self { field: field.into(), op: FilterOp::Eq, value: value.into() }
    }

    pub fn lt(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self { field: field.into(), op: FilterOp::Lt, value: value.into() }
    }

    pub fn lte(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self { field: field.into(), op: FilterOp::Lte, value: value.into() }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self { field: field.into(), op: FilterOp::Gt, value: value.into() }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self { field: field.into(), op: FilterOp::Gte, value: value.into() }
    }

    /// Whether a document's data satisfies this predicate.
    ///
    /// A missing field or a type mismatch never matches.
    pub fn matches(&self, data: &JsonValue) -> bool {
        let Some(actual) = data.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Lt => compare_json(actual, &self.value) == Some(Ordering::Less),
            FilterOp::Lte => matches!(
                compare_json(actual, &self.value),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            FilterOp::Gt => compare_json(actual, &self.value) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(
                compare_json(actual, &self.value),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
        }
    }
}

fn compare_json(a: &JsonValue, b: &JsonValue) -> Option<Ordering> {
    match (a, b) {
        (JsonValue::String(a), JsonValue::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (JsonValue::Number(a), JsonValue::Number(b)) => {
            a.as_f64().and_then(|a| b.as_f64().and_then(|b| a.partial_cmp(&b)))
        }
        (JsonValue::Bool(a), JsonValue::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// A conjunction of field predicates over one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<FieldFilter>,
}

impl Query {
    /// Match every document in the collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(filter: FieldFilter) -> Self {
        Self { filters: vec![filter] }
    }

    pub fn and(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn matches(&self, data: &JsonValue) -> bool {
        self.filters.iter().all(|f| f.matches(data))
    }
}

/// One mutation inside an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or fully replace a document.
    Set {
        collection: String,
        id: DocumentId,
        data: JsonValue,
    },
    /// Merge the given top-level fields into an existing document.
    Update {
        collection: String,
        id: DocumentId,
        fields: serde_json::Map<String, JsonValue>,
    },
    /// Remove a document; removing an absent document is a no-op.
    Delete { collection: String, id: DocumentId },
}

/// A multi-document write committed atomically: every op applies, or none do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, collection: impl Into<String>, id: DocumentId, data: JsonValue) {
        self.ops.push(WriteOp::Set { collection: collection.into(), id, data });
    }

    pub fn update(
        &mut self,
        collection: impl Into<String>,
        id: DocumentId,
        fields: serde_json::Map<String, JsonValue>,
    ) {
        self.ops.push(WriteOp::Update { collection: collection.into(), id, fields });
    }

    pub fn delete(&mut self, collection: impl Into<String>, id: DocumentId) {
        self.ops.push(WriteOp::Delete { collection: collection.into(), id });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Document store operation error.
///
/// Infrastructure errors (storage, batch validation), as opposed to domain
/// errors.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: DocumentId },

    #[error("invalid write: {0}")]
    InvalidWrite(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Transactional document store over named collections.
///
/// The lifecycle engine's only shared mutable resource. Implementations must:
/// - return query results as a point-in-time snapshot
/// - generate ids on insert
/// - commit a `WriteBatch` atomically (all ops or none)
/// - treat deletes of absent documents as no-ops
///
/// Timestamps are persisted as canonical strings; range filters rely on
/// their lexical order.
pub trait DocumentStore: Send + Sync {
    /// Add a new document with a generated id.
    fn insert(&self, collection: &str, data: JsonValue) -> Result<DocumentId, DocumentStoreError>;

    /// Fetch a single document by id.
    fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>, DocumentStoreError>;

    /// Snapshot of all documents matching the query.
    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, DocumentStoreError>;

    /// Delete a single document by id (idempotent).
    fn delete(&self, collection: &str, id: DocumentId) -> Result<(), DocumentStoreError>;

    /// Commit a batch atomically.
    fn commit(&self, batch: WriteBatch) -> Result<(), DocumentStoreError>;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    fn insert(&self, collection: &str, data: JsonValue) -> Result<DocumentId, DocumentStoreError> {
        (**self).insert(collection, data)
    }

    fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>, DocumentStoreError> {
        (**self).get(collection, id)
    }

    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, DocumentStoreError> {
        (**self).query(collection, query)
    }

    fn delete(&self, collection: &str, id: DocumentId) -> Result<(), DocumentStoreError> {
        (**self).delete(collection, id)
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), DocumentStoreError> {
        (**self).commit(batch)
    }
}
