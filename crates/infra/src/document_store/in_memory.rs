use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value as JsonValue;

use super::r#trait::{
    Document, DocumentId, DocumentStore, DocumentStoreError, Query, WriteBatch, WriteOp,
};

/// In-memory document store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, HashMap<DocumentId, JsonValue>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Total documents in a collection (test/diagnostic helper).
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, HashMap::len))
            .unwrap_or(0)
    }
}

fn poisoned() -> DocumentStoreError {
    DocumentStoreError::Storage("lock poisoned".to_string())
}

impl DocumentStore for InMemoryDocumentStore {
    fn insert(&self, collection: &str, data: JsonValue) -> Result<DocumentId, DocumentStoreError> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        let id = DocumentId::new();
        collections.entry(collection.to_string()).or_default().insert(id, data);
        Ok(id)
    }

    fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>, DocumentStoreError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(&id))
            .map(|data| Document { id, data: data.clone() }))
    }

    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, DocumentStoreError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        let mut result: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| query.matches(data))
                    .map(|(id, data)| Document { id: *id, data: data.clone() })
                    .collect()
            })
            .unwrap_or_default();

        // UUIDv7 ids are time-ordered; sorting gives deterministic,
        // insertion-ordered snapshots.
        result.sort_by_key(|d| d.id);
        Ok(result)
    }

    fn delete(&self, collection: &str, id: DocumentId) -> Result<(), DocumentStoreError> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(&id);
        }
        Ok(())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), DocumentStoreError> {
        let mut collections = self.collections.write().map_err(|_| poisoned())?;

        // Validate every op before touching anything: a failed batch must
        // leave the store unchanged.
        for op in &batch.ops {
            if let WriteOp::Update { collection, id, .. } = op {
                let exists = collections
                    .get(collection)
                    .map_or(false, |docs| docs.contains_key(id));
                if !exists {
                    return Err(DocumentStoreError::NotFound {
                        collection: collection.clone(),
                        id: *id,
                    });
                }
            }
        }

        for op in batch.ops {
            match op {
                WriteOp::Set { collection, id, data } => {
                    collections.entry(collection).or_default().insert(id, data);
                }
                WriteOp::Update { collection, id, fields } => {
                    // Existence validated above; the collection entry exists.
                    if let Some(doc) = collections
                        .get_mut(&collection)
                        .and_then(|docs| docs.get_mut(&id))
                    {
                        if let JsonValue::Object(obj) = doc {
                            for (key, value) in fields {
                                obj.insert(key, value);
                            }
                        }
                    }
                }
                WriteOp::Delete { collection, id } => {
                    if let Some(docs) = collections.get_mut(&collection) {
                        docs.remove(&id);
                    }
                }
            }
        }

        Ok(())
    }
}
