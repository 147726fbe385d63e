//! Postgres-backed document store.
//!
//! Documents live in a single JSONB table keyed by `(collection, id)`.
//! Filters compare `data->>'field'` as text, which matches the canonical
//! timestamp encoding's lexical-order contract. Batches run in one
//! transaction.

use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::r#trait::{
    Document, DocumentId, DocumentStore, DocumentStoreError, FilterOp, Query, WriteBatch, WriteOp,
};

/// Document store over a Postgres JSONB table.
///
/// The store trait is synchronous; a dedicated current-thread runtime
/// bridges to sqlx.
pub struct PostgresDocumentStore {
    pool: PgPool,
    runtime: tokio::runtime::Runtime,
}

impl PostgresDocumentStore {
    /// Connect and ensure the backing table exists.
    pub fn connect(url: &str) -> Result<Self, DocumentStoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DocumentStoreError::Storage(format!("runtime init failed: {e}")))?;

        let pool = runtime
            .block_on(PgPoolOptions::new().max_connections(4).connect(url))
            .map_err(storage_err)?;

        let store = Self { pool, runtime };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<(), DocumentStoreError> {
        self.runtime
            .block_on(
                sqlx::query(
                    "CREATE TABLE IF NOT EXISTS documents (
                         collection TEXT NOT NULL,
                         id UUID NOT NULL,
                         data JSONB NOT NULL,
                         PRIMARY KEY (collection, id)
                     )",
                )
                .execute(&self.pool),
            )
            .map_err(storage_err)?;
        Ok(())
    }
}

fn storage_err(e: sqlx::Error) -> DocumentStoreError {
    DocumentStoreError::Storage(e.to_string())
}

fn op_sql(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Eq => "=",
        FilterOp::Lt => "<",
        FilterOp::Lte => "<=",
        FilterOp::Gt => ">",
        FilterOp::Gte => ">=",
    }
}

// `->>` yields text; strings compare raw, everything else by its JSON text.
fn filter_value_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl DocumentStore for PostgresDocumentStore {
    fn insert(&self, collection: &str, data: JsonValue) -> Result<DocumentId, DocumentStoreError> {
        let id = DocumentId::new();
        self.runtime
            .block_on(
                sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
                    .bind(collection)
                    .bind(*id.as_uuid())
                    .bind(data)
                    .execute(&self.pool),
            )
            .map_err(storage_err)?;
        Ok(id)
    }

    fn get(&self, collection: &str, id: DocumentId) -> Result<Option<Document>, DocumentStoreError> {
        let row = self
            .runtime
            .block_on(
                sqlx::query("SELECT data FROM documents WHERE collection = $1 AND id = $2")
                    .bind(collection)
                    .bind(*id.as_uuid())
                    .fetch_optional(&self.pool),
            )
            .map_err(storage_err)?;

        row.map(|row| {
            let data: JsonValue = row.try_get("data").map_err(storage_err)?;
            Ok(Document { id, data })
        })
        .transpose()
    }

    fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, DocumentStoreError> {
        let mut sql = String::from("SELECT id, data FROM documents WHERE collection = $1");
        let mut arg = 2;
        for filter in &query.filters {
            // The operator comes from a closed enum; only values are bound.
            sql.push_str(&format!(" AND data->>${arg} {} ${}", op_sql(filter.op), arg + 1));
            arg += 2;
        }
        sql.push_str(" ORDER BY id");

        let mut q = sqlx::query(&sql).bind(collection);
        for filter in &query.filters {
            q = q.bind(filter.field.as_str()).bind(filter_value_text(&filter.value));
        }

        let rows = self
            .runtime
            .block_on(q.fetch_all(&self.pool))
            .map_err(storage_err)?;

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row.try_get("id").map_err(storage_err)?;
                let data: JsonValue = row.try_get("data").map_err(storage_err)?;
                Ok(Document { id: DocumentId::from_uuid(id), data })
            })
            .collect()
    }

    fn delete(&self, collection: &str, id: DocumentId) -> Result<(), DocumentStoreError> {
        self.runtime
            .block_on(
                sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                    .bind(collection)
                    .bind(*id.as_uuid())
                    .execute(&self.pool),
            )
            .map_err(storage_err)?;
        Ok(())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), DocumentStoreError> {
        self.runtime.block_on(async {
            let mut tx = self.pool.begin().await.map_err(storage_err)?;

            for op in &batch.ops {
                match op {
                    WriteOp::Set { collection, id, data } => {
                        sqlx::query(
                            "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)
                             ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data",
                        )
                        .bind(collection.as_str())
                        .bind(*id.as_uuid())
                        .bind(data.clone())
                        .execute(&mut *tx)
                        .await
                        .map_err(storage_err)?;
                    }
                    WriteOp::Update { collection, id, fields } => {
                        let result = sqlx::query(
                            "UPDATE documents SET data = data || $3
                             WHERE collection = $1 AND id = $2",
                        )
                        .bind(collection.as_str())
                        .bind(*id.as_uuid())
                        .bind(JsonValue::Object(fields.clone()))
                        .execute(&mut *tx)
                        .await
                        .map_err(storage_err)?;

                        if result.rows_affected() == 0 {
                            // Dropping the transaction rolls everything back.
                            return Err(DocumentStoreError::NotFound {
                                collection: collection.clone(),
                                id: *id,
                            });
                        }
                    }
                    WriteOp::Delete { collection, id } => {
                        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                            .bind(collection.as_str())
                            .bind(*id.as_uuid())
                            .execute(&mut *tx)
                            .await
                            .map_err(storage_err)?;
                    }
                }
            }

            tx.commit().await.map_err(storage_err)
        })
    }
}
