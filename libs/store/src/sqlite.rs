use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use anyhow::anyhow;
use async_trait::async_trait;
use care_core::InboundRecord;
use rusqlite::{Connection, ErrorCode, params};
use serde_json::Value;
use tokio::task::spawn_blocking;

use crate::{RecordId, RecordStore, StoreError};

/// Collections backed by a table. Order and customer documents are written by the
/// order-management side and only read here for exports.
pub(crate) const COLLECTIONS: &[&str] = &["feedbacks", "messages", "orders", "customers"];

fn create_table_sql(collection: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {collection} (
            id TEXT PRIMARY KEY,
            doc TEXT NOT NULL CHECK (json_valid(doc)),
            inserted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );"
    )
}

/// SQLite-backed document store. One connection is opened at start-up and shared by
/// every request; statements run on the blocking pool.
#[derive(Clone)]
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(classify)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(classify)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        for collection in COLLECTIONS {
            conn.execute_batch(&create_table_sql(collection))
                .map_err(classify)?;
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) async fn with_conn<F, T>(&self, func: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable(anyhow!("sqlite connection poisoned")))?;
            func(&guard)
        })
        .await
        .map_err(|err| StoreError::Internal(err.into()))?
    }

    /// Appends a raw document. `id` defaults to a fresh UUID.
    pub async fn insert_document(
        &self,
        collection: &str,
        id: Option<String>,
        doc: Value,
    ) -> Result<RecordId, StoreError> {
        let table = known_collection(collection)?;
        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let body = serde_json::to_string(&doc)
            .map_err(|err| StoreError::Internal(err.into()))?;
        let sql = format!("INSERT INTO {table} (id, doc) VALUES (?1, ?2)");
        let assigned = id.clone();
        self.with_conn(move |conn| {
            conn.execute(&sql, params![assigned, body])
                .map_err(classify)?;
            Ok(())
        })
        .await?;
        Ok(id)
    }

    /// Documents of `collection` in insertion order.
    pub async fn documents(&self, collection: &str) -> Result<Vec<(RecordId, Value)>, StoreError> {
        let table = known_collection(collection)?;
        let sql = format!("SELECT id, doc FROM {table} ORDER BY rowid");
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql).map_err(classify)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
                .map_err(classify)?;
            let mut out = Vec::new();
            for row in rows {
                let (id, doc) = row.map_err(classify)?;
                let doc: Value = serde_json::from_str(&doc)
                    .map_err(|err| StoreError::Internal(err.into()))?;
                out.push((id, doc));
            }
            Ok(out)
        })
        .await
    }

    pub async fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let table = known_collection(collection)?;
        let sql = format!("SELECT COUNT(*) FROM {table}");
        self.with_conn(move |conn| {
            conn.query_row(&sql, [], |row| row.get::<_, i64>(0))
                .map(|n| n.max(0) as u64)
                .map_err(classify)
        })
        .await
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: &InboundRecord) -> Result<RecordId, StoreError> {
        let doc = record
            .to_document()
            .map_err(|err| StoreError::Internal(err.into()))?;
        let id = self
            .insert_document(record.collection().as_str(), None, doc)
            .await?;
        tracing::debug!(
            collection = record.collection().as_str(),
            id = %id,
            "record inserted"
        );
        Ok(id)
    }
}

fn known_collection(name: &str) -> Result<&'static str, StoreError> {
    COLLECTIONS
        .iter()
        .copied()
        .find(|known| *known == name)
        .ok_or_else(|| StoreError::Rejected(format!("unknown collection {name}")))
}

/// Maps SQLite failures onto the store's error taxonomy.
pub(crate) fn classify(err: rusqlite::Error) -> StoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) | Some(ErrorCode::TooBig) => {
            StoreError::Rejected(err.to_string())
        }
        Some(
            ErrorCode::CannotOpen
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::ReadOnly
            | ErrorCode::DiskFull
            | ErrorCode::SystemIoFailure
            | ErrorCode::PermissionDenied,
        ) => StoreError::Unavailable(err.into()),
        _ => StoreError::Internal(err.into()),
    }
}
