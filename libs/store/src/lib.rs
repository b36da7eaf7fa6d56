//! Persistence gateway for normalized inbound records.
//!
//! Records are appended to one document collection per variant; nothing in this crate
//! updates or deletes them. [`SqliteRecordStore`] is the durable backend, while
//! [`InMemoryRecordStore`] backs tests and throwaway local runs.

use std::sync::Arc;

use async_trait::async_trait;
use care_core::{Collection, InboundRecord};
use serde_json::Value;
use tokio::sync::Mutex;

mod export;
mod sqlite;

pub use export::{CustomerOrderSummary, DateRange};
pub use sqlite::SqliteRecordStore;

/// Identifier assigned to a stored document.
pub type RecordId = String;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store unavailable")]
    Unavailable(#[source] anyhow::Error),
    #[error("record rejected: {0}")]
    Rejected(String),
    #[error("internal store error")]
    Internal(#[source] anyhow::Error),
}

/// Contract implemented by record stores.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Appends `record` to its variant's collection as a single document.
    async fn insert(&self, record: &InboundRecord) -> Result<RecordId, StoreError>;
}

/// Shared trait object wrapper.
pub type SharedRecordStore = Arc<dyn RecordStore>;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: RecordId,
    pub collection: Collection,
    pub doc: Value,
}

/// Keeps inserted documents in a vector.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    inserted: Arc<Mutex<Vec<StoredDocument>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn documents(&self, collection: Collection) -> Vec<StoredDocument> {
        self.inserted
            .lock()
            .await
            .iter()
            .filter(|d| d.collection == collection)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inserted.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: &InboundRecord) -> Result<RecordId, StoreError> {
        let doc = record
            .to_document()
            .map_err(|err| StoreError::Internal(err.into()))?;
        let id = uuid::Uuid::new_v4().to_string();
        self.inserted.lock().await.push(StoredDocument {
            id: id.clone(),
            collection: record.collection(),
            doc,
        });
        Ok(id)
    }
}
