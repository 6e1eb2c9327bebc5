//! Document-store abstraction.
//!
//! The REST engine talks to persistence through [`DocumentStore`]; the MongoDB
//! implementation backs deployments, the in-memory one backs tests and local
//! smoke runs. Documents cross the seam as JSON objects with a string `_id`.

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("codec: {0}")]
    Codec(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a batch; returns the stored documents, each with its `_id` set.
    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Map<String, Value>>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    /// Lookup by internal id. An id that does not parse yields `None` rather
    /// than an error, so callers can fall through to an alternate lookup.
    async fn find_by_id(&self, collection: &str, id: &str)
        -> Result<Option<Value>, StoreError>;

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Value>, StoreError>;

    /// Whether any record other than `exclude_id` holds `value` in `field`.
    async fn field_exists(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        exclude_id: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// Merge `changes` into the record; returns the updated document.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        changes: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError>;

    /// Remove every document in the collection; returns the removed count.
    async fn delete_all(&self, collection: &str) -> Result<u64, StoreError>;
}
