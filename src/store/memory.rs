//! In-memory document store for tests and local smoke runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use serde_json::{Map, Value};

use crate::store::{DocumentStore, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Map<String, Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn doc_id(doc: &Map<String, Value>) -> Option<&str> {
    doc.get("_id").and_then(Value::as_str)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Map<String, Value>>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut guard = self.collections.write().unwrap();
        let coll = guard.entry(collection.to_string()).or_default();
        let mut out = Vec::with_capacity(docs.len());
        for mut doc in docs {
            doc.insert("_id".into(), Value::String(ObjectId::new().to_hex()));
            out.push(Value::Object(doc.clone()));
            coll.push(doc);
        }
        Ok(out)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let guard = self.collections.read().unwrap();
        Ok(guard
            .get(collection)
            .map(|coll| coll.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, StoreError> {
        let guard = self.collections.read().unwrap();
        Ok(guard.get(collection).and_then(|coll| {
            coll.iter().find(|d| doc_id(d) == Some(id)).cloned().map(Value::Object)
        }))
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Value>, StoreError> {
        let guard = self.collections.read().unwrap();
        Ok(guard.get(collection).and_then(|coll| {
            coll.iter().find(|d| d.get(field) == Some(value)).cloned().map(Value::Object)
        }))
    }

    async fn field_exists(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        exclude_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let guard = self.collections.read().unwrap();
        Ok(guard.get(collection).is_some_and(|coll| {
            coll.iter()
                .any(|d| d.get(field) == Some(value) && doc_id(d) != exclude_id)
        }))
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        changes: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let mut guard = self.collections.write().unwrap();
        let Some(coll) = guard.get_mut(collection) else {
            return Ok(None);
        };
        let Some(doc) = coll.iter_mut().find(|d| doc_id(d) == Some(id)) else {
            return Ok(None);
        };
        for (k, v) in changes {
            doc.insert(k, v);
        }
        Ok(Some(Value::Object(doc.clone())))
    }

    async fn delete_all(&self, collection: &str) -> Result<u64, StoreError> {
        let mut guard = self.collections.write().unwrap();
        let Some(coll) = guard.get_mut(collection) else {
            return Ok(0);
        };
        let removed = coll.len() as u64;
        coll.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let out = store
            .insert_many("pods", vec![obj(json!({"urlid": "a"})), obj(json!({"urlid": "b"}))])
            .await
            .unwrap();
        let ids: Vec<_> = out.iter().map(|d| d["_id"].as_str().unwrap().to_string()).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[tokio::test]
    async fn field_exists_honors_exclusion() {
        let store = MemoryStore::new();
        let out = store
            .insert_many("pods", vec![obj(json!({"imei": "123456789012345"}))])
            .await
            .unwrap();
        let id = out[0]["_id"].as_str().unwrap();
        let v = json!("123456789012345");
        assert!(store.field_exists("pods", "imei", &v, None).await.unwrap());
        assert!(!store.field_exists("pods", "imei", &v, Some(id)).await.unwrap());
    }

    #[tokio::test]
    async fn update_merges_changes() {
        let store = MemoryStore::new();
        let out = store
            .insert_many("pods", vec![obj(json!({"status": "provisioned", "public": true}))])
            .await
            .unwrap();
        let id = out[0]["_id"].as_str().unwrap();
        let updated = store
            .update_by_id("pods", id, obj(json!({"status": "active"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["status"], "active");
        assert_eq!(updated["public"], true);
    }

    #[tokio::test]
    async fn delete_all_empties_collection() {
        let store = MemoryStore::new();
        store.insert_many("users", vec![obj(json!({"keys": ["k1"]}))]).await.unwrap();
        assert_eq!(store.delete_all("users").await.unwrap(), 1);
        assert!(store.find_all("users").await.unwrap().is_empty());
    }
}
