//! MongoDB-backed document store.

use async_trait::async_trait;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Client, Database};
use serde_json::{Map, Value};

use crate::store::{DocumentStore, StoreError};

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, dbname: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(MongoStore { db: client.database(dbname) })
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.db.collection::<Document>(name)
    }
}

fn to_document(map: &Map<String, Value>) -> Result<Document, StoreError> {
    bson::to_document(map).map_err(|e| StoreError::Codec(e.to_string()))
}

fn to_bson(value: &Value) -> Result<Bson, StoreError> {
    bson::to_bson(value).map_err(|e| StoreError::Codec(e.to_string()))
}

/// Convert a stored document to JSON, with `_id` as a hex string.
fn document_to_json(mut doc: Document) -> Result<Value, StoreError> {
    if let Some(Bson::ObjectId(oid)) = doc.get("_id") {
        let hex = oid.to_hex();
        doc.insert("_id", Bson::String(hex));
    }
    serde_json::to_value(&doc).map_err(|e| StoreError::Codec(e.to_string()))
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Map<String, Value>>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut bson_docs = Vec::with_capacity(docs.len());
        for map in &docs {
            let mut doc = to_document(map)?;
            doc.insert("_id", ObjectId::new());
            bson_docs.push(doc);
        }
        self.collection(collection).insert_many(bson_docs.clone(), None).await?;
        bson_docs.into_iter().map(document_to_json).collect()
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let mut cursor = self.collection(collection).find(doc! {}, None).await?;
        let mut out = Vec::new();
        while cursor.advance().await? {
            out.push(document_to_json(cursor.deserialize_current()?)?);
        }
        Ok(out)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, StoreError> {
        let oid = match ObjectId::parse_str(id) {
            Ok(oid) => oid,
            Err(_) => return Ok(None),
        };
        let found = self.collection(collection).find_one(doc! { "_id": oid }, None).await?;
        found.map(document_to_json).transpose()
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Option<Value>, StoreError> {
        let mut filter = Document::new();
        filter.insert(field, to_bson(value)?);
        let found = self.collection(collection).find_one(filter, None).await?;
        found.map(document_to_json).transpose()
    }

    async fn field_exists(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        exclude_id: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut filter = Document::new();
        filter.insert(field, to_bson(value)?);
        if let Some(id) = exclude_id {
            if let Ok(oid) = ObjectId::parse_str(id) {
                filter.insert("_id", doc! { "$ne": oid });
            }
        }
        let count = self.collection(collection).count_documents(filter, None).await?;
        Ok(count > 0)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        changes: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let oid = match ObjectId::parse_str(id) {
            Ok(oid) => oid,
            Err(_) => return Ok(None),
        };
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection(collection)
            .find_one_and_update(
                doc! { "_id": oid },
                doc! { "$set": to_document(&changes)? },
                options,
            )
            .await?;
        updated.map(document_to_json).transpose()
    }

    async fn delete_all(&self, collection: &str) -> Result<u64, StoreError> {
        let result = self.collection(collection).delete_many(doc! {}, None).await?;
        Ok(result.deleted_count)
    }
}
