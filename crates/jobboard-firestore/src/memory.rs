//! In-process document store used for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use jobboard_models::{DeleteResult, Fields, UpdateResult};

use crate::error::{FirestoreError, FirestoreResult};
use crate::query::Query;
use crate::store::{DocumentStore, StoredDocument};

/// Collections kept in insertion order behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, collection: &str, id: &str) -> FirestoreResult<Option<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> FirestoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument {
                id: id.clone(),
                fields,
            });
        debug!(collection = %collection, doc_id = %id, "Inserted document");
        Ok(id)
    }

    async fn find(&self, collection: &str, query: &Query) -> FirestoreResult<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| query.matches(&doc.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> FirestoreResult<UpdateResult> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
        else {
            return Ok(UpdateResult::unmatched());
        };

        let mut modified = false;
        for (key, value) in fields {
            if doc.fields.get(&key) != Some(&value) {
                doc.fields.insert(key, value);
                modified = true;
            }
        }
        Ok(UpdateResult::new(1, u64::from(modified)))
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> FirestoreResult<UpdateResult> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
        else {
            return Ok(UpdateResult::unmatched());
        };

        let current = match doc.fields.get(field) {
            None | Some(JsonValue::Null) => 0,
            Some(value) => value.as_i64().ok_or_else(|| {
                FirestoreError::InvalidResponse(format!(
                    "{}/{} field {} is not an integer",
                    collection, id, field
                ))
            })?,
        };
        doc.fields
            .insert(field.to_string(), JsonValue::from(current + delta));
        Ok(UpdateResult::new(1, 1))
    }

    async fn delete(&self, collection: &str, id: &str) -> FirestoreResult<DeleteResult> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(DeleteResult::new(0));
        };
        let before = docs.len();
        docs.retain(|doc| doc.id != id);
        Ok(DeleteResult::new((before - docs.len()) as u64))
    }
}
