//! Document store abstraction.
//!
//! Repositories talk to a [`DocumentStore`]; production uses the Firestore
//! REST client and tests use [`crate::MemoryStore`].

use async_trait::async_trait;

use jobboard_models::{DeleteResult, Fields, UpdateResult};

use crate::error::FirestoreResult;
use crate::query::Query;

/// A document read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
}

/// Schema-flexible collection storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name used in logs and the health endpoint.
    fn backend_name(&self) -> &'static str;

    /// Fetch one document by identifier.
    async fn get(&self, collection: &str, id: &str) -> FirestoreResult<Option<StoredDocument>>;

    /// Fetch several documents; missing identifiers are skipped.
    async fn get_many(
        &self,
        collection: &str,
        ids: &[String],
    ) -> FirestoreResult<Vec<StoredDocument>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(doc) = self.get(collection, id).await? {
                found.push(doc);
            }
        }
        Ok(found)
    }

    /// Insert a document under a store-assigned identifier and return it.
    async fn insert(&self, collection: &str, fields: Fields) -> FirestoreResult<String>;

    /// All documents matching the query, in no particular order.
    async fn find(&self, collection: &str, query: &Query) -> FirestoreResult<Vec<StoredDocument>>;

    /// Merge top-level fields into an existing document.
    async fn set_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> FirestoreResult<UpdateResult>;

    /// Atomically add `delta` to an integer field, treating a missing field as 0.
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> FirestoreResult<UpdateResult>;

    /// Remove a document.
    async fn delete(&self, collection: &str, id: &str) -> FirestoreResult<DeleteResult>;
}

/// Whether a client-supplied identifier can name a document.
///
/// Anything else cannot exist in the store, so lookups short-circuit.
pub fn is_valid_document_id(id: &str) -> bool {
    let reserved = id.len() >= 4 && id.starts_with("__") && id.ends_with("__");
    !id.is_empty()
        && !id.contains('/')
        && id != "."
        && id != ".."
        && !reserved
        && id.len() <= 1500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_validation() {
        assert!(is_valid_document_id("6650f1c2a9"));
        assert!(!is_valid_document_id(""));
        assert!(!is_valid_document_id("jobs/1"));
        assert!(!is_valid_document_id(".."));
        assert!(!is_valid_document_id(&"x".repeat(1501)));
        assert!(!is_valid_document_id("__name__"));
        assert!(!is_valid_document_id("__x__"));
        assert!(is_valid_document_id("__"));
        assert!(is_valid_document_id("abc?x"));
    }
}
