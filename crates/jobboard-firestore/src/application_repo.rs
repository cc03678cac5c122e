//! Job application repository.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use jobboard_models::application::STATUS_FIELD;
use jobboard_models::job::CREATED_AT_FIELD;
use jobboard_models::{
    DeleteResult, Fields, InsertResult, JobApplication, NewApplication, UpdateResult,
};

use crate::error::FirestoreResult;
use crate::query::Query;
use crate::sorting::{created_at_now, sort_by_insertion};
use crate::store::{is_valid_document_id, DocumentStore, StoredDocument};

/// Collection holding job applications.
pub const APPLICATIONS_COLLECTION: &str = "job-applications";

/// Repository for application documents.
#[derive(Clone)]
pub struct ApplicationRepository {
    store: Arc<dyn DocumentStore>,
}

impl ApplicationRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Applications submitted by one applicant, oldest first.
    pub async fn list_by_applicant(&self, email: &str) -> FirestoreResult<Vec<JobApplication>> {
        self.list_where(Query::new().eq("applicant_email", email)).await
    }

    /// Applications referencing a job identifier, oldest first.
    pub async fn list_by_job(&self, job_id: &str) -> FirestoreResult<Vec<JobApplication>> {
        self.list_where(Query::new().eq("job_id", job_id)).await
    }

    async fn list_where(&self, query: Query) -> FirestoreResult<Vec<JobApplication>> {
        let mut docs = self.store.find(APPLICATIONS_COLLECTION, &query).await?;
        sort_by_insertion(&mut docs);
        Ok(docs.into_iter().filter_map(decode_listed).collect())
    }

    pub async fn get(&self, id: &str) -> FirestoreResult<Option<JobApplication>> {
        if !is_valid_document_id(id) {
            return Ok(None);
        }
        self.store
            .get(APPLICATIONS_COLLECTION, id)
            .await?
            .map(into_application)
            .transpose()
    }

    /// Insert a validated application.
    pub async fn create(&self, application: NewApplication) -> FirestoreResult<InsertResult> {
        let mut fields = application.into_fields()?;
        fields.insert(CREATED_AT_FIELD.to_string(), JsonValue::from(created_at_now()));

        let id = self.store.insert(APPLICATIONS_COLLECTION, fields).await?;
        info!(application_id = %id, "Created application");
        Ok(InsertResult::new(id))
    }

    /// Set the review status; a missing application matches nothing.
    pub async fn update_status(&self, id: &str, status: &str) -> FirestoreResult<UpdateResult> {
        if !is_valid_document_id(id) {
            return Ok(UpdateResult::unmatched());
        }
        let mut fields = Fields::new();
        fields.insert(STATUS_FIELD.to_string(), JsonValue::from(status));
        self.store
            .set_fields(APPLICATIONS_COLLECTION, id, fields)
            .await
    }

    pub async fn delete(&self, id: &str) -> FirestoreResult<DeleteResult> {
        if !is_valid_document_id(id) {
            return Ok(DeleteResult::new(0));
        }
        self.store.delete(APPLICATIONS_COLLECTION, id).await
    }
}

fn into_application(doc: StoredDocument) -> FirestoreResult<JobApplication> {
    Ok(JobApplication::from_fields(&doc.id, doc.fields)?)
}

/// Decode one listed document, skipping it if unreadable.
fn decode_listed(doc: StoredDocument) -> Option<JobApplication> {
    let id = doc.id.clone();
    match into_application(doc) {
        Ok(application) => Some(application),
        Err(e) => {
            warn!(application_id = %id, error = %e, "Skipping unreadable application document");
            None
        }
    }
}
