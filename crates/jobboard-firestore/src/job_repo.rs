//! Job posting repository.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use jobboard_models::job::{APPLICATION_COUNT_FIELD, CREATED_AT_FIELD};
use jobboard_models::{Fields, InsertResult, Job, JobFilter, NewJob, UpdateResult};

use crate::error::FirestoreResult;
use crate::query::Query;
use crate::sorting::{created_at_now, sort_by_insertion, sort_by_min_salary};
use crate::store::{is_valid_document_id, DocumentStore, StoredDocument};

/// Collection holding job postings.
pub const JOBS_COLLECTION: &str = "jobs";

/// Repository for job documents.
#[derive(Clone)]
pub struct JobRepository {
    store: Arc<dyn DocumentStore>,
}

impl JobRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Jobs matching every predicate in the filter.
    ///
    /// Equality and salary bounds go to the store; the location search and
    /// ordering are applied here.
    pub async fn list(&self, filter: &JobFilter) -> FirestoreResult<Vec<Job>> {
        let mut query = Query::new();
        if let Some(owner) = &filter.owner_email {
            query = query.eq("hr_email", owner.as_str());
        }
        if let Some(bounds) = filter.salary_bounds {
            query = query
                .gte("salaryRange.min", bounds.min)
                .lte("salaryRange.max", bounds.max);
        }

        let mut docs = self.store.find(JOBS_COLLECTION, &query).await?;
        sort_by_insertion(&mut docs);

        let mut jobs: Vec<Job> = docs
            .into_iter()
            .filter_map(decode_listed)
            .filter(|job| filter.matches(job))
            .collect();

        if filter.sort_by_min_salary {
            sort_by_min_salary(&mut jobs);
        }

        debug!(count = jobs.len(), "Listed jobs");
        Ok(jobs)
    }

    /// Get a job by identifier; `None` when absent or the id is malformed.
    pub async fn get(&self, id: &str) -> FirestoreResult<Option<Job>> {
        if !is_valid_document_id(id) {
            return Ok(None);
        }
        self.store
            .get(JOBS_COLLECTION, id)
            .await?
            .map(into_job)
            .transpose()
    }

    /// Jobs by identifier, keyed by id. Unknown or malformed ids are skipped.
    pub async fn get_many(&self, ids: &[String]) -> FirestoreResult<HashMap<String, Job>> {
        let mut wanted: Vec<String> = ids
            .iter()
            .filter(|id| is_valid_document_id(id))
            .cloned()
            .collect();
        wanted.sort();
        wanted.dedup();
        if wanted.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(self
            .store
            .get_many(JOBS_COLLECTION, &wanted)
            .await?
            .into_iter()
            .filter_map(decode_listed)
            .map(|job| (job.id.0.clone(), job))
            .collect())
    }

    /// Insert a validated posting.
    pub async fn create(&self, job: NewJob) -> FirestoreResult<InsertResult> {
        let mut fields = job.into_fields()?;
        fields.insert(CREATED_AT_FIELD.to_string(), JsonValue::from(created_at_now()));

        let id = self.store.insert(JOBS_COLLECTION, fields).await?;
        info!(job_id = %id, "Created job");
        Ok(InsertResult::new(id))
    }

    /// Add `delta` to the application counter; a missing counter counts as 0.
    pub async fn increment_application_count(
        &self,
        id: &str,
        delta: i64,
    ) -> FirestoreResult<UpdateResult> {
        if !is_valid_document_id(id) {
            return Ok(UpdateResult::unmatched());
        }
        self.store
            .increment(JOBS_COLLECTION, id, APPLICATION_COUNT_FIELD, delta)
            .await
    }

    /// Overwrite the application counter.
    pub async fn set_application_count(&self, id: &str, count: i64) -> FirestoreResult<UpdateResult> {
        if !is_valid_document_id(id) {
            return Ok(UpdateResult::unmatched());
        }
        let mut fields = Fields::new();
        fields.insert(APPLICATION_COUNT_FIELD.to_string(), JsonValue::from(count));
        self.store.set_fields(JOBS_COLLECTION, id, fields).await
    }
}

fn into_job(doc: StoredDocument) -> FirestoreResult<Job> {
    Ok(Job::from_fields(&doc.id, doc.fields)?)
}

/// Decode one document of a multi-document read, skipping it if unreadable.
fn decode_listed(doc: StoredDocument) -> Option<Job> {
    let id = doc.id.clone();
    match into_job(doc) {
        Ok(job) => Some(job),
        Err(e) => {
            warn!(job_id = %id, error = %e, "Skipping unreadable job document");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;

    fn repo() -> JobRepository {
        JobRepository::new(Arc::new(MemoryStore::new()))
    }

    fn posting(value: JsonValue) -> NewJob {
        serde_json::from_value(value).unwrap()
    }

    async fn seed(repo: &JobRepository) -> Vec<String> {
        let postings = [
            json!({"title": "Engineer", "hr_email": "a@x.com", "location": "Dhaka",
                   "salaryRange": {"min": 50000, "max": 90000}}),
            json!({"title": "Designer", "hr_email": "b@x.com", "location": "Remote",
                   "salaryRange": {"min": 60000, "max": 80000}}),
            json!({"title": "Intern", "hr_email": "a@x.com", "location": "Halishahar, Dhaka",
                   "salaryRange": {"min": 10000, "max": 20000}}),
            json!({"title": "Volunteer", "hr_email": "c@x.com"}),
        ];
        let mut ids = Vec::new();
        for p in postings {
            ids.push(repo.create(posting(p)).await.unwrap().inserted_id);
        }
        ids
    }

    fn titles(jobs: &[Job]) -> Vec<&str> {
        jobs.iter().map(|j| j.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_without_filter_keeps_insertion_order() {
        let repo = repo();
        seed(&repo).await;

        let jobs = repo.list(&JobFilter::default()).await.unwrap();
        assert_eq!(titles(&jobs), vec!["Engineer", "Designer", "Intern", "Volunteer"]);
        assert!(jobs.iter().all(|j| j.created_at.is_some()));
    }

    #[tokio::test]
    async fn test_list_by_owner_and_location() {
        let repo = repo();
        seed(&repo).await;

        let filter = JobFilter {
            owner_email: Some("a@x.com".into()),
            location_search: Some("halishahar".into()),
            ..Default::default()
        };
        assert_eq!(titles(&repo.list(&filter).await.unwrap()), vec!["Intern"]);
    }

    #[tokio::test]
    async fn test_salary_bounds_and_sorting() {
        let repo = repo();
        seed(&repo).await;

        let window = JobFilter::default().with_salary_bounds(Some(60000), Some(80000));
        assert_eq!(titles(&repo.list(&window).await.unwrap()), vec!["Designer"]);

        let half_window = JobFilter::default().with_salary_bounds(Some(60000), None);
        assert_eq!(repo.list(&half_window).await.unwrap().len(), 4);

        let sorted = JobFilter {
            sort_by_min_salary: true,
            ..Default::default()
        };
        assert_eq!(
            titles(&repo.list(&sorted).await.unwrap()),
            vec!["Volunteer", "Intern", "Engineer", "Designer"]
        );
    }

    #[tokio::test]
    async fn test_get_handles_missing_and_malformed_ids() {
        let repo = repo();
        let ids = seed(&repo).await;

        let job = repo.get(&ids[0]).await.unwrap().unwrap();
        assert_eq!(job.title, "Engineer");
        assert!(repo.get("does-not-exist").await.unwrap().is_none());
        assert!(repo.get("jobs/../x").await.unwrap().is_none());
        assert!(repo.get("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_many_skips_unknown() {
        let repo = repo();
        let ids = seed(&repo).await;

        let found = repo
            .get_many(&[ids[1].clone(), "nope".into(), ids[1].clone(), "a/b".into()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&ids[1]].title, "Designer");
    }

    #[tokio::test]
    async fn test_application_counter() {
        let repo = repo();
        let ids = seed(&repo).await;

        repo.set_application_count(&ids[0], 1).await.unwrap();
        repo.increment_application_count(&ids[0], 1).await.unwrap();
        assert_eq!(repo.get(&ids[0]).await.unwrap().unwrap().application_count, Some(2));

        repo.increment_application_count(&ids[0], -1).await.unwrap();
        assert_eq!(repo.get(&ids[0]).await.unwrap().unwrap().application_count, Some(1));

        let missing = repo.increment_application_count("missing", 1).await.unwrap();
        assert_eq!(missing.matched_count, 0);
        let missing = repo.set_application_count("missing", 1).await.unwrap();
        assert_eq!(missing.matched_count, 0);
    }

    fn raw(value: JsonValue) -> Fields {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_legacy_salary_amounts_are_listed_and_filtered() {
        let store = Arc::new(MemoryStore::new());
        let repo = JobRepository::new(store.clone());
        store
            .insert(
                JOBS_COLLECTION,
                raw(json!({"title": "Legacy", "hr_email": "a@x.com",
                           "salaryRange": {"min": "50000", "max": "90000"}})),
            )
            .await
            .unwrap();
        seed(&repo).await;

        let jobs = repo.list(&JobFilter::default()).await.unwrap();
        assert_eq!(jobs.len(), 5);
        assert_eq!(jobs[0].min_salary(), Some(50000));

        let sorted = JobFilter {
            sort_by_min_salary: true,
            ..Default::default()
        };
        let sorted = repo.list(&sorted).await.unwrap();
        assert_eq!(
            titles(&sorted),
            vec!["Volunteer", "Intern", "Legacy", "Engineer", "Designer"]
        );
    }

    #[tokio::test]
    async fn test_unreadable_job_is_skipped_by_listings() {
        let store = Arc::new(MemoryStore::new());
        let repo = JobRepository::new(store.clone());
        let broken = store
            .insert(JOBS_COLLECTION, raw(json!({"title": {"en": "Broken"}, "hr_email": "a@x.com"})))
            .await
            .unwrap();
        let ids = seed(&repo).await;

        let jobs = repo.list(&JobFilter::default()).await.unwrap();
        assert_eq!(titles(&jobs), vec!["Engineer", "Designer", "Intern", "Volunteer"]);

        let found = repo.get_many(&[broken.clone(), ids[0].clone()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key(&ids[0]));
        assert!(!found.contains_key(&broken));
    }
}
