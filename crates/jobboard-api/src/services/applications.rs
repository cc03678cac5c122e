//! Application workflows: ownership checks, enrichment and the job counter.

use std::collections::HashMap;

use tracing::{info, warn};

use jobboard_firestore::{ApplicationRepository, JobRepository};
use jobboard_models::{
    DeleteResult, InsertResult, JobApplication, NewApplication, StatusUpdate, UpdateResult,
};

use crate::error::{ApiError, ApiResult};

/// Coordinates the application and job repositories.
#[derive(Clone)]
pub struct ApplicationService {
    applications: ApplicationRepository,
    jobs: JobRepository,
}

impl ApplicationService {
    pub fn new(applications: ApplicationRepository, jobs: JobRepository) -> Self {
        Self { applications, jobs }
    }

    /// The caller's own applications, each enriched from its job.
    pub async fn list_by_applicant(
        &self,
        principal_email: &str,
        email: &str,
    ) -> ApiResult<Vec<JobApplication>> {
        if principal_email != email {
            return Err(ApiError::forbidden("forbidden access"));
        }

        let mut applications = self.applications.list_by_applicant(email).await?;

        let job_ids: Vec<String> = applications.iter().map(|a| a.job_id.clone()).collect();
        let jobs = match self.jobs.get_many(&job_ids).await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(error = %e, "Job lookup failed, returning applications unenriched");
                HashMap::new()
            }
        };

        for application in &mut applications {
            if let Some(job) = jobs.get(&application.job_id) {
                application.enrich_from(job);
            }
        }
        Ok(applications)
    }

    pub async fn list_by_job(&self, job_id: &str) -> ApiResult<Vec<JobApplication>> {
        Ok(self.applications.list_by_job(job_id).await?)
    }

    /// Insert the application, then bump the referenced job's counter.
    ///
    /// The two steps are not atomic; a failure in between leaves the counter
    /// one behind.
    pub async fn create(&self, application: NewApplication) -> ApiResult<InsertResult> {
        application.validate()?;
        let job_id = application.job_id.clone();

        let result = self.applications.create(application).await?;

        match self.jobs.get(&job_id).await? {
            Some(job) => {
                let count = job.application_count.unwrap_or(0) + 1;
                self.jobs.set_application_count(&job_id, count).await?;
                info!(job_id = %job_id, count, "Updated application count");
            }
            None => warn!(
                job_id = %job_id,
                application_id = %result.inserted_id,
                "Application references an unknown job, counter not updated"
            ),
        }

        Ok(result)
    }

    /// Delete one of the caller's applications and decrement its job's counter.
    ///
    /// `fallback_job_id` is used when the stored application has no `job_id`.
    pub async fn delete(
        &self,
        principal_email: &str,
        id: &str,
        requester_email: &str,
        fallback_job_id: Option<&str>,
    ) -> ApiResult<DeleteResult> {
        if principal_email != requester_email {
            return Err(ApiError::forbidden("forbidden access"));
        }

        let Some(application) = self.applications.get(id).await? else {
            return Ok(DeleteResult::new(0));
        };
        if application.applicant_email != principal_email {
            return Err(ApiError::forbidden("forbidden access"));
        }

        let result = self.applications.delete(id).await?;
        if result.deleted_count == 0 {
            return Ok(result);
        }

        let job_id = Some(application.job_id.as_str())
            .filter(|s| !s.is_empty())
            .or(fallback_job_id);
        if let Some(job_id) = job_id {
            self.jobs.increment_application_count(job_id, -1).await?;
        }

        info!(application_id = %id, "Deleted application");
        Ok(result)
    }

    pub async fn update_status(&self, id: &str, update: StatusUpdate) -> ApiResult<UpdateResult> {
        update.validate()?;
        Ok(self.applications.update_status(id, &update.status).await?)
    }
}
