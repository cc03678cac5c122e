//! Job posting handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use jobboard_models::{InsertResult, Job, JobFilter, NewJob};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query string of the job listing.
///
/// Empty values are treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub email: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "minPrize")]
    pub min_prize: Option<String>,
    #[serde(rename = "maxPrize")]
    pub max_prize: Option<String>,
}

impl JobListQuery {
    pub fn into_filter(self) -> ApiResult<JobFilter> {
        let min = parse_amount("minPrize", self.min_prize)?;
        let max = parse_amount("maxPrize", self.max_prize)?;

        let filter = JobFilter {
            owner_email: non_empty(self.email),
            sort_by_min_salary: self.sort.as_deref() == Some("true"),
            location_search: non_empty(self.search),
            salary_bounds: None,
        };
        Ok(filter.with_salary_bounds(min, max))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn parse_amount(name: &str, value: Option<String>) -> ApiResult<Option<i64>> {
    match non_empty(value) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{} must be an integer, got '{}'", name, raw))),
    }
}

/// List jobs matching the query.
pub async fn list_jobs(
    State(state): State<AppState>,
    query: Result<Query<JobListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Job>>> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    Ok(Json(state.jobs.list(&filter).await?))
}

/// Fetch one job; `null` when it does not exist.
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<Job>>> {
    Ok(Json(state.jobs.get(&id).await?))
}

/// Post a new job.
pub async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<NewJob>, JsonRejection>,
) -> ApiResult<Json<InsertResult>> {
    let Json(job) = payload?;
    job.validate()?;
    Ok(Json(state.jobs.create(job).await?))
}
