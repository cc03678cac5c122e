//! Job application handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use jobboard_models::{DeleteResult, InsertResult, JobApplication, NewApplication, StatusUpdate, UpdateResult};

use crate::auth::Principal;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplicantQuery {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteApplicationQuery {
    #[serde(default)]
    pub email: String,
    #[serde(rename = "jobId")]
    pub job_id: Option<String>,
}

/// The caller's applications, enriched with job details.
pub async fn list_my_applications(
    State(state): State<AppState>,
    principal: Principal,
    query: Result<Query<ApplicantQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<JobApplication>>> {
    let Query(query) = query?;
    let applications = state
        .applications
        .list_by_applicant(&principal.email, &query.email)
        .await?;
    Ok(Json(applications))
}

/// Applications submitted for one job.
pub async fn list_job_applications(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Vec<JobApplication>>> {
    Ok(Json(state.applications.list_by_job(&job_id).await?))
}

pub async fn create_application(
    State(state): State<AppState>,
    payload: Result<Json<NewApplication>, JsonRejection>,
) -> ApiResult<Json<InsertResult>> {
    let Json(application) = payload?;
    Ok(Json(state.applications.create(application).await?))
}

/// Withdraw one of the caller's applications.
pub async fn delete_application(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    query: Result<Query<DeleteApplicationQuery>, QueryRejection>,
) -> ApiResult<Json<DeleteResult>> {
    let Query(query) = query?;
    let result = state
        .applications
        .delete(&principal.email, &id, &query.email, query.job_id.as_deref())
        .await?;
    Ok(Json(result))
}

pub async fn update_application_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<UpdateResult>> {
    let Json(update) = payload?;
    Ok(Json(state.applications.update_status(&id, update).await?))
}
