//! Session issue and logout handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tracing::info;

use jobboard_models::Fields;

use crate::auth::{removal_cookie, session_cookie};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Issue a session token for the submitted identity and set it as a cookie.
pub async fn issue_session(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<Fields>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<SuccessResponse>)> {
    let Json(identity) = payload?;
    let token = state.sessions.issue(identity)?;
    info!("Issued session token");

    let jar = jar.add(session_cookie(token, state.config.is_production()));
    Ok((jar, Json(SuccessResponse { success: true })))
}

/// Clear the session cookie.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    let jar = jar.add(removal_cookie(state.config.is_production()));
    (jar, Json(SuccessResponse { success: true }))
}
