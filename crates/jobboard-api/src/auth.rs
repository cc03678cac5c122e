//! Cookie-based session authentication.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;

use crate::error::ApiError;
use crate::session::SessionClaims;
use crate::state::AppState;

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "token";

/// Authenticated caller, decoded from the session cookie.
///
/// Using this extractor makes a handler require a valid session: a missing
/// cookie is rejected with 401, an invalid or expired token with 403.
#[derive(Debug, Clone)]
pub struct Principal {
    pub email: String,
    pub claims: SessionClaims,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::unauthenticated("unauthorized access"))?;

        let claims = state.sessions.verify(token).map_err(|e| {
            debug!(error = %e, "Rejected session token");
            ApiError::invalid_session("unauthorized access")
        })?;

        Ok(Principal {
            email: claims.email.clone(),
            claims,
        })
    }
}

/// Session cookie carrying a freshly issued token.
///
/// Production front-ends live on another site, so the cookie must be
/// `Secure; SameSite=None` there.
pub fn session_cookie(token: String, production: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .secure(production)
        .same_site(if production {
            SameSite::None
        } else {
            SameSite::Strict
        })
        .build()
}

/// Expired session cookie with the same attributes, clearing it in the browser.
pub fn removal_cookie(production: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), production);
    cookie.make_removal();
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_cookie_attributes() {
        let cookie = session_cookie("abc".into(), false);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_ne!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_production_cookie_attributes() {
        let cookie = session_cookie("abc".into(), true);
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = removal_cookie(true);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age().map(|d| d.whole_seconds()), Some(0));
    }
}
