//! Who is making the request.

use axum::{
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, header::LOCATION},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use tracing::warn;
use warden_shared::{Claims, JwtError, JwtService};

/// Cookie carrying the access token for browser requests.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Authentication collaborator of the file-serving and query paths.
pub trait IdentityProvider: Send + Sync {
    /// Claims of the requester.
    ///
    /// `Ok(None)` when no credentials were presented, `Err` when they were
    /// presented but are invalid.
    fn identify(&self, headers: &HeaderMap) -> Result<Option<Claims>, JwtError>;

    /// Response that sends the requester through the login flow and back
    /// to `return_to`.
    fn require_authentication(&self, return_to: &str) -> Response;

    /// Whether the requester presented valid credentials.
    fn is_authenticated(&self, headers: &HeaderMap) -> bool {
        matches!(self.identify(headers), Ok(Some(_)))
    }
}

/// JWT in an `Authorization: Bearer` header or an `access_token` cookie.
#[derive(Debug, Clone)]
pub struct JwtIdentityProvider {
    jwt: JwtService,
    login_url: String,
}

impl JwtIdentityProvider {
    /// Create a provider that redirects anonymous requesters to `login_url`.
    #[must_use]
    pub fn new(jwt: JwtService, login_url: impl Into<String>) -> Self {
        Self {
            jwt,
            login_url: login_url.into(),
        }
    }

    /// Login URL with the return path as `redirect_to`.
    #[must_use]
    pub fn login_redirect_url(&self, return_to: &str) -> String {
        let query = serde_urlencoded::to_string([("redirect_to", return_to)]).unwrap_or_default();
        let separator = if self.login_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.login_url)
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn identify(&self, headers: &HeaderMap) -> Result<Option<Claims>, JwtError> {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(extract_bearer_token)
            .map(str::to_owned);
        let token = bearer.or_else(|| {
            CookieJar::from_headers(headers)
                .get(ACCESS_TOKEN_COOKIE)
                .map(|c| c.value().to_owned())
        });

        match token {
            Some(token) => self.jwt.validate_token(&token).map(Some),
            None => Ok(None),
        }
    }

    fn require_authentication(&self, return_to: &str) -> Response {
        let location = self.login_redirect_url(return_to);
        match location.parse::<axum::http::HeaderValue>() {
            Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
            Err(e) => {
                warn!(error = %e, "login redirect is not a valid header value");
                StatusCode::UNAUTHORIZED.into_response()
            }
        }
    }
}

/// Extracts the bearer token from the Authorization header.
pub(crate) fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}
