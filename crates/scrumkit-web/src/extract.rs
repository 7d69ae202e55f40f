//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use scrumkit_core::auth::Session;

use crate::error::{ApiError, api_error};
use crate::state::AppState;

/// The signed-in user, resolved from `Authorization: Bearer <token>`.
///
/// Browsers cannot set headers on a WebSocket handshake, so an
/// `access_token` query parameter is accepted when the header is absent.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

impl CurrentUser {
    pub fn uid(&self) -> &str {
        &self.0.uid
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .or_else(|| parts.uri.query().and_then(query_token));
        state
            .auth
            .require(token)
            .await
            .map(CurrentUser)
            .map_err(api_error)
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
}

fn query_token(query: &str) -> Option<&str> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("access_token="))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("abc"), None);
    }

    #[test]
    fn test_query_token() {
        assert_eq!(query_token("access_token=abc"), Some("abc"));
        assert_eq!(query_token("x=1&access_token=abc"), Some("abc"));
        assert_eq!(query_token("access_token="), None);
        assert_eq!(query_token("token=abc"), None);
    }
}
