use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use http::request::Parts;
use http::HeaderMap;

use crate::database::models::{User, UserProfile};
use crate::database::Database;

use super::{error_response, internal_error};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_AVATAR_HEADER: &str = "x-user-avatar";

/// The authenticated caller, as asserted by the upstream identity provider.
///
/// Profile headers, when present, refresh the stored user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub id: String,
    pub profile: UserProfile,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Requester {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let id = header_value(headers, USER_ID_HEADER)?;
        let profile = UserProfile {
            email: header_value(headers, USER_EMAIL_HEADER),
            name: header_value(headers, USER_NAME_HEADER),
            avatar_url: header_value(headers, USER_AVATAR_HEADER),
        };
        Some(Self { id, profile })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequesterRejection {
    #[error("missing x-user-id header")]
    Unauthenticated,
    #[error("failed to sync user profile: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for RequesterRejection {
    fn into_response(self) -> Response {
        match self {
            RequesterRejection::Unauthenticated => {
                error_response(StatusCode::UNAUTHORIZED, "authentication required")
            }
            RequesterRejection::Database(e) => internal_error("failed to sync user profile", &e),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Requester
where
    Database: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = RequesterRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let requester =
            Requester::from_headers(&parts.headers).ok_or(RequesterRejection::Unauthenticated)?;

        if !requester.profile.is_empty() {
            let db = Database::from_ref(state);
            User::upsert(&requester.id, &requester.profile, &db).await?;
        }

        Ok(requester)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(Requester::from_headers(&headers).is_none());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        assert!(Requester::from_headers(&headers).is_none());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("user_1"));
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("u1@uni.edu"));
        let requester = Requester::from_headers(&headers).unwrap();
        assert_eq!(requester.id, "user_1");
        assert_eq!(requester.profile.email.as_deref(), Some("u1@uni.edu"));
        assert!(requester.profile.name.is_none());
    }
}
