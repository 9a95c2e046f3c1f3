//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::UserId;

use crate::error::ApiError;

/// Header carrying the id of the acting user.
pub const USER_HEADER: &str = "x-user-id";

/// The acting user, required.
#[derive(Debug, Clone)]
pub struct RequestUser(pub UserId);

impl<S> FromRequestParts<S> for RequestUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_headers(&parts.headers)?
            .map(RequestUser)
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {USER_HEADER} header")))
    }
}

/// The acting user, when the header is present. A present but blank or
/// non-text header is rejected.
pub fn user_from_headers(headers: &HeaderMap) -> Result<Option<UserId>, ApiError> {
    let Some(value) = headers.get(USER_HEADER) else {
        return Ok(None);
    };

    let invalid = || ApiError::Unauthorized(format!("Invalid {USER_HEADER} header"));
    let text = value.to_str().map_err(|_| invalid())?;
    UserId::new(text).map(Some).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn absent_header_is_none() {
        assert!(user_from_headers(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn present_header_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static(" ops-3 "));
        let user = user_from_headers(&headers).unwrap().unwrap();
        assert_eq!(user.as_str(), "ops-3");
    }

    #[test]
    fn blank_header_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_HEADER, HeaderValue::from_static("   "));
        assert!(matches!(
            user_from_headers(&headers),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
