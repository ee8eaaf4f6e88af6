//! Authentication middleware.
//!
//! A single shared bearer token. When `AUTH_SECRET` is set every request to
//! the data routes must carry `Authorization: Bearer <AUTH_SECRET>`; when it
//! is unset the server is open.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::AppState;

/// Authenticated caller extracted from request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthUser {
    /// Presented the configured secret
    Token,
    /// No secret is configured
    Anonymous,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        authorize(auth_header, state.config.auth_secret.as_deref())
    }
}

/// Check an `Authorization` header value against the configured secret.
pub(crate) fn authorize(header: Option<&str>, secret: Option<&str>) -> Result<AuthUser, AppError> {
    let Some(secret) = secret else {
        return Ok(AuthUser::Anonymous);
    };

    match header {
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) if token == secret => Ok(AuthUser::Token),
            Some(_) => Err(AppError::Unauthorized("Invalid bearer token")),
            None => Err(AppError::Unauthorized(
                "Invalid authorization header format",
            )),
        },
        None => Err(AppError::Unauthorized("Missing authorization header")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_server_accepts_anything() {
        assert_eq!(authorize(None, None).unwrap(), AuthUser::Anonymous);
        assert_eq!(
            authorize(Some("Bearer whatever"), None).unwrap(),
            AuthUser::Anonymous
        );
    }

    #[test]
    fn secret_is_enforced() {
        let secret = Some("s3cret");
        assert_eq!(
            authorize(Some("Bearer s3cret"), secret).unwrap(),
            AuthUser::Token
        );
        assert!(matches!(
            authorize(Some("Bearer nope"), secret),
            Err(AppError::Unauthorized("Invalid bearer token"))
        ));
        assert!(matches!(
            authorize(Some("Basic s3cret"), secret),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(None, secret),
            Err(AppError::Unauthorized("Missing authorization header"))
        ));
    }
}
