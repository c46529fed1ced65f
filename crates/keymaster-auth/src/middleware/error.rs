//! Error response handling for the middleware boundary.
//!
//! This module implements `IntoResponse` for `AuthError`, mapping the
//! failure taxonomy to transport responses. The mapping is a pure
//! function of the error value; the core never produces HTTP concepts
//! itself.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, oauth_error, message) = error_details(&self);

        let body = json!({
            "error": oauth_error,
            "error_description": message,
        });

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(oauth_error, &message);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        (status, headers, Json(body)).into_response()
    }
}

/// Extracts response details from an `AuthError`.
///
/// Returns (HTTP status, OAuth error code, message). Messages never carry
/// internal state - key material, raw tokens, or backtraces.
fn error_details(error: &AuthError) -> (StatusCode, &'static str, String) {
    let status = match error {
        AuthError::MissingToken
        | AuthError::Malformed { .. }
        | AuthError::InvalidSignature
        | AuthError::Expired
        | AuthError::Revoked => StatusCode::UNAUTHORIZED,
        AuthError::InvalidCredentials | AuthError::AlreadyRotated | AuthError::NotFound => {
            StatusCode::BAD_REQUEST
        }
        AuthError::TransientStoreFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Configuration { .. } | AuthError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let message = match error {
        // Server-side failure details stay in the logs
        AuthError::Configuration { .. } | AuthError::Internal { .. } => {
            "Internal server error".to_string()
        }
        other => other.to_string(),
    };

    (status, error.oauth_error_code(), message)
}

/// Builds a `WWW-Authenticate` header value per RFC 6750.
fn build_www_authenticate_header(oauth_error: &str, message: &str) -> String {
    format!(
        "Bearer error=\"{}\", error_description=\"{}\"",
        oauth_error,
        message.replace('"', "'")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_mappings() {
        for error in [
            AuthError::MissingToken,
            AuthError::InvalidSignature,
            AuthError::Expired,
            AuthError::Revoked,
            AuthError::malformed("bad segment count"),
        ] {
            let (status, _, _) = error_details(&error);
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_definitive_grant_rejections_are_400() {
        for error in [
            AuthError::InvalidCredentials,
            AuthError::AlreadyRotated,
            AuthError::NotFound,
        ] {
            let (status, _, _) = error_details(&error);
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_transient_failure_is_503() {
        let (status, code, _) = error_details(&AuthError::transient("timeout"));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "temporarily_unavailable");
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let (status, _, message) =
            error_details(&AuthError::internal("signing key /etc/keys/k1.pem unreadable"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }

    #[test]
    fn test_www_authenticate_header() {
        let header = build_www_authenticate_header("invalid_token", "Token expired");
        assert_eq!(
            header,
            "Bearer error=\"invalid_token\", error_description=\"Token expired\""
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = AuthError::Expired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

        let response = AuthError::transient("x").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
    }
}
