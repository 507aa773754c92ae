use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[from] RefreshError),

    #[error("Unauthorized - session has ended")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Request rejected: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Failure of a single refresh exchange.
///
/// Cloneable so one settled refresh can hand the same error to every caller
/// that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("no refresh credential is stored")]
    MissingCredential,

    #[error("refresh credential rejected: {0}")]
    Rejected(String),

    #[error("network failure during refresh: {0}")]
    Network(String),

    #[error("session changed while the refresh was in flight")]
    Superseded,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            400..=499 => ApiError::BadRequest(format!("Status {}: {}", status, truncated)),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Transport-level or 5xx failures: surfaced to the caller, no session change.
    pub fn is_network_or_server(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::ServerError(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<ApiError> for RefreshError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(message) => RefreshError::Network(message),
            ApiError::RefreshFailed(inner) => inner,
            other => RefreshError::Rejected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "nope"),
            ApiError::AccessDenied(ref body) if body == "nope"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "bad title"),
            ApiError::BadRequest(_)
        ));
        assert!(ApiError::from_status(StatusCode::BAD_GATEWAY, "").is_network_or_server());
    }

    #[test]
    fn test_error_body_is_truncated() {
        let body = "x".repeat(2000);
        match ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::ServerError(message) => {
                assert!(message.len() < 600);
                assert!(message.contains("2000 total bytes"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_refresh_error_from_api_error() {
        assert_eq!(
            RefreshError::from(ApiError::Network("reset".into())),
            RefreshError::Network("reset".into())
        );
        assert!(matches!(
            RefreshError::from(ApiError::Unauthorized),
            RefreshError::Rejected(_)
        ));
        assert_eq!(
            RefreshError::from(ApiError::RefreshFailed(RefreshError::Superseded)),
            RefreshError::Superseded
        );
    }
}
