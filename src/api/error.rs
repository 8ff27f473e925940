use thiserror::Error;

/// Errors from Central Server calls. Every HTTP variant carries the
/// numeric status in its message so call sites can surface it
/// directly in a notification.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("401 Unauthorized: {0}")]
    Unauthorized(String),

    #[error("403 Forbidden: {0}")]
    AccessDenied(String),

    #[error("404 Not Found: {0}")]
    NotFound(String),

    #[error("{status} {reason}: {body}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid dragging whole payloads into
    /// log lines and notifications.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            // Back off to a char boundary so slicing never panics
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..end],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(truncated),
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            code => ApiError::Status {
                status: code,
                reason: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
                body: truncated,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_message_contains_status_code() {
        let err = ApiError::from_status(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error": "invalid_grant"}"#,
        );
        let message = err.to_string();
        assert!(message.contains("401"), "message was: {}", message);
    }

    #[test]
    fn test_server_error_carries_status_and_reason() {
        let err = ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom");
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("Internal Server Error"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_invalid_response_names_the_parse_failure() {
        let err = ApiError::InvalidResponse("token response: missing field `access_token`".into());
        let message = err.to_string();
        assert!(message.contains("Invalid response"));
        assert!(message.contains("access_token"));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(2000);
        let err = ApiError::from_status(reqwest::StatusCode::BAD_GATEWAY, &body);
        let message = err.to_string();
        assert!(message.contains("truncated"));
        assert!(message.len() < body.len());
    }
}
