use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Failure of a single API operation.
///
/// Bulk per-user failures are not represented here; they are logged and
/// swallowed at the call site so partial results can still be returned.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Server { status: StatusCode, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Error body the up-down service sends with non-OK statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl RequestError {
    /// Build a `Server` error from a response body, preferring the server's
    /// own `{"error": ...}` message and falling back to an operation-specific
    /// one when the body has no parseable message.
    pub fn from_error_body(status: StatusCode, body: &str, fallback: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| fallback.to_string());
        RequestError::Server { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_server_message() {
        let err = RequestError::from_error_body(
            StatusCode::BAD_REQUEST,
            r#"{"error":"download already running"}"#,
            "failed to start download",
        );
        assert_eq!(err.to_string(), "server returned 400 Bad Request: download already running");
    }

    #[test]
    fn falls_back_on_unparseable_body() {
        let err = RequestError::from_error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>oops</html>",
            "failed to start download",
        );
        match err {
            RequestError::Server { message, .. } => assert_eq!(message, "failed to start download"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn falls_back_on_missing_error_field() {
        let err =
            RequestError::from_error_body(StatusCode::NOT_FOUND, r#"{"status":"gone"}"#, "not found");
        match err {
            RequestError::Server { message, .. } => assert_eq!(message, "not found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
