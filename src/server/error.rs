//! HTTP mapping of pipeline errors

use crate::error::{Error, ErrorKind};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

impl Error {
    /// Status code for this error at the HTTP boundary
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::NotReady => StatusCode::CONFLICT,
            ErrorKind::Upstream | ErrorKind::Timeout | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to clients; request errors carry their bare text
    fn public_message(&self) -> String {
        match self {
            Error::InvalidRequest(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(kind = ?self.kind(), "Request failed: {}", self);
        } else {
            warn!(kind = ?self.kind(), "Request rejected: {}", self);
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::InvalidRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::InvalidNamespace("../x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::IndexNotFound("Ghost".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::IndexNotReady("Astro".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Llm("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::Timeout(Duration::from_secs(1)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_request_message_is_bare() {
        let err = Error::InvalidRequest("Model name is required".into());
        assert_eq!(err.public_message(), "Model name is required");
        assert_eq!(
            Error::IndexNotFound("Ghost".into()).public_message(),
            "RAG pipeline not created for model 'Ghost'"
        );
    }
}
