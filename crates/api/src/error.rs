//! API error mapping.
//!
//! One error type for both surfaces: GraphQL errors carry an extension
//! `code`, REST errors a status and a RealWorld-style body
//! (`{"errors": {"body": [...]}}`).

use async_graphql::ErrorExtensions;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use folio_core::error::DomainError;

/// Errors returned by the GraphQL and REST handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Error raised by the listing services.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Malformed request input outside of pagination (headers, filters).
    #[error("{0}")]
    BadRequest(String),

    /// The operation needs a viewer and none was supplied.
    #[error("{0}")]
    Unauthenticated(String),
}

impl ApiError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::Pagination(_)) | Self::BadRequest(_) => "BAD_USER_INPUT",
            Self::Domain(DomainError::NotFound(_)) => "NOT_FOUND",
            Self::Domain(DomainError::UpstreamUnavailable(_)) => "UPSTREAM_UNAVAILABLE",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Domain(DomainError::Pagination(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Domain(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Domain(DomainError::UpstreamUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message safe to show to clients. Store failures are logged and
    /// replaced by a generic message.
    fn public_message(&self) -> String {
        match self {
            Self::Domain(DomainError::UpstreamUnavailable(cause)) => {
                error!(error = %cause, "Storage failure while serving request");
                "Upstream unavailable, try again later".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.public_message()).extend_with(|_, e| e.set("code", code))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "errors": {
                "code": self.code(),
                "body": [self.public_message()],
            }
        });
        (self.status(), Json(body)).into_response()
    }
}
