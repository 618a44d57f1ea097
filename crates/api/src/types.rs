//! Shared API types.

use async_graphql::{EmptyMutation, EmptySubscription, Schema};
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;

use folio_core::models::UserId;

use crate::error::ApiError;
use crate::schema::Query;

/// The GraphQL schema type.
pub type FolioSchema = Schema<Query, EmptyMutation, EmptySubscription>;

/// Header carrying the authenticated user id, set by the upstream gateway.
pub const VIEWER_HEADER: &str = "x-viewer-id";

/// The user on whose behalf a request runs. `None` for anonymous callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer(pub Option<UserId>);

impl Viewer {
    /// Read the viewer from request headers.
    ///
    /// A missing or empty header means anonymous; anything else must be a
    /// positive integer id.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let Some(value) = headers.get(VIEWER_HEADER) else {
            return Ok(Self(None));
        };

        let raw = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("{} is not valid text", VIEWER_HEADER)))?
            .trim();
        if raw.is_empty() {
            return Ok(Self(None));
        }

        match raw.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(Some(UserId(id)))),
            _ => Err(ApiError::BadRequest(format!(
                "{} must be a positive integer, got '{}'",
                VIEWER_HEADER, raw
            ))),
        }
    }

    /// The viewer id, or an error for operations that need one.
    pub fn require(self) -> Result<UserId, ApiError> {
        self.0.ok_or_else(|| {
            ApiError::Unauthenticated(format!("this operation requires the {} header", VIEWER_HEADER))
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
