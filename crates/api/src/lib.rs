//! HTTP API for Folio.
//!
//! Serves the paginated listings of `folio-core` over two surfaces:
//!
//! - GraphQL at `/graphql`: `articles`, `feed`, `comments` and `article`,
//!   with Relay-style connections
//! - REST under `/api/articles`, with the page info flattened next to the
//!   items
//!
//! Both read the viewer from the `x-viewer-id` header and share the same
//! error mapping ([`ApiError`]).
//!
//! ```ignore
//! use folio_api::{AppState, ServerConfig, serve_with_shutdown};
//!
//! let state = AppState::new(ListingService::new(repositories));
//! serve_with_shutdown(state, ServerConfig::default(), shutdown).await?;
//! ```

mod error;
mod rest;
mod schema;
mod server;
mod types;

pub use error::ApiError;
pub use schema::{MAX_QUERY_COMPLEXITY, MAX_QUERY_DEPTH, Query, build_schema};
pub use server::{AppState, ServerConfig, router, serve_with_shutdown};
pub use types::{FolioSchema, VIEWER_HEADER, Viewer};
