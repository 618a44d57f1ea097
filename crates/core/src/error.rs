//! Error types for the Folio domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`PaginationError`] - Malformed cursors and page arguments (client errors)
//! - [`StorageError`] - Database/repository errors
//! - [`DomainError`] - Top-level error returned by services
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Pagination Errors
// =============================================================================

/// Errors raised while turning caller input into a page request.
///
/// Both variants are caller mistakes and must never be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// A non-empty cursor token could not be decoded.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Both or neither of the forward/backward sizes were supplied.
    #[error("Invalid page arguments: {0}")]
    InvalidPageArguments(String),
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Database and repository errors.
///
/// These errors originate from storage operations like queries,
/// connection management, and row decoding.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// SQL query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Row data could not be converted into a domain model.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Domain Errors
// =============================================================================

/// Errors returned by the listing services.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Caller supplied unusable pagination input.
    #[error(transparent)]
    Pagination(#[from] PaginationError),

    /// A referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backing store failed. Propagated as is, never retried here.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] StorageError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for pagination input handling.
pub type PaginationResult<T> = Result<T, PaginationError>;
