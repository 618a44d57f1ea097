//! Core domain layer for Folio.
//!
//! This crate contains the domain models, port traits (interfaces), the
//! keyset pagination engine and the listing services. It follows
//! hexagonal architecture principles - this is the innermost layer with
//! no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      folio (binary)                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │          folio-api           │         folio-storage        │
//! │      (GraphQL + REST)        │   (PostgreSQL, in-memory)    │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │                     folio-core  ← YOU ARE HERE              │
//! │         (models, ports, pagination, services)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Article, Comment, Profile) and enriched views
//! - [`ports`] - Repository traits for adapters to implement
//! - [`pagination`] - Cursor codec, page requests and the pager
//! - [`services`] - Paginated listings with viewer enrichment
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Key Concepts
//!
//! ## Windows
//!
//! Repositories never paginate. They return one raw window of at most
//! `size + 1` rows ordered for the requested direction, and the
//! [`pagination::Pager`] turns it into a connection. The extra row is the
//! only signal that more data exists; no count query is ever issued.
//!
//! ## Cursors
//!
//! A cursor is the creation instant of a row as epoch milliseconds in
//! base 10. Clients treat it as opaque.

pub mod error;
pub mod metrics;
pub mod models;
pub mod pagination;
pub mod ports;
pub mod services;
