//! Storage layer for Folio.
//!
//! This crate provides implementations of the repository traits defined in
//! `folio-core`: a PostgreSQL adapter for production and an in-memory
//! adapter for tests and local demos. Both return raw windows with the same
//! ordering rules; pagination itself happens in the core.
//!
//! # Usage
//!
//! ```ignore
//! use folio_storage::{Database, DatabaseConfig, PgRepositories};
//!
//! // Connect to the database
//! let config = DatabaseConfig::for_api(&database_url);
//! let db = Database::connect(&config).await?;
//!
//! // Run migrations
//! db.migrate().await?;
//!
//! // Create repositories
//! let repositories = Arc::new(PgRepositories::new(&db));
//! ```

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepositories;
pub use postgres::{Database, DatabaseConfig, PgRepositories};
