//! PostgreSQL storage adapter.
//!
//! This module implements the repository traits defined in `folio-core`
//! using PostgreSQL as the backing store.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool and migrations
//! - [`PgRepositories`] - Composite repository implementing `Repositories` trait
//! - Individual repos: `PgArticleRepository`, `PgCommentRepository`, etc.
//!
//! Every window query has the same shape:
//!
//! ```text
//! SELECT ... WHERE <filters> AND created_at > $n ORDER BY created_at ASC  LIMIT size + 1
//! SELECT ... WHERE <filters> AND created_at < $n ORDER BY created_at DESC LIMIT size + 1
//! ```

mod article_repo;
mod comment_repo;
mod database;
mod helpers;
mod profile_repo;

pub use article_repo::PgArticleRepository;
pub use comment_repo::PgCommentRepository;
pub use database::{Database, DatabaseConfig};
pub use profile_repo::{PgFavoriteRepository, PgProfileRepository};

use async_trait::async_trait;
use folio_core::ports::{
    ArticleRepository, CommentRepository, FavoriteRepository, ProfileRepository, Repositories,
};

/// Aggregated PostgreSQL repositories implementing the `Repositories` trait.
pub struct PgRepositories {
    db: Database,
    articles: PgArticleRepository,
    comments: PgCommentRepository,
    profiles: PgProfileRepository,
    favorites: PgFavoriteRepository,
}

impl PgRepositories {
    /// Create a new repository aggregate sharing the pool of `db`.
    pub fn new(db: &Database) -> Self {
        let pool = db.pool();
        Self {
            db: db.clone(),
            articles: PgArticleRepository::new(pool.clone()),
            comments: PgCommentRepository::new(pool.clone()),
            profiles: PgProfileRepository::new(pool.clone()),
            favorites: PgFavoriteRepository::new(pool.clone()),
        }
    }
}

#[async_trait]
impl Repositories for PgRepositories {
    fn articles(&self) -> &dyn ArticleRepository {
        &self.articles
    }

    fn comments(&self) -> &dyn CommentRepository {
        &self.comments
    }

    fn profiles(&self) -> &dyn ProfileRepository {
        &self.profiles
    }

    fn favorites(&self) -> &dyn FavoriteRepository {
        &self.favorites
    }

    async fn is_healthy(&self) -> bool {
        self.db.is_healthy().await
    }
}
