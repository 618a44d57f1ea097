//! Port traits for data repositories.
//!
//! These traits define the storage interface used by the domain layer.
//! Implementations live in the infrastructure layer (e.g., `folio-storage`).

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::{Article, ArticleId, Comment, Profile, UserId};
use crate::pagination::PageRequest;

// =============================================================================
// Filter Types
// =============================================================================

/// Filter options for article listings.
///
/// All set fields must match. The default filter lists every article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleFilter {
    /// Only articles written by this username.
    pub author: Option<String>,
    /// Only articles carrying this tag.
    pub tag: Option<String>,
    /// Only articles favorited by this username.
    pub favorited_by: Option<String>,
    /// Only articles whose author is followed by this user (a feed).
    pub followed_by: Option<UserId>,
}

impl ArticleFilter {
    /// Filter for the feed of `user`.
    pub fn feed_of(user: UserId) -> Self {
        Self {
            followed_by: Some(user),
            ..Default::default()
        }
    }
}

// =============================================================================
// Repository Traits
// =============================================================================

/// Repository for articles.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Get article by slug.
    async fn find_by_slug(&self, slug: &str) -> StorageResult<Option<Article>>;

    /// Fetch one raw window of articles.
    ///
    /// Returns at most `page.query_limit()` rows. With a forward request
    /// the rows are created strictly after the cursor, ascending; with a
    /// backward request strictly before it, descending.
    async fn articles_window(
        &self,
        filter: &ArticleFilter,
        page: &PageRequest,
    ) -> StorageResult<Vec<Article>>;
}

/// Repository for comments.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Fetch one raw window of an article's comments.
    ///
    /// Same ordering contract as [`ArticleRepository::articles_window`].
    async fn comments_window(
        &self,
        article: ArticleId,
        page: &PageRequest,
    ) -> StorageResult<Vec<Comment>>;
}

/// Repository for profiles and the follow graph.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Load the profiles of the given users. Unknown ids are skipped.
    async fn profiles(&self, ids: &[UserId]) -> StorageResult<Vec<Profile>>;

    /// The subset of `ids` followed by `viewer`.
    async fn followed_among(&self, viewer: UserId, ids: &[UserId])
    -> StorageResult<HashSet<UserId>>;
}

/// Repository for favorites.
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Number of favorites per article. Articles with none may be absent.
    async fn favorite_counts(&self, ids: &[ArticleId]) -> StorageResult<HashMap<ArticleId, i64>>;

    /// The subset of `ids` favorited by `viewer`.
    async fn favorited_among(
        &self,
        viewer: UserId,
        ids: &[ArticleId],
    ) -> StorageResult<HashSet<ArticleId>>;
}

// =============================================================================
// Composite Repository
// =============================================================================

/// Combined repository access for the services.
#[async_trait]
pub trait Repositories: Send + Sync {
    /// Access the article repository.
    fn articles(&self) -> &dyn ArticleRepository;

    /// Access the comment repository.
    fn comments(&self) -> &dyn CommentRepository;

    /// Access the profile repository.
    fn profiles(&self) -> &dyn ProfileRepository;

    /// Access the favorite repository.
    fn favorites(&self) -> &dyn FavoriteRepository;

    /// Whether the backing store currently answers queries.
    async fn is_healthy(&self) -> bool;
}
