//! Listing service - paginated reads over articles and comments.
//!
//! Every list goes through the same steps:
//!
//! 1. Validate caller arguments into a [`PageRequest`]
//! 2. Fetch one raw window from the repository
//! 3. Trim and order it with [`Pager::paginate`]
//! 4. Enrich the finalized nodes for the current viewer
//!
//! Enrichment runs one batched lookup per concern and only maps nodes, so
//! page info and cursors never change after step 3.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::error::{DomainError, DomainResult, StorageError, StorageResult};
use crate::metrics::{
    FetchTimer, record_fetch_error, record_invalid_page_request, record_page_served,
};
use crate::models::{Article, ArticleId, ArticleView, Comment, CommentView, ProfileView, UserId};
use crate::pagination::{Connection, PageArgs, PageRequest, Pager};
use crate::ports::{ArticleFilter, Repositories};

const ARTICLES: &str = "articles";
const FEED: &str = "feed";
const COMMENTS: &str = "comments";

/// Paginated listings with per-viewer enrichment.
///
/// The viewer is always an explicit argument; anonymous callers pass `None`.
#[derive(Clone)]
pub struct ListingService {
    repositories: Arc<dyn Repositories>,
}

impl ListingService {
    pub fn new(repositories: Arc<dyn Repositories>) -> Self {
        Self { repositories }
    }

    /// Whether the backing store is reachable.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.repositories.is_healthy().await;
        if !healthy {
            warn!("Store health check failed");
        }
        healthy
    }

    /// List articles matching `filter`.
    #[instrument(skip_all, fields(viewer = ?viewer))]
    pub async fn list_articles(
        &self,
        filter: ArticleFilter,
        args: PageArgs,
        viewer: Option<UserId>,
    ) -> DomainResult<Connection<ArticleView>> {
        self.article_page(ARTICLES, filter, args, viewer).await
    }

    /// List articles written by authors the viewer follows.
    #[instrument(skip_all, fields(viewer = %viewer))]
    pub async fn user_feed(
        &self,
        viewer: UserId,
        args: PageArgs,
    ) -> DomainResult<Connection<ArticleView>> {
        self.article_page(FEED, ArticleFilter::feed_of(viewer), args, Some(viewer))
            .await
    }

    /// List the comments of the article identified by `slug`.
    #[instrument(skip_all, fields(slug = %slug, viewer = ?viewer))]
    pub async fn article_comments(
        &self,
        slug: &str,
        args: PageArgs,
        viewer: Option<UserId>,
    ) -> DomainResult<Connection<CommentView>> {
        let page = page_request(COMMENTS, args)?;

        let article = self
            .repositories
            .articles()
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("article '{}'", slug)))?;

        let comments = fetch_window(
            COMMENTS,
            self.repositories.comments().comments_window(article.id, &page),
        )
        .await?;

        let connection = Pager::paginate(comments, &page);
        record_page_served(COMMENTS, page.direction());
        log_window(COMMENTS, &connection);

        let author_ids = unique(connection.nodes().map(|c| c.author_id));
        let authors = self.author_views(&author_ids, viewer).await?;

        connection.try_map_nodes(|comment: Comment| {
            Ok(CommentView {
                author: author_of(&authors, comment.author_id)?,
                comment,
            })
        })
    }

    /// Get a single article by slug.
    #[instrument(skip_all, fields(slug = %slug, viewer = ?viewer))]
    pub async fn article(
        &self,
        slug: &str,
        viewer: Option<UserId>,
    ) -> DomainResult<Option<ArticleView>> {
        let Some(article) = self.repositories.articles().find_by_slug(slug).await? else {
            return Ok(None);
        };

        let lookups = self
            .article_lookups(&[article.id], &[article.author_id], viewer)
            .await?;
        lookups.view(article).map(Some)
    }

    // -------------------------------------------------------------------------
    // Shared steps
    // -------------------------------------------------------------------------

    async fn article_page(
        &self,
        entity: &'static str,
        filter: ArticleFilter,
        args: PageArgs,
        viewer: Option<UserId>,
    ) -> DomainResult<Connection<ArticleView>> {
        let page = page_request(entity, args)?;

        let articles = fetch_window(
            entity,
            self.repositories.articles().articles_window(&filter, &page),
        )
        .await?;

        let connection = Pager::paginate(articles, &page);
        record_page_served(entity, page.direction());
        log_window(entity, &connection);

        let article_ids: Vec<ArticleId> = connection.nodes().map(|a| a.id).collect();
        let author_ids = unique(connection.nodes().map(|a| a.author_id));
        let lookups = self
            .article_lookups(&article_ids, &author_ids, viewer)
            .await?;

        connection.try_map_nodes(|article| lookups.view(article))
    }

    /// Batched lookups needed to decorate a set of articles.
    async fn article_lookups(
        &self,
        article_ids: &[ArticleId],
        author_ids: &[UserId],
        viewer: Option<UserId>,
    ) -> DomainResult<ArticleLookups> {
        if article_ids.is_empty() {
            return Ok(ArticleLookups::default());
        }

        let authors = self.author_views(author_ids, viewer).await?;

        let favorites = self.repositories.favorites();
        let counts = favorites.favorite_counts(article_ids).await?;
        let favorited = match viewer {
            Some(viewer) => favorites.favorited_among(viewer, article_ids).await?,
            None => HashSet::new(),
        };

        Ok(ArticleLookups {
            authors,
            counts,
            favorited,
        })
    }

    /// Profiles of `ids` as seen by `viewer`.
    async fn author_views(
        &self,
        ids: &[UserId],
        viewer: Option<UserId>,
    ) -> StorageResult<HashMap<UserId, ProfileView>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let profiles = self.repositories.profiles();
        let found = profiles.profiles(ids).await?;
        let followed = match viewer {
            Some(viewer) => profiles.followed_among(viewer, ids).await?,
            None => HashSet::new(),
        };

        Ok(found
            .into_iter()
            .map(|profile| {
                let following = followed.contains(&profile.user_id);
                (profile.user_id, ProfileView::new(profile, following))
            })
            .collect())
    }
}

// =============================================================================
// Enrichment
// =============================================================================

#[derive(Default)]
struct ArticleLookups {
    authors: HashMap<UserId, ProfileView>,
    counts: HashMap<ArticleId, i64>,
    favorited: HashSet<ArticleId>,
}

impl ArticleLookups {
    fn view(&self, article: Article) -> DomainResult<ArticleView> {
        Ok(ArticleView {
            author: author_of(&self.authors, article.author_id)?,
            favorited: self.favorited.contains(&article.id),
            favorites_count: self.counts.get(&article.id).copied().unwrap_or(0),
            article,
        })
    }
}

/// Every author referenced by a window must have a profile.
fn author_of(authors: &HashMap<UserId, ProfileView>, id: UserId) -> DomainResult<ProfileView> {
    authors
        .get(&id)
        .cloned()
        .ok_or_else(|| StorageError::NotFound(format!("profile of user {}", id)).into())
}

// =============================================================================
// Helpers
// =============================================================================

/// Validate caller arguments, counting rejections.
fn page_request(entity: &'static str, args: PageArgs) -> DomainResult<PageRequest> {
    args.into_request().map_err(|e| {
        record_invalid_page_request(entity);
        debug!(entity, error = %e, "Rejected page arguments");
        DomainError::from(e)
    })
}

/// Await a repository window fetch, timing it and counting failures.
async fn fetch_window<T, F>(entity: &'static str, fetch: F) -> DomainResult<Vec<T>>
where
    F: Future<Output = StorageResult<Vec<T>>>,
{
    let _timer = FetchTimer::new(entity);
    fetch.await.map_err(|e| {
        record_fetch_error(entity);
        warn!(entity, error = %e, "⚠️  Window fetch failed");
        DomainError::from(e)
    })
}

fn log_window<T>(entity: &'static str, connection: &Connection<T>) {
    debug!(
        entity,
        items = connection.len(),
        has_next = connection.page_info.has_next_page,
        has_previous = connection.page_info.has_previous_page,
        "Window assembled"
    );
}

/// Distinct ids, in first-seen order.
fn unique(ids: impl Iterator<Item = UserId>) -> Vec<UserId> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}
