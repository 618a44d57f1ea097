//! In-memory storage adapter.
//!
//! Holds every entity in sorted vectors behind a lock and cuts windows with
//! [`Pager::window`], so the ordering rules match the PostgreSQL adapter
//! exactly. Used by the API tests and by `folio --in-memory`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use folio_core::error::{StorageError, StorageResult};
use folio_core::models::{Article, ArticleId, Comment, CommentId, Profile, UserId};
use folio_core::pagination::{Cursor, PageRequest, Pager};
use folio_core::ports::{
    ArticleFilter, ArticleRepository, CommentRepository, FavoriteRepository, ProfileRepository,
    Repositories,
};

#[derive(Default)]
struct MemoryStore {
    profiles: Vec<Profile>,
    follows: HashSet<(UserId, UserId)>,
    /// Sorted ascending by `created_at`, insertion order among equals.
    articles: Vec<Article>,
    favorites: HashSet<(UserId, ArticleId)>,
    /// Sorted ascending by `created_at`, insertion order among equals.
    comments: Vec<Comment>,
}

impl MemoryStore {
    fn user_named(&self, username: &str) -> Option<UserId> {
        self.profiles
            .iter()
            .find(|p| p.username == username)
            .map(|p| p.user_id)
    }

    fn matches(&self, article: &Article, filter: &ArticleFilter) -> bool {
        let by_author = filter
            .author
            .as_deref()
            .is_none_or(|name| self.user_named(name) == Some(article.author_id));
        let by_tag = filter
            .tag
            .as_ref()
            .is_none_or(|tag| article.tags.contains(tag));
        let by_favoriter = filter.favorited_by.as_deref().is_none_or(|name| {
            self.user_named(name)
                .is_some_and(|user| self.favorites.contains(&(user, article.id)))
        });
        let by_follower = filter
            .followed_by
            .is_none_or(|follower| self.follows.contains(&(follower, article.author_id)));

        by_author && by_tag && by_favoriter && by_follower
    }
}

/// Repositories backed by process memory.
#[derive(Default)]
pub struct MemoryRepositories {
    store: RwLock<MemoryStore>,
    offline: AtomicBool,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------------

    /// Register a user and return its id.
    pub fn add_user(&self, username: &str) -> UserId {
        let mut store = self.write();
        let id = UserId(store.profiles.len() as i64 + 1);
        store.profiles.push(Profile {
            user_id: id,
            username: username.to_string(),
            bio: None,
            image: None,
        });
        id
    }

    /// Publish an article and return its id.
    ///
    /// The creation instant is truncated to milliseconds, like the
    /// database column.
    pub fn add_article(
        &self,
        author: UserId,
        slug: &str,
        tags: &[&str],
        created_at: DateTime<Utc>,
    ) -> ArticleId {
        let mut store = self.write();
        let id = ArticleId(store.articles.len() as i64 + 1);
        let created_at = Cursor::from_timestamp(created_at).timestamp();
        let article = Article {
            id,
            slug: slug.to_string(),
            title: title_of(slug),
            description: format!("About {}", slug),
            body: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            author_id: author,
            created_at,
            updated_at: created_at,
        };
        let at = store.articles.partition_point(|a| a.created_at <= created_at);
        store.articles.insert(at, article);
        id
    }

    /// Post a comment on an article and return its id.
    pub fn add_comment(
        &self,
        article: ArticleId,
        author: UserId,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> CommentId {
        let mut store = self.write();
        let id = CommentId(store.comments.len() as i64 + 1);
        let created_at = Cursor::from_timestamp(created_at).timestamp();
        let comment = Comment {
            id,
            article_id: article,
            author_id: author,
            body: body.to_string(),
            created_at,
            updated_at: created_at,
        };
        let at = store.comments.partition_point(|c| c.created_at <= created_at);
        store.comments.insert(at, comment);
        id
    }

    pub fn follow(&self, follower: UserId, followee: UserId) {
        self.write().follows.insert((follower, followee));
    }

    pub fn favorite(&self, user: UserId, article: ArticleId) {
        self.write().favorites.insert((user, article));
    }

    /// Make every read fail as if the database were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// A small browsable data set for `folio --in-memory`.
    ///
    /// Three users; `reader` follows `anna` and favorites every fifth
    /// article. Forty articles one minute apart, alternating authors,
    /// the first one carrying five comments.
    pub fn demo() -> Self {
        let repos = Self::new();
        let jake = repos.add_user("jake");
        let anna = repos.add_user("anna");
        let reader = repos.add_user("reader");
        repos.follow(reader, anna);

        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
        for i in 0..40 {
            let (author, tag) = if i % 2 == 0 { (jake, "rust") } else { (anna, "sql") };
            let id = repos.add_article(
                author,
                &format!("article-{}", i + 1),
                &[tag, "demo"],
                start + Duration::minutes(i),
            );
            if i % 5 == 1 {
                repos.favorite(reader, id);
            }
        }
        for i in 0..5 {
            repos.add_comment(
                ArticleId(1),
                if i % 2 == 0 { anna } else { reader },
                &format!("Comment {}", i + 1),
                start + Duration::hours(1) + Duration::seconds(i),
            );
        }
        repos
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, MemoryStore>> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(StorageError::ConnectionError(
                "memory store is offline".to_string(),
            ));
        }
        Ok(self.store.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn title_of(slug: &str) -> String {
    let mut title = slug.replace('-', " ");
    if let Some(first) = title.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    title
}

#[async_trait]
impl ArticleRepository for MemoryRepositories {
    async fn find_by_slug(&self, slug: &str) -> StorageResult<Option<Article>> {
        let store = self.read()?;
        Ok(store.articles.iter().find(|a| a.slug == slug).cloned())
    }

    async fn articles_window(
        &self,
        filter: &ArticleFilter,
        page: &PageRequest,
    ) -> StorageResult<Vec<Article>> {
        let store = self.read()?;
        let matching: Vec<&Article> = store
            .articles
            .iter()
            .filter(|a| store.matches(a, filter))
            .collect();

        Ok(Pager::window(&matching, page)
            .into_iter()
            .map(|a| (*a).clone())
            .collect())
    }
}

#[async_trait]
impl CommentRepository for MemoryRepositories {
    async fn comments_window(
        &self,
        article: ArticleId,
        page: &PageRequest,
    ) -> StorageResult<Vec<Comment>> {
        let store = self.read()?;
        let on_article: Vec<&Comment> = store
            .comments
            .iter()
            .filter(|c| c.article_id == article)
            .collect();

        Ok(Pager::window(&on_article, page)
            .into_iter()
            .map(|c| (*c).clone())
            .collect())
    }
}

#[async_trait]
impl ProfileRepository for MemoryRepositories {
    async fn profiles(&self, ids: &[UserId]) -> StorageResult<Vec<Profile>> {
        let store = self.read()?;
        Ok(store
            .profiles
            .iter()
            .filter(|p| ids.contains(&p.user_id))
            .cloned()
            .collect())
    }

    async fn followed_among(
        &self,
        viewer: UserId,
        ids: &[UserId],
    ) -> StorageResult<HashSet<UserId>> {
        let store = self.read()?;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| store.follows.contains(&(viewer, *id)))
            .collect())
    }
}

#[async_trait]
impl FavoriteRepository for MemoryRepositories {
    async fn favorite_counts(&self, ids: &[ArticleId]) -> StorageResult<HashMap<ArticleId, i64>> {
        let store = self.read()?;
        let mut counts = HashMap::new();
        for (_, article) in store.favorites.iter().filter(|(_, a)| ids.contains(a)) {
            *counts.entry(*article).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn favorited_among(
        &self,
        viewer: UserId,
        ids: &[ArticleId],
    ) -> StorageResult<HashSet<ArticleId>> {
        let store = self.read()?;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| store.favorites.contains(&(viewer, *id)))
            .collect())
    }
}

#[async_trait]
impl Repositories for MemoryRepositories {
    fn articles(&self) -> &dyn ArticleRepository {
        self
    }

    fn comments(&self) -> &dyn CommentRepository {
        self
    }

    fn profiles(&self) -> &dyn ProfileRepository {
        self
    }

    fn favorites(&self) -> &dyn FavoriteRepository {
        self
    }

    async fn is_healthy(&self) -> bool {
        !self.offline.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::pagination::PageDirection;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn seeded() -> (MemoryRepositories, UserId, UserId) {
        let repos = MemoryRepositories::new();
        let jake = repos.add_user("jake");
        let anna = repos.add_user("anna");
        // Inserted out of order on purpose.
        repos.add_article(jake, "c", &["rust"], at(3000));
        repos.add_article(anna, "a", &["sql"], at(1000));
        repos.add_article(jake, "b", &["rust", "sql"], at(2000));
        (repos, jake, anna)
    }

    fn slugs(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.slug.as_str()).collect()
    }

    #[tokio::test]
    async fn test_window_forward_is_ascending() {
        let (repos, _, _) = seeded();
        let window = repos
            .articles_window(&ArticleFilter::default(), &PageRequest::first_page(10))
            .await
            .unwrap();
        assert_eq!(slugs(&window), vec!["a", "b", "c"]);
    }

    // Test critique: vers l'arrière, les lignes les plus proches du curseur d'abord
    #[tokio::test]
    async fn test_window_backward_is_descending_from_cursor() {
        let (repos, _, _) = seeded();
        let page = PageRequest::new(Cursor::from_millis(3000), 10, PageDirection::Prev);
        let window = repos
            .articles_window(&ArticleFilter::default(), &page)
            .await
            .unwrap();
        assert_eq!(slugs(&window), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_window_fetches_one_extra_row() {
        let (repos, _, _) = seeded();
        let window = repos
            .articles_window(&ArticleFilter::default(), &PageRequest::first_page(2))
            .await
            .unwrap();
        assert_eq!(window.len(), 3);
    }

    #[tokio::test]
    async fn test_filters_combine() {
        let (repos, jake, _) = seeded();
        let reader = repos.add_user("reader");
        repos.favorite(reader, ArticleId(3));
        repos.follow(reader, jake);

        let by_tag = ArticleFilter {
            author: Some("jake".into()),
            tag: Some("sql".into()),
            ..Default::default()
        };
        let window = repos
            .articles_window(&by_tag, &PageRequest::first_page(10))
            .await
            .unwrap();
        assert_eq!(slugs(&window), vec!["b"]);

        let favorited = ArticleFilter {
            favorited_by: Some("reader".into()),
            ..Default::default()
        };
        let window = repos
            .articles_window(&favorited, &PageRequest::first_page(10))
            .await
            .unwrap();
        assert_eq!(slugs(&window), vec!["b"]);

        let window = repos
            .articles_window(&ArticleFilter::feed_of(reader), &PageRequest::first_page(10))
            .await
            .unwrap();
        assert_eq!(slugs(&window), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_unknown_username_matches_nothing() {
        let (repos, _, _) = seeded();
        let filter = ArticleFilter {
            author: Some("nobody".into()),
            ..Default::default()
        };
        let window = repos
            .articles_window(&filter, &PageRequest::first_page(10))
            .await
            .unwrap();
        assert!(window.is_empty());
    }

    #[tokio::test]
    async fn test_timestamps_are_truncated_to_millis() {
        let repos = MemoryRepositories::new();
        let jake = repos.add_user("jake");
        let precise = DateTime::from_timestamp(1, 2_345_678).unwrap();
        repos.add_article(jake, "x", &[], precise);

        let article = repos.find_by_slug("x").await.unwrap().unwrap();
        assert_eq!(article.created_at.timestamp_millis(), 1002);
        assert_eq!(article.created_at.timestamp_subsec_nanos(), 2_000_000);
    }

    #[tokio::test]
    async fn test_comments_are_scoped_to_article() {
        let (repos, jake, anna) = seeded();
        repos.add_comment(ArticleId(1), anna, "first", at(5000));
        repos.add_comment(ArticleId(2), jake, "elsewhere", at(5500));
        repos.add_comment(ArticleId(1), jake, "second", at(6000));

        let window = repos
            .comments_window(ArticleId(1), &PageRequest::first_page(10))
            .await
            .unwrap();
        let bodies: Vec<_> = window.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_enrichment_lookups() {
        let (repos, jake, anna) = seeded();
        repos.follow(anna, jake);
        repos.favorite(anna, ArticleId(1));
        repos.favorite(jake, ArticleId(1));

        let followed = repos.followed_among(anna, &[jake, anna]).await.unwrap();
        assert_eq!(followed, HashSet::from([jake]));

        let counts = repos
            .favorite_counts(&[ArticleId(1), ArticleId(2)])
            .await
            .unwrap();
        assert_eq!(counts.get(&ArticleId(1)), Some(&2));
        assert_eq!(counts.get(&ArticleId(2)), None);

        let favorited = repos
            .favorited_among(jake, &[ArticleId(1), ArticleId(2)])
            .await
            .unwrap();
        assert_eq!(favorited, HashSet::from([ArticleId(1)]));

        let profiles = ProfileRepository::profiles(&repos, &[anna]).await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].username, "anna");
    }

    #[tokio::test]
    async fn test_offline_store_fails_reads() {
        let (repos, _, _) = seeded();
        repos.set_offline(true);
        let err = repos.find_by_slug("a").await.unwrap_err();
        assert!(matches!(err, StorageError::ConnectionError(_)));
        assert!(!repos.is_healthy().await);

        repos.set_offline(false);
        assert!(repos.find_by_slug("a").await.unwrap().is_some());
        assert!(repos.is_healthy().await);
    }

    #[tokio::test]
    async fn test_demo_data_is_browsable() {
        let repos = MemoryRepositories::demo();
        let window = repos
            .articles_window(&ArticleFilter::default(), &PageRequest::first_page(20))
            .await
            .unwrap();
        assert_eq!(window.len(), 21);
        assert_eq!(window[0].slug, "article-1");
        assert_eq!(window[0].title, "Article 1");

        let comments = repos
            .comments_window(ArticleId(1), &PageRequest::first_page(20))
            .await
            .unwrap();
        assert_eq!(comments.len(), 5);
    }
}
