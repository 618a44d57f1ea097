//! GraphQL schema definition.
//!
//! Article and comment listings exposed as Relay-style connections.

use async_graphql::{
    Context, EmptyMutation, EmptySubscription, ErrorExtensions, Object, Result, Schema,
};
use chrono::{DateTime, Utc};

use folio_core::models::{ArticleView, CommentView, ProfileView};
use folio_core::pagination::PageArgs;
use folio_core::ports::ArticleFilter;
use folio_core::services::ListingService;

use crate::error::ApiError;
use crate::types::{FolioSchema, Viewer};

// -----------------------------------------------------------------------------
// Schema Configuration
// -----------------------------------------------------------------------------

/// Maximum query depth to prevent deeply nested queries (DoS protection).
/// Note: GraphQL introspection requires depth ~13, so we use 15 to allow it.
pub const MAX_QUERY_DEPTH: usize = 15;

/// Maximum query complexity score (DoS protection).
/// Each field has a default complexity of 1, nested objects multiply.
pub const MAX_QUERY_COMPLEXITY: usize = 500;

/// Build the GraphQL schema over a listing service.
///
/// Includes query depth and complexity limits for DoS protection. The
/// viewer is attached per request as [`Viewer`] data.
pub fn build_schema(service: ListingService) -> FolioSchema {
    Schema::build(Query, EmptyMutation, EmptySubscription)
        .data(service)
        .limit_depth(MAX_QUERY_DEPTH)
        .limit_complexity(MAX_QUERY_COMPLEXITY)
        .finish()
}

// -----------------------------------------------------------------------------
// Query Root
// -----------------------------------------------------------------------------

/// Query root.
///
/// Every listing takes `first`/`after` to walk forward or `last`/`before`
/// to walk backward; exactly one of `first` and `last` is required.
#[derive(Default)]
pub struct Query;

#[Object]
impl Query {
    /// List articles, oldest first, optionally filtered.
    #[allow(clippy::too_many_arguments)]
    async fn articles<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
        author: Option<String>,
        tag: Option<String>,
        favorited_by: Option<String>,
    ) -> Result<ArticleConnection> {
        validate_filter_string(&author, "author")?;
        validate_filter_string(&tag, "tag")?;
        validate_filter_string(&favorited_by, "favoritedBy")?;

        let service = ctx.data::<ListingService>()?;
        let filter = ArticleFilter {
            author,
            tag,
            favorited_by,
            ..Default::default()
        };
        let args = PageArgs {
            first,
            after,
            last,
            before,
        };

        let connection = service
            .list_articles(filter, args, viewer(ctx).0)
            .await
            .map_err(|e| ApiError::from(e).extend())?;

        Ok(ArticleConnection::from(connection))
    }

    /// Articles from authors the viewer follows.
    async fn feed<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
    ) -> Result<ArticleConnection> {
        let service = ctx.data::<ListingService>()?;
        let user = viewer(ctx).require().map_err(|e| e.extend())?;
        let args = PageArgs {
            first,
            after,
            last,
            before,
        };

        let connection = service
            .user_feed(user, args)
            .await
            .map_err(|e| ApiError::from(e).extend())?;

        Ok(ArticleConnection::from(connection))
    }

    /// Comments on the article identified by `slug`, oldest first.
    async fn comments<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        slug: String,
        first: Option<i32>,
        after: Option<String>,
        last: Option<i32>,
        before: Option<String>,
    ) -> Result<CommentConnection> {
        let service = ctx.data::<ListingService>()?;
        let args = PageArgs {
            first,
            after,
            last,
            before,
        };

        let connection = service
            .article_comments(&slug, args, viewer(ctx).0)
            .await
            .map_err(|e| ApiError::from(e).extend())?;

        Ok(CommentConnection::from(connection))
    }

    /// Get an article by slug.
    async fn article<'ctx>(&self, ctx: &Context<'ctx>, slug: String) -> Result<Option<Article>> {
        let service = ctx.data::<ListingService>()?;

        let article = service
            .article(&slug, viewer(ctx).0)
            .await
            .map_err(|e| ApiError::from(e).extend())?;

        Ok(article.map(Article::from))
    }
}

fn viewer(ctx: &Context<'_>) -> Viewer {
    ctx.data_opt::<Viewer>().copied().unwrap_or_default()
}

// -----------------------------------------------------------------------------
// GraphQL Types
// -----------------------------------------------------------------------------

/// Author profile as seen by the viewer.
#[derive(async_graphql::SimpleObject)]
pub struct Profile {
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub following: bool,
}

impl From<ProfileView> for Profile {
    fn from(p: ProfileView) -> Self {
        Self {
            username: p.username,
            bio: p.bio,
            image: p.image,
            following: p.following,
        }
    }
}

/// Article type.
#[derive(async_graphql::SimpleObject)]
pub struct Article {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorited: bool,
    pub favorites_count: i64,
    pub author: Profile,
}

impl From<ArticleView> for Article {
    fn from(v: ArticleView) -> Self {
        Self {
            slug: v.article.slug,
            title: v.article.title,
            description: v.article.description,
            body: v.article.body,
            tag_list: v.article.tags,
            created_at: v.article.created_at,
            updated_at: v.article.updated_at,
            favorited: v.favorited,
            favorites_count: v.favorites_count,
            author: Profile::from(v.author),
        }
    }
}

/// Comment type.
#[derive(async_graphql::SimpleObject)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Profile,
}

impl From<CommentView> for Comment {
    fn from(v: CommentView) -> Self {
        Self {
            id: v.comment.id.get(),
            body: v.comment.body,
            created_at: v.comment.created_at,
            updated_at: v.comment.updated_at,
            author: Profile::from(v.author),
        }
    }
}

// -----------------------------------------------------------------------------
// Connection Types (Relay-style pagination)
// -----------------------------------------------------------------------------

#[derive(async_graphql::SimpleObject)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

impl From<folio_core::pagination::PageInfo> for PageInfo {
    fn from(info: folio_core::pagination::PageInfo) -> Self {
        Self {
            has_next_page: info.has_next_page,
            has_previous_page: info.has_previous_page,
            start_cursor: info.start_cursor.map(|c| c.encode()),
            end_cursor: info.end_cursor.map(|c| c.encode()),
        }
    }
}

/// Generate Relay-style connection types (Edge + Connection) with From impl.
macro_rules! define_connection {
    ($node:ty, $core_model:ty, $edge:ident, $connection:ident) => {
        #[derive(async_graphql::SimpleObject)]
        pub struct $edge {
            pub node: $node,
            pub cursor: String,
        }

        #[derive(async_graphql::SimpleObject)]
        pub struct $connection {
            pub edges: Vec<$edge>,
            pub page_info: PageInfo,
        }

        impl From<folio_core::pagination::Connection<$core_model>> for $connection {
            fn from(conn: folio_core::pagination::Connection<$core_model>) -> Self {
                Self {
                    edges: conn
                        .edges
                        .into_iter()
                        .map(|e| $edge {
                            node: <$node>::from(e.node),
                            cursor: e.cursor.encode(),
                        })
                        .collect(),
                    page_info: PageInfo::from(conn.page_info),
                }
            }
        }
    };
}

define_connection!(Article, ArticleView, ArticleEdge, ArticleConnection);
define_connection!(Comment, CommentView, CommentEdge, CommentConnection);

// -----------------------------------------------------------------------------
// Validation
// -----------------------------------------------------------------------------

/// Maximum length for string filter parameters.
const MAX_FILTER_STRING_LENGTH: usize = 128;

/// Validate a filter string parameter.
fn validate_filter_string(s: &Option<String>, field_name: &str) -> Result<()> {
    if let Some(value) = s {
        if value.len() > MAX_FILTER_STRING_LENGTH {
            return Err(ApiError::BadRequest(format!(
                "{} too long: maximum {} characters allowed",
                field_name, MAX_FILTER_STRING_LENGTH
            ))
            .extend());
        }
        if value.is_empty() {
            return Err(ApiError::BadRequest(format!("{} cannot be empty", field_name)).extend());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use async_graphql::Request;
    use folio_core::ports::Repositories;
    use folio_storage::MemoryRepositories;
    use serde_json::json;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    /// jake (1) writes five articles at 1000..5000 ms, anna (2) comments on
    /// the first one three times; reader (3) follows jake and favorites
    /// the first article.
    fn seeded() -> (Arc<MemoryRepositories>, FolioSchema) {
        let repos = Arc::new(MemoryRepositories::new());
        let jake = repos.add_user("jake");
        let anna = repos.add_user("anna");
        let reader = repos.add_user("reader");
        for i in 1..=5 {
            let tags: &[&str] = if i % 2 == 0 { &["even"] } else { &["odd"] };
            repos.add_article(jake, &format!("post-{}", i), tags, at(i * 1000));
        }
        let first = folio_core::models::ArticleId(1);
        for i in 1..=3 {
            repos.add_comment(first, anna, &format!("c{}", i), at(10_000 + i));
        }
        repos.follow(reader, jake);
        repos.favorite(reader, first);

        let dyn_repos: Arc<dyn Repositories> = repos.clone();
        let schema = build_schema(ListingService::new(dyn_repos));
        (repos, schema)
    }

    async fn run(schema: &FolioSchema, query: &str, viewer: Viewer) -> serde_json::Value {
        let response = schema.execute(Request::new(query).data(viewer)).await;
        serde_json::to_value(&response).unwrap()
    }

    fn slugs(data: &serde_json::Value, field: &str) -> Vec<String> {
        data["data"][field]["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["node"]["slug"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_articles_forward_page() {
        let (_, schema) = seeded();
        let data = run(
            &schema,
            "{ articles(first: 2) { edges { cursor node { slug } } pageInfo { hasNextPage hasPreviousPage startCursor endCursor } } }",
            Viewer::default(),
        )
        .await;

        assert_eq!(slugs(&data, "articles"), vec!["post-1", "post-2"]);
        assert_eq!(
            data["data"]["articles"]["pageInfo"],
            json!({
                "hasNextPage": true,
                "hasPreviousPage": false,
                "startCursor": "1000",
                "endCursor": "2000",
            })
        );
        assert_eq!(data["data"]["articles"]["edges"][1]["cursor"], "2000");
    }

    // Test critique: la page précédente reste en ordre chronologique
    #[tokio::test]
    async fn test_articles_backward_page_is_ascending() {
        let (_, schema) = seeded();
        let data = run(
            &schema,
            r#"{ articles(last: 2, before: "5000") { edges { node { slug } } pageInfo { hasNextPage hasPreviousPage } } }"#,
            Viewer::default(),
        )
        .await;

        assert_eq!(slugs(&data, "articles"), vec!["post-3", "post-4"]);
        assert_eq!(data["data"]["articles"]["pageInfo"]["hasPreviousPage"], true);
        assert_eq!(data["data"]["articles"]["pageInfo"]["hasNextPage"], false);
    }

    #[tokio::test]
    async fn test_articles_filter_and_enrichment() {
        let (_, schema) = seeded();
        let data = run(
            &schema,
            r#"{ articles(first: 10, tag: "odd") { edges { node { slug favorited favoritesCount author { username following } } } } }"#,
            Viewer(Some(folio_core::models::UserId(3))),
        )
        .await;

        assert_eq!(slugs(&data, "articles"), vec!["post-1", "post-3", "post-5"]);
        let first = &data["data"]["articles"]["edges"][0]["node"];
        assert_eq!(first["favorited"], true);
        assert_eq!(first["favoritesCount"], 1);
        assert_eq!(first["author"], json!({"username": "jake", "following": true}));
    }

    #[tokio::test]
    async fn test_invalid_cursor_is_bad_user_input() {
        let (_, schema) = seeded();
        let data = run(
            &schema,
            r#"{ articles(first: 2, after: "not-a-number") { edges { cursor } } }"#,
            Viewer::default(),
        )
        .await;

        assert_eq!(data["errors"][0]["extensions"]["code"], "BAD_USER_INPUT");
    }

    #[tokio::test]
    async fn test_first_and_last_are_exclusive() {
        let (_, schema) = seeded();
        let data = run(
            &schema,
            "{ articles(first: 2, last: 2) { edges { cursor } } }",
            Viewer::default(),
        )
        .await;
        assert_eq!(data["errors"][0]["extensions"]["code"], "BAD_USER_INPUT");

        let data = run(&schema, "{ articles { edges { cursor } } }", Viewer::default()).await;
        assert_eq!(data["errors"][0]["extensions"]["code"], "BAD_USER_INPUT");
    }

    #[tokio::test]
    async fn test_feed_requires_viewer() {
        let (_, schema) = seeded();
        let query = "{ feed(first: 3) { edges { node { slug } } pageInfo { hasNextPage } } }";

        let data = run(&schema, query, Viewer::default()).await;
        assert_eq!(data["errors"][0]["extensions"]["code"], "UNAUTHENTICATED");

        let data = run(&schema, query, Viewer(Some(folio_core::models::UserId(3)))).await;
        assert_eq!(slugs(&data, "feed"), vec!["post-1", "post-2", "post-3"]);
        assert_eq!(data["data"]["feed"]["pageInfo"]["hasNextPage"], true);
    }

    #[tokio::test]
    async fn test_comments_walk_and_not_found() {
        let (_, schema) = seeded();
        let data = run(
            &schema,
            r#"{ comments(slug: "post-1", first: 2, after: "10001") { edges { cursor node { body author { username } } } pageInfo { hasNextPage } } }"#,
            Viewer::default(),
        )
        .await;

        let edges = data["data"]["comments"]["edges"].as_array().unwrap();
        let bodies: Vec<_> = edges.iter().map(|e| e["node"]["body"].clone()).collect();
        assert_eq!(bodies, vec![json!("c2"), json!("c3")]);
        assert_eq!(edges[0]["node"]["author"]["username"], "anna");
        assert_eq!(data["data"]["comments"]["pageInfo"]["hasNextPage"], false);

        let data = run(
            &schema,
            r#"{ comments(slug: "missing", first: 2) { edges { cursor } } }"#,
            Viewer::default(),
        )
        .await;
        assert_eq!(data["errors"][0]["extensions"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_store_failure_is_upstream_unavailable() {
        let (repos, schema) = seeded();
        repos.set_offline(true);
        let data = run(
            &schema,
            "{ articles(first: 2) { edges { cursor } } }",
            Viewer::default(),
        )
        .await;

        assert_eq!(data["errors"][0]["extensions"]["code"], "UPSTREAM_UNAVAILABLE");
        assert_eq!(data["data"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_single_article() {
        let (_, schema) = seeded();
        let data = run(
            &schema,
            r#"{ article(slug: "post-2") { title tagList } missing: article(slug: "nope") { slug } }"#,
            Viewer::default(),
        )
        .await;

        assert_eq!(data["data"]["article"], json!({"title": "Post 2", "tagList": ["even"]}));
        assert_eq!(data["data"]["missing"], serde_json::Value::Null);
    }

    #[test]
    fn test_validate_filter_string_boundaries() {
        // Vide = erreur (évite les requêtes inutiles)
        assert!(validate_filter_string(&Some("".into()), "x").is_err());
        // Trop long = erreur (DoS prevention)
        assert!(validate_filter_string(&Some("x".repeat(200)), "x").is_err());
        // None = OK (optionnel)
        assert!(validate_filter_string(&None, "x").is_ok());
    }
}
