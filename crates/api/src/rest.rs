//! REST routes.
//!
//! Same listings as the GraphQL surface, with the connection flattened:
//! `{ "articles": [...], "hasNext": .., "hasPrevious": .., "startCursor": .., "endCursor": .. }`.

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::models::{ArticleView, CommentView, ProfileView};
use folio_core::pagination::{Connection, PageArgs};
use folio_core::ports::ArticleFilter;

use crate::error::ApiError;
use crate::server::AppState;
use crate::types::Viewer;

// -----------------------------------------------------------------------------
// Query Parameters
// -----------------------------------------------------------------------------

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub first: Option<i32>,
    pub after: Option<String>,
    pub last: Option<i32>,
    pub before: Option<String>,
}

impl PageQuery {
    /// Pagination arguments. Size checks are left to [`PageArgs::into_request`],
    /// so a request naming neither `first` nor `last` is rejected there.
    fn into_args(self) -> PageArgs {
        PageArgs {
            first: self.first,
            after: self.after,
            last: self.last,
            before: self.before,
        }
    }
}

/// Article listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ArticleQuery {
    pub first: Option<i32>,
    pub after: Option<String>,
    pub last: Option<i32>,
    pub before: Option<String>,
    pub author: Option<String>,
    pub tag: Option<String>,
    pub favorited: Option<String>,
}

impl ArticleQuery {
    fn split(self) -> (ArticleFilter, PageQuery) {
        let filter = ArticleFilter {
            author: non_empty(self.author),
            tag: non_empty(self.tag),
            favorited_by: non_empty(self.favorited),
            ..Default::default()
        };
        let page = PageQuery {
            first: self.first,
            after: self.after,
            last: self.last,
            before: self.before,
        };
        (filter, page)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// -----------------------------------------------------------------------------
// Response Bodies
// -----------------------------------------------------------------------------

/// Flattened page metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFields {
    pub has_next: bool,
    pub has_previous: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

impl PageFields {
    fn of<T>(connection: &Connection<T>) -> Self {
        let info = connection.page_info;
        Self {
            has_next: info.has_next_page,
            has_previous: info.has_previous_page,
            start_cursor: info.start_cursor.map(|c| c.encode()),
            end_cursor: info.end_cursor.map(|c| c.encode()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub following: bool,
}

impl From<ProfileView> for ProfileBody {
    fn from(p: ProfileView) -> Self {
        Self {
            username: p.username,
            bio: p.bio,
            image: p.image,
            following: p.following,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleBody {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub favorited: bool,
    pub favorites_count: i64,
    pub author: ProfileBody,
}

impl From<ArticleView> for ArticleBody {
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
            author: v.author.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: ProfileBody,
}

impl From<CommentView> for CommentBody {
    fn from(v: CommentView) -> Self {
        Self {
            id: v.comment.id.get(),
            body: v.comment.body,
            created_at: v.comment.created_at,
            updated_at: v.comment.updated_at,
            author: v.author.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticlesPage {
    pub articles: Vec<ArticleBody>,
    #[serde(flatten)]
    pub page: PageFields,
}

impl From<Connection<ArticleView>> for ArticlesPage {
    fn from(connection: Connection<ArticleView>) -> Self {
        Self {
            page: PageFields::of(&connection),
            articles: connection.into_nodes().into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommentsPage {
    pub comments: Vec<CommentBody>,
    #[serde(flatten)]
    pub page: PageFields,
}

impl From<Connection<CommentView>> for CommentsPage {
    fn from(connection: Connection<CommentView>) -> Self {
        Self {
            page: PageFields::of(&connection),
            comments: connection.into_nodes().into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SingleArticle {
    pub article: ArticleBody,
}

// -----------------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------------

/// `GET /api/articles`
pub async fn list_articles(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<ArticleQuery>,
) -> Result<Json<ArticlesPage>, ApiError> {
    let (filter, page) = query.split();
    let connection = state
        .service
        .list_articles(filter, page.into_args(), viewer.0)
        .await?;
    Ok(Json(connection.into()))
}

/// `GET /api/articles/feed`
pub async fn feed(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Result<Json<ArticlesPage>, ApiError> {
    let user = viewer.require()?;
    let connection = state.service.user_feed(user, query.into_args()).await?;
    Ok(Json(connection.into()))
}

/// `GET /api/articles/{slug}`
pub async fn get_article(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(slug): Path<String>,
) -> Result<Json<SingleArticle>, ApiError> {
    let article = state
        .service
        .article(&slug, viewer.0)
        .await?
        .ok_or_else(|| {
            ApiError::from(folio_core::error::DomainError::NotFound(format!(
                "article '{}'",
                slug
            )))
        })?;
    Ok(Json(SingleArticle {
        article: article.into(),
    }))
}

/// `GET /api/articles/{slug}/comments`
pub async fn list_comments(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CommentsPage>, ApiError> {
    let connection = state
        .service
        .article_comments(&slug, query.into_args(), viewer.0)
        .await?;
    Ok(Json(connection.into()))
}
