//! Comment repository implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{instrument, trace};

use folio_core::error::{StorageError, StorageResult};
use folio_core::models::{ArticleId, Comment, CommentId, UserId};
use folio_core::pagination::PageRequest;
use folio_core::ports::CommentRepository;

use super::helpers::{SqlParam, WhereClause, order_sql};

/// PostgreSQL implementation of CommentRepository.
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    #[instrument(skip_all, fields(article = %article, size = page.size()))]
    async fn comments_window(
        &self,
        article: ArticleId,
        page: &PageRequest,
    ) -> StorageResult<Vec<Comment>> {
        let mut clause = WhereClause::new();
        clause
            .push("article_id = ?", SqlParam::Int(article.get()))
            .keyset("created_at", page);

        let query = format!(
            r#"
            SELECT id, article_id, author_id, body, created_at, updated_at
            FROM comments
            {}
            ORDER BY created_at {}
            LIMIT {}
            "#,
            clause.sql(),
            order_sql(page.direction()),
            page.query_limit()
        );
        trace!(sql = %query, "Comments window query");

        let rows: Vec<CommentRow> = clause
            .bind(sqlx::query_as::<_, CommentRow>(&query))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(rows.into_iter().map(CommentRow::into_comment).collect())
    }
}

/// Database row representation for Comment.
#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    article_id: i64,
    author_id: i64,
    body: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl CommentRow {
    fn into_comment(self) -> Comment {
        Comment {
            id: CommentId(self.id),
            article_id: ArticleId(self.article_id),
            author_id: UserId(self.author_id),
            body: self.body,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
