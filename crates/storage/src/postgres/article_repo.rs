//! Article repository implementation for PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{instrument, trace};

use folio_core::error::{StorageError, StorageResult};
use folio_core::models::{Article, ArticleId, UserId};
use folio_core::pagination::PageRequest;
use folio_core::ports::{ArticleFilter, ArticleRepository};

use super::helpers::{SqlParam, WhereClause, order_sql};

const ARTICLE_COLUMNS: &str = r#"
    a.id, a.slug, a.title, a.description, a.body,
    ARRAY(SELECT t.tag FROM article_tags t WHERE t.article_id = a.id ORDER BY t.tag) AS tags,
    a.author_id, a.created_at, a.updated_at
"#;

/// PostgreSQL implementation of ArticleRepository.
pub struct PgArticleRepository {
    pool: PgPool,
}

impl PgArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleRepository for PgArticleRepository {
    async fn find_by_slug(&self, slug: &str) -> StorageResult<Option<Article>> {
        let query = format!("SELECT {} FROM articles a WHERE a.slug = $1", ARTICLE_COLUMNS);

        let row = sqlx::query_as::<_, ArticleRow>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(row.map(ArticleRow::into_article))
    }

    #[instrument(skip_all, fields(size = page.size(), direction = page.direction().as_str()))]
    async fn articles_window(
        &self,
        filter: &ArticleFilter,
        page: &PageRequest,
    ) -> StorageResult<Vec<Article>> {
        let (query, clause) = window_query(filter, page);
        trace!(sql = %query, "Articles window query");

        let rows: Vec<ArticleRow> = clause
            .bind(sqlx::query_as::<_, ArticleRow>(&query))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(rows.into_iter().map(ArticleRow::into_article).collect())
    }
}

/// Build the window SQL for `filter` and the parameters to bind, in
/// placeholder order: filters first, keyset bound last.
fn window_query(filter: &ArticleFilter, page: &PageRequest) -> (String, WhereClause) {
    let mut clause = WhereClause::new();

    if let Some(author) = &filter.author {
        clause.push(
            "a.author_id = (SELECT u.id FROM users u WHERE u.username = ?)",
            SqlParam::Text(author.clone()),
        );
    }
    if let Some(tag) = &filter.tag {
        clause.push(
            "EXISTS (SELECT 1 FROM article_tags t WHERE t.article_id = a.id AND t.tag = ?)",
            SqlParam::Text(tag.clone()),
        );
    }
    if let Some(favoriter) = &filter.favorited_by {
        clause.push(
            r#"EXISTS (
                SELECT 1 FROM favorites f JOIN users u ON u.id = f.user_id
                WHERE f.article_id = a.id AND u.username = ?
            )"#,
            SqlParam::Text(favoriter.clone()),
        );
    }
    if let Some(follower) = filter.followed_by {
        clause.push(
            "a.author_id IN (SELECT w.followee_id FROM follows w WHERE w.follower_id = ?)",
            SqlParam::Int(follower.get()),
        );
    }
    clause.keyset("a.created_at", page);

    let query = format!(
        r#"
        SELECT {}
        FROM articles a
        {}
        ORDER BY a.created_at {}
        LIMIT {}
        "#,
        ARTICLE_COLUMNS,
        clause.sql(),
        order_sql(page.direction()),
        page.query_limit()
    );
    (query, clause)
}

/// Database row representation for Article.
#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    slug: String,
    title: String,
    description: String,
    body: String,
    tags: Vec<String>,
    author_id: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl ArticleRow {
    fn into_article(self) -> Article {
        Article {
            id: ArticleId(self.id),
            slug: self.slug,
            title: self.title,
            description: self.description,
            body: self.body,
            tags: self.tags,
            author_id: UserId(self.author_id),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use folio_core::pagination::{Cursor, PageDirection};

    fn squash(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    // Test critique: tous les filtres plus la borne keyset, dans l'ordre des paramètres
    #[test]
    fn test_all_filters_with_backward_bound() {
        let filter = ArticleFilter {
            author: Some("jake".into()),
            tag: Some("rust".into()),
            favorited_by: Some("anna".into()),
            followed_by: Some(UserId(3)),
        };
        let page = PageRequest::new(Cursor::from_millis(5000), 3, PageDirection::Prev);

        let (query, clause) = window_query(&filter, &page);
        let sql = squash(&query);

        assert!(sql.contains(
            "WHERE a.author_id = (SELECT u.id FROM users u WHERE u.username = $1) \
             AND EXISTS (SELECT 1 FROM article_tags t WHERE t.article_id = a.id AND t.tag = $2) \
             AND EXISTS ( SELECT 1 FROM favorites f JOIN users u ON u.id = f.user_id \
             WHERE f.article_id = a.id AND u.username = $3 ) \
             AND a.author_id IN (SELECT w.followee_id FROM follows w WHERE w.follower_id = $4) \
             AND a.created_at < $5"
        ));
        assert!(sql.ends_with("ORDER BY a.created_at DESC LIMIT 4"));
        assert_eq!(
            clause.params(),
            [
                SqlParam::Text("jake".into()),
                SqlParam::Text("rust".into()),
                SqlParam::Text("anna".into()),
                SqlParam::Int(3),
                SqlParam::Time(DateTime::from_timestamp_millis(5000).unwrap()),
            ]
        );
    }

    #[test]
    fn test_unfiltered_first_page() {
        let (query, clause) = window_query(&ArticleFilter::default(), &PageRequest::first_page(20));
        let sql = squash(&query);

        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with("FROM articles a ORDER BY a.created_at ASC LIMIT 21"));
        assert!(clause.params().is_empty());
    }

    #[test]
    fn test_feed_forward_bound() {
        let page = PageRequest::new(Cursor::from_millis(1000), 2, PageDirection::Next);
        let (query, clause) = window_query(&ArticleFilter::feed_of(UserId(9)), &page);
        let sql = squash(&query);

        assert!(sql.contains("WHERE w.follower_id = $1) AND a.created_at > $2"));
        assert!(sql.ends_with("ORDER BY a.created_at ASC LIMIT 3"));
        assert_eq!(clause.params()[0], SqlParam::Int(9));
    }
}
