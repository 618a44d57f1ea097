//! Profile, follow and favorite lookups for PostgreSQL.
//!
//! These back the enrichment step of listings: one query per concern for
//! a whole window, keyed with `= ANY($n)`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sqlx::PgPool;

use folio_core::error::{StorageError, StorageResult};
use folio_core::models::{ArticleId, Profile, UserId};
use folio_core::ports::{FavoriteRepository, ProfileRepository};

use super::helpers::raw_ids;

/// PostgreSQL implementation of ProfileRepository.
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn profiles(&self, ids: &[UserId]) -> StorageResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, username, bio, image
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(raw_ids(ids, |id| id.get()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(rows.into_iter().map(ProfileRow::into_profile).collect())
    }

    async fn followed_among(
        &self,
        viewer: UserId,
        ids: &[UserId],
    ) -> StorageResult<HashSet<UserId>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT followee_id
            FROM follows
            WHERE follower_id = $1 AND followee_id = ANY($2)
            "#,
        )
        .bind(viewer.get())
        .bind(raw_ids(ids, |id| id.get()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| UserId(id)).collect())
    }
}

/// PostgreSQL implementation of FavoriteRepository.
pub struct PgFavoriteRepository {
    pool: PgPool,
}

impl PgFavoriteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for PgFavoriteRepository {
    async fn favorite_counts(&self, ids: &[ArticleId]) -> StorageResult<HashMap<ArticleId, i64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT article_id, COUNT(*)
            FROM favorites
            WHERE article_id = ANY($1)
            GROUP BY article_id
            "#,
        )
        .bind(raw_ids(ids, |id| id.get()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (ArticleId(id), count))
            .collect())
    }

    async fn favorited_among(
        &self,
        viewer: UserId,
        ids: &[ArticleId],
    ) -> StorageResult<HashSet<ArticleId>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT article_id
            FROM favorites
            WHERE user_id = $1 AND article_id = ANY($2)
            "#,
        )
        .bind(viewer.get())
        .bind(raw_ids(ids, |id| id.get()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(rows.into_iter().map(|(id,)| ArticleId(id)).collect())
    }
}

/// Database row representation for Profile.
#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    username: String,
    bio: Option<String>,
    image: Option<String>,
}

impl ProfileRow {
    fn into_profile(self) -> Profile {
        Profile {
            user_id: UserId(self.id),
            username: self.username,
            bio: self.bio,
            image: self.image,
        }
    }
}
