use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;

/// Genre row; `genre_titles` holds the JSON-encoded list as stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Genre {
    pub genre_id: Uuid,
    pub genre_titles: Option<String>,
    pub user_id: Uuid,
    pub genre_date_added: OffsetDateTime,
}

#[async_trait]
pub trait GenreRepo: Send + Sync {
    async fn list(&self) -> Result<Vec<Genre>, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Genre>, StoreError>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Genre>, StoreError>;
    async fn create(&self, user_id: Uuid, titles: String) -> Result<Genre, StoreError>;
    async fn update(
        &self,
        id: Uuid,
        titles: Option<String>,
        user_id: Option<Uuid>,
    ) -> Result<Option<Genre>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    /// Overwrites the titles of every row the user owns; returns the row count.
    async fn set_titles_for_user(&self, user_id: Uuid, titles: String) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct PgGenreRepo {
    db: PgPool,
}

impl PgGenreRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GenreRepo for PgGenreRepo {
    async fn list(&self) -> Result<Vec<Genre>, StoreError> {
        let rows = sqlx::query_as::<_, Genre>(
            r#"
            SELECT genre_id, genre_titles, user_id, genre_date_added
            FROM genres
            ORDER BY genre_date_added, genre_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Genre>, StoreError> {
        let row = sqlx::query_as::<_, Genre>(
            r#"
            SELECT genre_id, genre_titles, user_id, genre_date_added
            FROM genres
            WHERE genre_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Genre>, StoreError> {
        let rows = sqlx::query_as::<_, Genre>(
            r#"
            SELECT genre_id, genre_titles, user_id, genre_date_added
            FROM genres
            WHERE user_id = $1
            ORDER BY genre_date_added, genre_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn create(&self, user_id: Uuid, titles: String) -> Result<Genre, StoreError> {
        let row = sqlx::query_as::<_, Genre>(
            r#"
            INSERT INTO genres (genre_id, genre_titles, user_id)
            VALUES ($1, $2, $3)
            RETURNING genre_id, genre_titles, user_id, genre_date_added
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(titles)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(
        &self,
        id: Uuid,
        titles: Option<String>,
        user_id: Option<Uuid>,
    ) -> Result<Option<Genre>, StoreError> {
        let row = sqlx::query_as::<_, Genre>(
            r#"
            UPDATE genres
               SET genre_titles = COALESCE($2, genre_titles),
                   user_id      = COALESCE($3, user_id)
             WHERE genre_id = $1
            RETURNING genre_id, genre_titles, user_id, genre_date_added
            "#,
        )
        .bind(id)
        .bind(titles)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query(r#"DELETE FROM genres WHERE genre_id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_titles_for_user(&self, user_id: Uuid, titles: String) -> Result<u64, StoreError> {
        let res = sqlx::query(r#"UPDATE genres SET genre_titles = $2 WHERE user_id = $1"#)
            .bind(user_id)
            .bind(titles)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}
