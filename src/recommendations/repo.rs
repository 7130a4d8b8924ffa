use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recommendation {
    pub recommendation_id: Uuid,
    pub recommendation_titles: Option<String>,
    pub user_id: Uuid,
    pub recommendation_date_added: OffsetDateTime,
}

#[async_trait]
pub trait RecommendationRepo: Send + Sync {
    async fn list(&self) -> Result<Vec<Recommendation>, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Recommendation>, StoreError>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Recommendation>, StoreError>;
    async fn create(&self, user_id: Uuid, titles: String) -> Result<Recommendation, StoreError>;
    async fn update(
        &self,
        id: Uuid,
        titles: Option<String>,
        user_id: Option<Uuid>,
    ) -> Result<Option<Recommendation>, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn set_titles_for_user(&self, user_id: Uuid, titles: String) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct PgRecommendationRepo {
    db: PgPool,
}

impl PgRecommendationRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecommendationRepo for PgRecommendationRepo {
    async fn list(&self) -> Result<Vec<Recommendation>, StoreError> {
        let rows = sqlx::query_as::<_, Recommendation>(
            r#"
            SELECT recommendation_id, recommendation_titles, user_id, recommendation_date_added
            FROM recommendations
            ORDER BY recommendation_date_added, recommendation_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Recommendation>, StoreError> {
        let row = sqlx::query_as::<_, Recommendation>(
            r#"
            SELECT recommendation_id, recommendation_titles, user_id, recommendation_date_added
            FROM recommendations
            WHERE recommendation_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Recommendation>, StoreError> {
        let rows = sqlx::query_as::<_, Recommendation>(
            r#"
            SELECT recommendation_id, recommendation_titles, user_id, recommendation_date_added
            FROM recommendations
            WHERE user_id = $1
            ORDER BY recommendation_date_added, recommendation_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn create(&self, user_id: Uuid, titles: String) -> Result<Recommendation, StoreError> {
        let row = sqlx::query_as::<_, Recommendation>(
            r#"
            INSERT INTO recommendations (recommendation_id, recommendation_titles, user_id)
            VALUES ($1, $2, $3)
            RETURNING recommendation_id, recommendation_titles, user_id, recommendation_date_added
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
    ) -> Result<Option<Recommendation>, StoreError> {
        let row = sqlx::query_as::<_, Recommendation>(
            r#"
            UPDATE recommendations
               SET recommendation_titles = COALESCE($2, recommendation_titles),
                   user_id               = COALESCE($3, user_id)
             WHERE recommendation_id = $1
            RETURNING recommendation_id, recommendation_titles, user_id, recommendation_date_added
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
        let res = sqlx::query(r#"DELETE FROM recommendations WHERE recommendation_id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_titles_for_user(&self, user_id: Uuid, titles: String) -> Result<u64, StoreError> {
        let res = sqlx::query(
            r#"UPDATE recommendations SET recommendation_titles = $2 WHERE user_id = $1"#,
        )
        .bind(user_id)
        .bind(titles)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected())
    }
}
