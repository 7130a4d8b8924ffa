use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;

/// Denylist of token ids that were logged out or rotated before expiry.
#[async_trait]
pub trait RevocationRepo: Send + Sync {
    async fn revoke(
        &self,
        jti: Uuid,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError>;

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, StoreError>;

    /// Drops entries whose token would be rejected as expired anyway.
    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64, StoreError>;
}

#[derive(Clone)]
pub struct PgRevocationRepo {
    db: PgPool,
}

impl PgRevocationRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RevocationRepo for PgRevocationRepo {
    async fn revoke(
        &self,
        jti: Uuid,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, StoreError> {
        let row = sqlx::query_scalar::<_, i32>(r#"SELECT 1 FROM revoked_tokens WHERE jti = $1"#)
            .bind(jti)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.is_some())
    }

    async fn purge_expired(&self, now: OffsetDateTime) -> Result<u64, StoreError> {
        let res = sqlx::query(r#"DELETE FROM revoked_tokens WHERE expires_at < $1"#)
            .bind(now)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}
