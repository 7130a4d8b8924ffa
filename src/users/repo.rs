use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;

/// Column widths of `users.user_name` and `users.user_email`.
pub const USER_NAME_MAX: usize = 80;
pub const USER_EMAIL_MAX: usize = 120;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    #[serde(skip_serializing)]
    pub user_password_hash: String, // Argon2 hash, not exposed in JSON
    pub genre_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub user_date_added: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub user_email: String,
    pub user_password_hash: String,
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_password_hash: Option<String>,
    pub genre_id: Option<Uuid>,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    /// Returns `None` when no user has that id.
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError>;
    /// Owned genres and recommendations go with the user.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, user_name, user_email, user_password_hash, genre_id, user_date_added
            FROM users
            ORDER BY user_date_added, user_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, user_name, user_email, user_password_hash, genre_id, user_date_added
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, user_name, user_email, user_password_hash, genre_id, user_date_added
            FROM users
            WHERE user_email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, user_name, user_email, user_password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, user_name, user_email, user_password_hash, genre_id, user_date_added
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.user_name)
        .bind(&new.user_email)
        .bind(&new.user_password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET user_name          = COALESCE($2, user_name),
                   user_email         = COALESCE($3, user_email),
                   user_password_hash = COALESCE($4, user_password_hash),
                   genre_id           = COALESCE($5, genre_id)
             WHERE user_id = $1
            RETURNING user_id, user_name, user_email, user_password_hash, genre_id, user_date_added
            "#,
        )
        .bind(id)
        .bind(changes.user_name)
        .bind(changes.user_email)
        .bind(changes.user_password_hash)
        .bind(changes.genre_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query(r#"DELETE FROM users WHERE user_id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
