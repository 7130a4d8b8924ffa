use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    auth::revocation::{PgRevocationRepo, RevocationRepo},
    config::AppConfig,
    genres::repo::{GenreRepo, PgGenreRepo},
    recommendations::repo::{PgRecommendationRepo, RecommendationRepo},
    users::repo::{PgUserRepo, UserRepo},
};

/// Built once at startup and handed to every handler through `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub genres: Arc<dyn GenreRepo>,
    pub recommendations: Arc<dyn RecommendationRepo>,
    pub revoked: Arc<dyn RevocationRepo>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        Ok(Self::from_pool(db, config))
    }

    pub fn from_pool(db: PgPool, config: Arc<AppConfig>) -> Self {
        Self {
            config,
            users: Arc::new(PgUserRepo::new(db.clone())),
            genres: Arc::new(PgGenreRepo::new(db.clone())),
            recommendations: Arc::new(PgRecommendationRepo::new(db.clone())),
            revoked: Arc::new(PgRevocationRepo::new(db)),
        }
    }
}
