use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Recommendation;
use crate::titles::{self, TitlesInput};

#[derive(Debug, Serialize)]
pub struct RecommendationView {
    pub recommendation_id: Uuid,
    pub recommendation_titles: Vec<String>,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub recommendation_date_added: OffsetDateTime,
}

impl From<Recommendation> for RecommendationView {
    fn from(r: Recommendation) -> Self {
        Self {
            recommendation_titles: titles::decode(r.recommendation_titles.as_deref()),
            recommendation_id: r.recommendation_id,
            user_id: r.user_id,
            recommendation_date_added: r.recommendation_date_added,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRecommendationRequest {
    pub recommendation_titles: Option<TitlesInput>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRecommendationRequest {
    pub recommendation_titles: Option<TitlesInput>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRecommendationsRequest {
    pub recommendation_titles: Option<TitlesInput>,
    pub recommendation_id: Option<serde_json::Value>,
}
