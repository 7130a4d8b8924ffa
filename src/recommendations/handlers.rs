use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{
    CreateRecommendationRequest, RecommendationView, UpdateRecommendationRequest,
    UpdateUserRecommendationsRequest,
};
use crate::{
    auth::AuthUser,
    error::{parse_id, ApiError, ApiJson},
    state::AppState,
};

const TITLES: &str = "recommendation_titles";

pub fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendation/get", get(list_recommendations))
        .route("/recommendation/get/:id", get(get_recommendation))
        .route("/recommendation/create", post(create_recommendation))
        .route(
            "/recommendation/recommendationId/:id",
            put(update_recommendation),
        )
        .route("/recommendation/delete/:id", delete(delete_recommendation))
        .route(
            "/recommendation/userId/:id",
            put(update_recommendations_by_user),
        )
}

#[instrument(skip(state))]
pub async fn list_recommendations(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecommendationView>>, ApiError> {
    let rows = state.recommendations.list().await?;
    Ok(Json(rows.into_iter().map(RecommendationView::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_recommendation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecommendationView>, ApiError> {
    let id = parse_id(&id, "Recommendation")?;
    let rec = state
        .recommendations
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recommendation not found".into()))?;
    Ok(Json(rec.into()))
}

#[instrument(skip(state, auth, payload), fields(caller = %auth.user_id))]
pub async fn create_recommendation(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<CreateRecommendationRequest>,
) -> Result<(StatusCode, Json<RecommendationView>), ApiError> {
    let titles = payload
        .recommendation_titles
        .ok_or_else(|| ApiError::BadRequest(format!("{TITLES} is required")))?
        .encode(TITLES)?;
    let owner = payload.user_id.unwrap_or(auth.user_id);
    auth.ensure_is(owner)?;

    let rec = state.recommendations.create(owner, titles).await?;
    info!(recommendation_id = %rec.recommendation_id, user_id = %owner, "recommendation created");
    Ok((StatusCode::CREATED, Json(rec.into())))
}

#[instrument(skip(state, auth, payload), fields(caller = %auth.user_id))]
pub async fn update_recommendation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateRecommendationRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "Recommendation")?;
    let rec = state
        .recommendations
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recommendation not found".into()))?;
    auth.ensure_is(rec.user_id)?;

    let titles = payload
        .recommendation_titles
        .map(|t| t.encode(TITLES))
        .transpose()?;
    if let Some(new_owner) = payload.user_id {
        auth.ensure_is(new_owner)?;
    }

    state
        .recommendations
        .update(id, titles, payload.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recommendation not found".into()))?;

    info!(recommendation_id = %id, "recommendation updated");
    Ok(StatusCode::OK)
}

#[instrument(skip(state, auth), fields(caller = %auth.user_id))]
pub async fn delete_recommendation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "Recommendation")?;
    let rec = state
        .recommendations
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Recommendation not found".into()))?;
    auth.ensure_is(rec.user_id)?;

    if !state.recommendations.delete(id).await? {
        return Err(ApiError::NotFound("Recommendation not found".into()));
    }
    info!(recommendation_id = %id, "recommendation deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, auth, payload), fields(caller = %auth.user_id))]
pub async fn update_recommendations_by_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateUserRecommendationsRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_id(&user_id, "User")?;
    auth.ensure_is(user_id)?;

    if payload.recommendation_id.is_some() {
        return Err(ApiError::BadRequest(
            "recommendation_id cannot be changed".into(),
        ));
    }

    let matched = match payload.recommendation_titles {
        Some(titles) => {
            let titles = titles.encode(TITLES)?;
            state
                .recommendations
                .set_titles_for_user(user_id, titles)
                .await?
        }
        None => state.recommendations.list_by_user(user_id).await?.len() as u64,
    };
    if matched == 0 {
        return Err(ApiError::NotFound("No recommendations found for user".into()));
    }

    info!(%user_id, rows = matched, "recommendations updated for user");
    Ok(StatusCode::OK)
}
