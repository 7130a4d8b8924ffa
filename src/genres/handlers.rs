use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CreateGenreRequest, GenreView, UpdateGenreRequest, UpdateUserGenresRequest};
use crate::{
    auth::AuthUser,
    error::{parse_id, ApiError, ApiJson},
    state::AppState,
};

pub fn genre_routes() -> Router<AppState> {
    Router::new()
        .route("/genre/get", get(list_genres))
        .route("/genre/get/:id", get(get_genre))
        .route("/genre/create", post(create_genre))
        .route("/genre/genreId/:id", put(update_genre))
        .route("/genre/delete/:id", delete(delete_genre))
        .route("/genre/userId/:id", put(update_genres_by_user))
}

#[instrument(skip(state))]
pub async fn list_genres(State(state): State<AppState>) -> Result<Json<Vec<GenreView>>, ApiError> {
    let rows = state.genres.list().await?;
    Ok(Json(rows.into_iter().map(GenreView::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GenreView>, ApiError> {
    let id = parse_id(&id, "Genre")?;
    let genre = state
        .genres
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Genre not found".into()))?;
    Ok(Json(genre.into()))
}

#[instrument(skip(state, auth, payload), fields(caller = %auth.user_id))]
pub async fn create_genre(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<CreateGenreRequest>,
) -> Result<(StatusCode, Json<GenreView>), ApiError> {
    let titles = payload
        .genre_titles
        .ok_or_else(|| ApiError::BadRequest("genre_titles is required".into()))?
        .encode("genre_titles")?;
    let owner = payload.user_id.unwrap_or(auth.user_id);
    auth.ensure_is(owner)?;

    let genre = state.genres.create(owner, titles).await?;
    info!(genre_id = %genre.genre_id, user_id = %owner, "genre created");
    Ok((StatusCode::CREATED, Json(genre.into())))
}

#[instrument(skip(state, auth, payload), fields(caller = %auth.user_id))]
pub async fn update_genre(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateGenreRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "Genre")?;
    let genre = state
        .genres
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Genre not found".into()))?;
    auth.ensure_is(genre.user_id)?;

    let titles = payload
        .genre_titles
        .map(|t| t.encode("genre_titles"))
        .transpose()?;
    if let Some(new_owner) = payload.user_id {
        auth.ensure_is(new_owner)?;
    }

    state
        .genres
        .update(id, titles, payload.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Genre not found".into()))?;

    info!(genre_id = %id, "genre updated");
    Ok(StatusCode::OK)
}

#[instrument(skip(state, auth), fields(caller = %auth.user_id))]
pub async fn delete_genre(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "Genre")?;
    let genre = state
        .genres
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Genre not found".into()))?;
    auth.ensure_is(genre.user_id)?;

    if !state.genres.delete(id).await? {
        return Err(ApiError::NotFound("Genre not found".into()));
    }
    info!(genre_id = %id, "genre deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, auth, payload), fields(caller = %auth.user_id))]
pub async fn update_genres_by_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<String>,
    ApiJson(payload): ApiJson<UpdateUserGenresRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_id(&user_id, "User")?;
    auth.ensure_is(user_id)?;

    if payload.genre_id.is_some() {
        return Err(ApiError::BadRequest("genre_id cannot be changed".into()));
    }

    let matched = match payload.genre_titles {
        Some(titles) => {
            let titles = titles.encode("genre_titles")?;
            state.genres.set_titles_for_user(user_id, titles).await?
        }
        None => state.genres.list_by_user(user_id).await?.len() as u64,
    };
    if matched == 0 {
        return Err(ApiError::NotFound("No genres found for user".into()));
    }

    info!(%user_id, rows = matched, "genres updated for user");
    Ok(StatusCode::OK)
}
