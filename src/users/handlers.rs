use axum::{
    body::Bytes,
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{
        CreateUserRequest, LoginRequest, LogoutRequest, MessageResponse, RefreshRequest,
        TokenResponse, UpdateUserRequest,
    },
    repo::{NewUser, User, UserChanges, USER_EMAIL_MAX, USER_NAME_MAX},
};
use crate::{
    auth::{
        jwt::JwtKeys,
        password::{burn_verification, hash_password, verify_password},
        AuthUser,
    },
    error::{parse_id, ApiError, ApiJson},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/get", get(list_users))
        .route("/user/get/:id", get(get_user))
        .route("/user/create", post(create_user))
        .route("/user/delete/:id", delete(delete_user))
        .route("/user/update/:id", put(update_user))
        .route("/user/login", post(login))
        .route("/user/refresh", post(refresh))
        .route("/user/logout", post(logout))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if email.chars().count() > USER_EMAIL_MAX {
        return Err(ApiError::BadRequest(format!(
            "user_email must be at most {USER_EMAIL_MAX} characters"
        )));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    Ok(email)
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(format!("{field} is required"))),
    }
}

fn valid_user_name(value: Option<String>) -> Result<String, ApiError> {
    let name = required(value, "user_name")?.trim().to_string();
    if name.chars().count() > USER_NAME_MAX {
        return Err(ApiError::BadRequest(format!(
            "user_name must be at most {USER_NAME_MAX} characters"
        )));
    }
    Ok(name)
}

async fn purge_revocations(state: &AppState) {
    match state.revoked.purge_expired(OffsetDateTime::now_utc()).await {
        Ok(purged) if purged > 0 => info!(purged, "expired revocations purged"),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "purging expired revocations failed"),
    }
}

fn issue_tokens(keys: &JwtKeys, user_id: Uuid) -> Result<TokenResponse, ApiError> {
    let access_token = keys.sign_access(user_id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        ApiError::Internal(e)
    })?;
    let refresh_token = keys.sign_refresh(user_id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        ApiError::Internal(e)
    })?;
    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
    })
}

#[instrument(skip(state, auth), fields(caller = %auth.user_id))]
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users))
}

#[instrument(skip(state, auth), fields(caller = %auth.user_id))]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&id, "User")?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user_name = valid_user_name(payload.user_name)?;
    let user_email = normalize_email(&required(payload.user_email, "user_email")?)?;
    let password = required(payload.user_password, "user_password")?;

    let user_password_hash = hash_password(&password)?;

    let user = state
        .users
        .create(NewUser {
            user_name,
            user_email,
            user_password_hash,
        })
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("Email already registered".into()),
            other => other,
        })?;

    info!(user_id = %user.user_id, email = %user.user_email, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, auth), fields(caller = %auth.user_id))]
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "User")?;
    if state.users.find_by_id(id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }
    auth.ensure_is(id)?;

    if !state.users.delete(id).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }
    state
        .revoked
        .revoke(auth.claims.jti, auth.user_id, auth.claims.expires_at())
        .await?;

    info!(user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, auth, payload), fields(caller = %auth.user_id))]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id, "User")?;
    if state.users.find_by_id(id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".into()));
    }
    auth.ensure_is(id)?;

    let mut changes = UserChanges::default();
    if let Some(name) = payload.user_name {
        changes.user_name = Some(valid_user_name(Some(name))?);
    }
    if let Some(email) = payload.user_email {
        changes.user_email = Some(normalize_email(&email)?);
    }
    if let Some(password) = payload.user_password {
        let password = required(Some(password), "user_password")?;
        changes.user_password_hash = Some(hash_password(&password)?);
    }
    if let Some(genre_id) = payload.genre_id {
        let genre = state
            .genres
            .find(genre_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Genre not found".into()))?;
        auth.ensure_is(genre.user_id)?;
        changes.genre_id = Some(genre_id);
    }

    state
        .users
        .update(id, changes)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("Email already registered".into()),
            other => other,
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(user_id = %id, "user updated");
    Ok(StatusCode::OK)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let (email, password) = match (payload.user_email, payload.user_password) {
        (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => (e, p),
        _ => {
            return Err(ApiError::BadRequest(
                "Email and password are required".into(),
            ))
        }
    };
    let email = email.trim().to_lowercase();

    let user = match state.users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            burn_verification(&password);
            warn!(email = %email, "login unknown email");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
    };

    if !verify_password(&password, &user.user_password_hash)? {
        warn!(user_id = %user.user_id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let tokens = issue_tokens(&JwtKeys::from_ref(&state), user.user_id)?;
    info!(user_id = %user.user_id, "user logged in");
    Ok(Json(tokens))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = required(payload.refresh_token, "refresh_token")?;
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        ApiError::Unauthorized("Invalid or expired refresh token".into())
    })?;

    if state.revoked.is_revoked(claims.jti).await? {
        warn!(user_id = %claims.sub, jti = %claims.jti, "revoked refresh token reused");
        return Err(ApiError::Unauthorized("Token has been revoked".into()));
    }
    if state.users.find_by_id(claims.sub).await?.is_none() {
        return Err(ApiError::Unauthorized("User not found".into()));
    }

    // Rotation: the presented refresh token is single-use.
    state
        .revoked
        .revoke(claims.jti, claims.sub, claims.expires_at())
        .await?;
    purge_revocations(&state).await;

    let tokens = issue_tokens(&keys, claims.sub)?;
    info!(user_id = %claims.sub, "tokens refreshed");
    Ok(Json(tokens))
}

/// The body is optional; when present it must be a valid `LogoutRequest`.
#[instrument(skip(state, auth, body), fields(caller = %auth.user_id))]
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Bytes,
) -> Result<Json<MessageResponse>, ApiError> {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        LogoutRequest::default()
    } else {
        serde_json::from_slice::<LogoutRequest>(&body).map_err(|e| {
            ApiError::BadRequest(format!("Failed to deserialize the JSON body: {e}"))
        })?
    };

    state
        .revoked
        .revoke(auth.claims.jti, auth.user_id, auth.claims.expires_at())
        .await?;

    if let Some(token) = payload.refresh_token {
        match JwtKeys::from_ref(&state).verify_refresh(&token) {
            Ok(claims) if claims.sub == auth.user_id => {
                state
                    .revoked
                    .revoke(claims.jti, claims.sub, claims.expires_at())
                    .await?;
            }
            Ok(_) => warn!("logout refresh token belongs to another user; ignored"),
            Err(e) => warn!(error = %e, "logout refresh token invalid; ignored"),
        }
    }

    purge_revocations(&state).await;

    info!(user_id = %auth.user_id, "user logged out");
    Ok(Json(MessageResponse {
        message: "Successfully logged out",
    }))
}
