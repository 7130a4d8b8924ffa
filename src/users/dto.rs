use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for user registration. Presence is checked by the handler so
/// a missing field gets a specific message.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_password: Option<String>,
}

/// Partial profile update; absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_password: Option<String>,
    pub genre_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_email: Option<String>,
    pub user_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
