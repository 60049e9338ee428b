use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use sirius_types::{
    Account, LoginRequest, LoginResponse, Profile, RegisterRequest, UpdatePasswordRequest,
    UpdateProfileRequest,
};

use super::{get_user_from_headers, ApiError, ApiResult};
use crate::db::repositories::{AccountRepository, ProfileRepository};
use crate::password::{hash_password, verify_password};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

/// Response for the current-session lookup
#[derive(Serialize)]
pub struct MeResponse {
    pub account: Account,
    pub profile: Option<Profile>,
}

fn validate_credentials(email: &str, password: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// POST /auth/register - Create an account, seed the public profile, open a session
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<LoginResponse>> {
    validate_credentials(&payload.email, &payload.password)?;
    let email = payload.email.trim().to_lowercase();

    let account_repo = AccountRepository::new(state.db.pool.clone());
    let profile_repo = ProfileRepository::new(state.db.pool.clone());

    if account_repo
        .get_by_email(&email)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_some()
    {
        return Err(ApiError::BadRequest(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let account = Account {
        id: Uuid::new_v4(),
        email: email.clone(),
        password_hash,
        created_at: Utc::now(),
    };
    account_repo
        .create(&account)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    // The public row is what the feed and name lookups read
    profile_repo
        .upsert(&Profile {
            id: account.id,
            full_name: payload.full_name.clone(),
            career: payload.career.clone(),
            email: Some(email),
        })
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let session_token = state
        .session_manager
        .create_session(account.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!("Registered new account {}", account.id);

    Ok(Json(LoginResponse {
        account,
        session_token,
    }))
}

/// POST /auth/login - Email/password login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let account_repo = AccountRepository::new(state.db.pool.clone());
    let email = payload.email.trim().to_lowercase();

    // Same error for unknown email and wrong password
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let account = account_repo
        .get_by_email(&email)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &account.password_hash) {
        return Err(invalid());
    }

    let session_token = state
        .session_manager
        .create_session(account.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(LoginResponse {
        account,
        session_token,
    }))
}

/// POST /auth/logout - Delete the current session
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let token = headers
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    state
        .session_manager
        .delete_session(token)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

/// GET /auth/me - Current account plus public profile
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<MeResponse>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let account_repo = AccountRepository::new(state.db.pool.clone());
    let profile_repo = ProfileRepository::new(state.db.pool.clone());

    let account = account_repo
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    let profile = profile_repo
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(MeResponse { account, profile }))
}

/// PUT /auth/password - Re-verify the current password, then rehash and store
pub async fn update_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdatePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let account_repo = AccountRepository::new(state.db.pool.clone());
    let account = account_repo
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    if !verify_password(&payload.current_password, &account.password_hash) {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = hash_password(&payload.new_password)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    account_repo
        .update_password_hash(&user_id, &new_hash)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Password updated"
    })))
}

/// PUT /users/me/profile - Update own display fields
pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<Profile>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let profile_repo = ProfileRepository::new(state.db.pool.clone());

    if profile_repo
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_none()
    {
        // Account exists but never had a public row; seed one first
        let account_repo = AccountRepository::new(state.db.pool.clone());
        let email = account_repo
            .get_by_id(&user_id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?
            .map(|a| a.email);
        profile_repo
            .upsert(&Profile {
                id: user_id,
                full_name: None,
                career: None,
                email,
            })
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
    }

    profile_repo
        .update_display(
            &user_id,
            payload.full_name.as_deref(),
            payload.career.as_deref(),
        )
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let profile = profile_repo
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile))
}
