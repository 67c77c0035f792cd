//! Account handlers: registration, login and the `me` surface.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use quill_core::domain::{Profile, User};
use quill_core::ports::{PasswordService, TokenService};
use quill_shared::dto::{
    AuthResponse, LoginRequest, MeResponse, ProfileResponse, RegisterRequest,
    UpdateAccountRequest, UserResponse,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn validate_account_fields(username: &str, email: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if username.trim().is_empty() {
        errors.push("username is required".to_string());
    }
    if email.is_empty() || !email.contains('@') {
        errors.push("a valid email address is required".to_string());
    }
    errors
}

fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        created_at: user.created_at.to_rfc3339(),
    }
}

fn profile_response(profile: &Profile) -> ProfileResponse {
    ProfileResponse {
        id: profile.id.to_string(),
        user_id: profile.user_id.to_string(),
    }
}

/// POST /api/auth/register
///
/// Creates the account and its profile in one operation.
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let mut errors = validate_account_fields(&req.username, &req.email);
    if req.password.is_empty() {
        errors.push("password is required".to_string());
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = password_service
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = User::new(req.username, req.email, password_hash);
    let created = state.accounts.register(user).await?;

    let token = token_service
        .generate_token(created.id, &created.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Created().json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds() as u64,
    }))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .accounts
        .find_by_username(&req.username)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = password_service
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        return Err(AppError::Unauthorized);
    }

    let token = token_service
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds() as u64,
    }))
}

/// GET /api/auth/me - the authenticated account with its profile.
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let (user, profile) = state.accounts.find(identity.user_id).await?;

    Ok(HttpResponse::Ok().json(MeResponse {
        user: user_response(&user),
        profile: profile_response(&profile),
    }))
}

/// PUT /api/auth/me - update username/email; the profile is re-persisted
/// with the account.
pub async fn update_me(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<UpdateAccountRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let errors = validate_account_fields(&req.username, &req.email);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if let Some(existing) = state.accounts.find_by_username(&req.username).await? {
        if existing.id != identity.user_id {
            return Err(AppError::Conflict(format!(
                "username '{}' is already taken",
                req.username
            )));
        }
    }

    let (mut user, _) = state.accounts.find(identity.user_id).await?;
    user.username = req.username;
    user.email = req.email;

    let saved = state.accounts.update(user).await?;
    Ok(HttpResponse::Ok().json(user_response(&saved)))
}

/// DELETE /api/auth/me - delete the account, its profile and all its posts.
pub async fn delete_me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    state.accounts.delete(identity.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
