use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::store::Role;
use crate::auth::token::bearer_token;
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

/// Exchange username/password for a bearer token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = req
        .username
        .filter(|u| !u.is_empty())
        .ok_or(AppError::MissingParameter("username"))?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or(AppError::MissingParameter("password"))?;

    let user = state
        .users
        .verify_credentials(&username, &password)
        .await
        .ok_or(AppError::BadCredentials)?;

    let token = state.tokens.issue(&user)?;
    tracing::info!(username = %user.username, "login succeeded");

    Ok(Json(LoginResponse {
        token,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        role: user.role,
        expires_in: state.tokens.expires_in_secs(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let token = bearer_token(&headers)?;
    let user = state.tokens.verify(token, state.users.as_ref()).await?;

    let current = req
        .current_password
        .filter(|p| !p.is_empty())
        .ok_or(AppError::MissingParameter("current_password"))?;
    let new = req
        .new_password
        .filter(|p| !p.is_empty())
        .ok_or(AppError::MissingParameter("new_password"))?;

    if state
        .users
        .verify_credentials(&user.username, &current)
        .await
        .is_none()
    {
        return Err(AppError::InvalidParameter(
            "current password is incorrect".to_string(),
        ));
    }

    if new.len() < 6 {
        return Err(AppError::InvalidParameter(
            "new password must be at least 6 characters long".to_string(),
        ));
    }

    state.users.update_password(&user.username, &new).await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}

/// Unauthenticated running banner with the route map.
pub async fn status() -> Json<Value> {
    Json(json!({
        "status": "running",
        "message": "usage gateway is running",
        "endpoints": {
            "login": "/api/login",
            "change_password": "/api/change-password",
            "costs": "/api/costs",
            "projects": "/api/projects",
            "usage": "/api/usage",
            "billing": "/api/billing",
            "subscription": "/api/subscription",
        },
        "timestamp": chrono::Local::now().to_rfc3339(),
    }))
}

pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = bearer_token(&headers)?;
    state.tokens.verify(token, state.users.as_ref()).await?;

    state.cache.clear();
    tracing::info!("response cache cleared");
    Ok(Json(json!({ "message": "cache cleared" })))
}

/// Cache configuration and size. Never includes secrets.
pub async fn cache_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let token = bearer_token(&headers)?;
    state.tokens.verify(token, state.users.as_ref()).await?;

    Ok(Json(json!({
        "ttl_seconds": state.cache.ttl().as_secs(),
        "entries": state.cache.len(),
    })))
}
