use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::ToggleOutcome;
use crate::state::AppState;

use super::auth::AuthContext;

#[derive(Debug, Deserialize)]
pub struct UpsertUserRequest {
    pub username: String,
    pub nickname: Option<String>,
}

/// Sync a user row from the identity collaborator. Called by the account
/// store on signup and profile changes, not by end users.
pub async fn upsert_user(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<UpsertUserRequest>,
) -> AppResult<HttpResponse> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }

    state
        .users
        .upsert(path.into_inner(), username, req.nickname.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "user synced" })))
}

pub async fn toggle_follow(
    state: web::Data<AppState>,
    auth: AuthContext,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .interactions
        .toggle_follow(auth.user_id, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "following": outcome == ToggleOutcome::Created,
    })))
}

pub async fn followers(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let users = state.users.followers(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn following(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let users = state.users.following(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(users))
}
