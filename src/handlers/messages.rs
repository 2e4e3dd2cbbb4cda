use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::state::AppState;

use super::auth::AuthContext;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

pub async fn send_message(
    state: web::Data<AppState>,
    auth: AuthContext,
    path: web::Path<Uuid>,
    req: web::Json<SendMessageRequest>,
) -> AppResult<HttpResponse> {
    let message = state
        .conversations
        .send_direct(auth.user_id, path.into_inner(), &req.message)
        .await?;

    Ok(HttpResponse::Created().json(message))
}

pub async fn list_conversations(
    state: web::Data<AppState>,
    auth: AuthContext,
) -> AppResult<HttpResponse> {
    let conversations = state.conversations.list_conversations(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(conversations))
}

pub async fn list_messages(
    state: web::Data<AppState>,
    auth: AuthContext,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let messages = state
        .conversations
        .list_messages(path.into_inner(), auth.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(messages))
}
