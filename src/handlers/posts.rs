use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::repository::{RepostToggle, ToggleOutcome};
use crate::state::AppState;

use super::auth::AuthContext;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub body: String,
    pub parent_id: Option<Uuid>,
    pub quote: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditPostRequest {
    pub body: Option<String>,
    pub quote: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RepostRequest {
    pub quote: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl PageQuery {
    /// Negative values would fail in `LIMIT`/`OFFSET` or wrap in the skip;
    /// clamp them so a bad page simply comes back empty.
    fn clamped(&self) -> (i64, i64) {
        (self.limit.max(0), self.offset.max(0))
    }
}

pub async fn create_post(
    state: web::Data<AppState>,
    auth: AuthContext,
    req: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner();
    let post = state
        .content
        .create_post(auth.user_id, req.parent_id, req.quote, &req.body, false)
        .await?;

    Ok(HttpResponse::Created().json(post))
}

pub async fn list_feed(
    state: web::Data<AppState>,
    page: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let (limit, offset) = page.clamped();
    let posts = state.content.list_recent(limit, offset).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.content.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn edit_post(
    state: web::Data<AppState>,
    auth: AuthContext,
    path: web::Path<Uuid>,
    req: web::Json<EditPostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .content
        .edit_post(
            auth.user_id,
            path.into_inner(),
            req.body.as_deref(),
            req.quote.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    state: web::Data<AppState>,
    auth: AuthContext,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .content
        .delete_post(auth.user_id, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "post deleted" })))
}

pub async fn toggle_repost(
    state: web::Data<AppState>,
    auth: AuthContext,
    path: web::Path<Uuid>,
    req: web::Json<RepostRequest>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .content
        .toggle_repost(auth.user_id, path.into_inner(), req.into_inner().quote)
        .await?;

    let response = match outcome {
        RepostToggle::Created(post) => serde_json::json!({
            "reposted": true,
            "post": post,
        }),
        RepostToggle::Removed => serde_json::json!({
            "reposted": false,
        }),
    };
    Ok(HttpResponse::Ok().json(response))
}

pub async fn toggle_like(
    state: web::Data<AppState>,
    auth: AuthContext,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .interactions
        .toggle_like(auth.user_id, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "liked": outcome == ToggleOutcome::Created,
    })))
}

pub async fn list_by_author(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    page: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let (limit, offset) = page.clamped();
    let posts = state
        .content
        .list_by_author(path.into_inner(), limit, offset)
        .await?;

    Ok(HttpResponse::Ok().json(posts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_clamps_negative_values() {
        let page = PageQuery {
            limit: -1,
            offset: -20,
        };
        assert_eq!(page.clamped(), (0, 0));

        let page = PageQuery {
            limit: 25,
            offset: 100,
        };
        assert_eq!(page.clamped(), (25, 100));
    }

    #[test]
    fn page_query_defaults() {
        let page: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(page.clamped(), (50, 0));
    }
}
