use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::AppResult;
use crate::repository::PostSearchOrder;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: String,
    #[serde(default)]
    pub order: SearchOrder,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOrder {
    #[default]
    Likes,
    Recent,
}

impl From<SearchOrder> for PostSearchOrder {
    fn from(order: SearchOrder) -> Self {
        match order {
            SearchOrder::Likes => PostSearchOrder::Likes,
            SearchOrder::Recent => PostSearchOrder::Recency,
        }
    }
}

pub async fn search_posts(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let posts = state
        .search
        .search_posts(&query.keyword, query.order.into())
        .await?;

    Ok(HttpResponse::Ok().json(posts))
}

pub async fn search_users(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let users = state.search.search_users(&query.keyword).await?;
    Ok(HttpResponse::Ok().json(users))
}
