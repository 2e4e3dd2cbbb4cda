//! Keyword lookup over posts and users.
//!
//! Short keywords use whole-word boundary matching to avoid substring noise
//! ("go" should not surface every "going"); longer keywords fall back to a
//! case-insensitive substring match. An empty result set is the normal
//! "no match" outcome, not a failure of the system.

use std::sync::Arc;

use crate::domain::{Post, UserSummary};
use crate::error::{AppError, AppResult};
use crate::repository::{MatchStrategy, PostSearchOrder, SearchRepository};

/// Keywords shorter than this are matched on word boundaries.
pub const SHORT_KEYWORD_LEN: usize = 3;

pub fn strategy_for(keyword: &str) -> MatchStrategy {
    if keyword.chars().count() < SHORT_KEYWORD_LEN {
        MatchStrategy::WholeWord
    } else {
        MatchStrategy::Substring
    }
}

#[derive(Clone)]
pub struct SearchRanker {
    search: Arc<dyn SearchRepository>,
}

impl SearchRanker {
    pub fn new(search: Arc<dyn SearchRepository>) -> Self {
        Self { search }
    }

    pub async fn search_posts(
        &self,
        keyword: &str,
        order: PostSearchOrder,
    ) -> AppResult<Vec<Post>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(AppError::Validation(
                "search keyword cannot be empty".to_string(),
            ));
        }

        let posts = self
            .search
            .search_posts(keyword, strategy_for(keyword), order)
            .await?;

        if posts.is_empty() {
            return Err(AppError::NotFound(format!(
                "no post found for keyword: {}",
                keyword
            )));
        }
        Ok(posts)
    }

    /// Username search: exact matches first, then by follower count
    /// descending.
    pub async fn search_users(&self, keyword: &str) -> AppResult<Vec<UserSummary>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(AppError::Validation(
                "search keyword cannot be empty".to_string(),
            ));
        }

        let users = self.search.search_users(keyword).await?;
        if users.is_empty() {
            return Err(AppError::NotFound("no users found".to_string()));
        }
        Ok(users)
    }
}
