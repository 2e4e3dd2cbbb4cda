use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{Post, UserSummary};
use crate::error::AppResult;
use crate::repository::{MatchStrategy, PostSearchOrder, SearchRepository};

const POST_COLUMNS: &str = "id, author_id, parent_id, quote, body, likes_count, reposts_count, \
                            is_repost, created_at, updated_at";

/// Keyword search over posts and the user projection.
#[derive(Clone)]
pub struct PgSearchRepository {
    pool: PgPool,
}

impl PgSearchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so the keyword matches literally.
fn escape_like(keyword: &str) -> String {
    keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl SearchRepository for PgSearchRepository {
    async fn search_posts(
        &self,
        keyword: &str,
        strategy: MatchStrategy,
        order: PostSearchOrder,
    ) -> AppResult<Vec<Post>> {
        let order_sql = match order {
            PostSearchOrder::Likes => "likes_count DESC",
            PostSearchOrder::Recency => "created_at DESC",
        };

        let (filter_sql, pattern) = match strategy {
            // \m and \M are Postgres word-boundary anchors.
            MatchStrategy::WholeWord => (
                "body ~* $1",
                format!(r"\m{}\M", regex::escape(keyword)),
            ),
            MatchStrategy::Substring => ("body ILIKE $1", format!("%{}%", escape_like(keyword))),
        };

        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE {filter_sql} ORDER BY {order_sql}"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn search_users(&self, keyword: &str) -> AppResult<Vec<UserSummary>> {
        // Exact username matches take the first tier, the rest rank by
        // follower count.
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, username, nickname, follower_count
            FROM users
            WHERE username ILIKE $1
            ORDER BY CASE WHEN LOWER(username) = LOWER($2) THEN 0 ELSE 1 END ASC,
                     follower_count DESC
            "#,
        )
        .bind(format!("%{}%", escape_like(keyword)))
        .bind(keyword)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_escape_keeps_wildcards_literal() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like(r"back\slash"), r"back\\slash");
    }
}
