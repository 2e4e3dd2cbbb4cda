use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Post, PostWithParent};
use crate::error::{AppError, AppResult};
use crate::repository::{CounterTarget, NewPost, PostRepository, RepostToggle};

use super::counters::CounterLedger;

const POST_COLUMNS: &str = "id, author_id, parent_id, quote, body, likes_count, reposts_count, \
                            is_repost, created_at, updated_at";

/// Repository for the post/repost/comment graph.
///
/// `parent_id` is deliberately not a foreign key: deleting an original keeps
/// its comments, which then render as "content unavailable" when the parent
/// lookup comes back empty.
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Batch-load parents for a page of posts with a single query.
    async fn load_parents(&self, posts: &[Post]) -> AppResult<HashMap<Uuid, Post>> {
        let parent_ids: Vec<Uuid> = posts.iter().filter_map(|p| p.parent_id).collect();
        if parent_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let parents = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ANY($1)"
        ))
        .bind(&parent_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(parents.into_iter().map(|p| (p.id, p)).collect())
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn insert(&self, new_post: NewPost) -> AppResult<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "INSERT INTO posts (author_id, parent_id, quote, body, is_repost) \
             VALUES ($1, $2, $3, $4, FALSE) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(new_post.author_id)
        .bind(new_post.parent_id)
        .bind(new_post.quote)
        .bind(new_post.body)
        .fetch_one(&self.pool)
        .await?;

        debug!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn insert_repost(
        &self,
        author_id: Uuid,
        target_id: Uuid,
        quote: Option<String>,
    ) -> AppResult<Post> {
        let mut tx = self.pool.begin().await?;

        // The partial unique index on (author_id, parent_id) WHERE is_repost
        // rejects a second repost of the same target by the same user.
        let post: Option<Post> = sqlx::query_as(&format!(
            "INSERT INTO posts (author_id, parent_id, quote, body, is_repost) \
             VALUES ($1, $2, $3, '', TRUE) \
             ON CONFLICT (author_id, parent_id) WHERE is_repost DO NOTHING \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(author_id)
        .bind(target_id)
        .bind(quote)
        .fetch_optional(&mut *tx)
        .await?;

        let post = match post {
            Some(post) => post,
            None => {
                return Err(AppError::AlreadyExists(format!(
                    "repost of {} by {}",
                    target_id, author_id
                )))
            }
        };

        CounterLedger::adjust(&mut tx, CounterTarget::PostReposts(target_id), 1).await?;
        tx.commit().await?;

        debug!(post_id = %post.id, %target_id, "repost created");
        Ok(post)
    }

    async fn toggle_repost(
        &self,
        author_id: Uuid,
        target_id: Uuid,
        quote: Option<String>,
    ) -> AppResult<RepostToggle> {
        let mut tx = self.pool.begin().await?;

        let deleted: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM posts \
             WHERE author_id = $1 AND parent_id = $2 AND is_repost \
             RETURNING id",
        )
        .bind(author_id)
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(repost_id) = deleted {
            sqlx::query("DELETE FROM likes WHERE post_id = $1")
                .bind(repost_id)
                .execute(&mut *tx)
                .await?;
            CounterLedger::adjust(&mut tx, CounterTarget::PostReposts(target_id), -1).await?;
            tx.commit().await?;

            debug!(%repost_id, %target_id, "repost removed");
            return Ok(RepostToggle::Removed);
        }

        let inserted: Option<Post> = sqlx::query_as(&format!(
            "INSERT INTO posts (author_id, parent_id, quote, body, is_repost) \
             VALUES ($1, $2, $3, '', TRUE) \
             ON CONFLICT (author_id, parent_id) WHERE is_repost DO NOTHING \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(author_id)
        .bind(target_id)
        .bind(quote)
        .fetch_optional(&mut *tx)
        .await?;

        let post = match inserted {
            Some(post) => {
                CounterLedger::adjust(&mut tx, CounterTarget::PostReposts(target_id), 1).await?;
                post
            }
            // A concurrent toggle created the repost between our delete and
            // insert; the edge is PRESENT and the winner applied the +1.
            None => {
                sqlx::query_as(&format!(
                    "SELECT {POST_COLUMNS} FROM posts \
                     WHERE author_id = $1 AND parent_id = $2 AND is_repost"
                ))
                .bind(author_id)
                .bind(target_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;

        debug!(post_id = %post.id, %target_id, "repost created");
        Ok(RepostToggle::Created(post))
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn get_with_parent(&self, id: Uuid) -> AppResult<Option<PostWithParent>> {
        let Some(post) = self.get(id).await? else {
            return Ok(None);
        };

        let parent = match post.parent_id {
            Some(parent_id) => self.get(parent_id).await?,
            None => None,
        };

        Ok(Some(PostWithParent { post, parent }))
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> AppResult<Vec<PostWithParent>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut parents = self.load_parents(&posts).await?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let parent = post.parent_id.and_then(|pid| parents.remove(&pid));
                PostWithParent { post, parent }
            })
            .collect())
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn update_content(
        &self,
        id: Uuid,
        body: Option<&str>,
        quote: Option<&str>,
    ) -> AppResult<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts \
             SET body = COALESCE($2, body), quote = COALESCE($3, quote), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(body)
        .bind(quote)
        .fetch_optional(&self.pool)
        .await?;

        post.ok_or_else(|| AppError::NotFound("no post found".to_string()))
    }

    async fn delete_cascade(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let target: Option<(Option<Uuid>, bool)> =
            sqlx::query_as("SELECT parent_id, is_repost FROM posts WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((parent_id, is_repost)) = target else {
            return Err(AppError::NotFound("no post found".to_string()));
        };

        // Like edges on the post itself, then on its dependent reposts, then
        // the repost rows, then the post. Counters on the deleted rows
        // disappear with them.
        sqlx::query("DELETE FROM likes WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "DELETE FROM likes WHERE post_id IN \
             (SELECT id FROM posts WHERE parent_id = $1 AND is_repost)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM posts WHERE parent_id = $1 AND is_repost")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Deleting a repost directly releases its slot on the target.
        if is_repost {
            if let Some(parent_id) = parent_id {
                CounterLedger::adjust(&mut tx, CounterTarget::PostReposts(parent_id), -1).await?;
            }
        }

        tx.commit().await?;

        debug!(post_id = %id, "post deleted");
        Ok(())
    }
}
