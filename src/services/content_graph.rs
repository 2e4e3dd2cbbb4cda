//! Post/repost/comment resolution: creation, parent-chain flattening,
//! ownership checks and edit/delete authorization.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{Post, PostWithParent};
use crate::error::{AppError, AppResult};
use crate::repository::{NewPost, PostRepository, RepostToggle, UserRepository};

#[derive(Clone)]
pub struct ContentGraph {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl ContentGraph {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    /// Create an original post, a comment (`parent_id` set) or a repost.
    ///
    /// Reposts resolve their target through [`Self::resolve_repost_target`]
    /// first, so the stored `parent_id` always points at an original; a
    /// duplicate repost by the same user is a conflict here (toggling lives
    /// in [`Self::toggle_repost`]).
    pub async fn create_post(
        &self,
        author_id: Uuid,
        parent_id: Option<Uuid>,
        quote: Option<String>,
        body: &str,
        is_repost: bool,
    ) -> AppResult<Post> {
        if !self.users.exists(author_id).await? {
            return Err(AppError::NotFound("no user found".to_string()));
        }

        if is_repost {
            let target_id = parent_id.ok_or_else(|| {
                AppError::InvalidOperand("a repost requires a target post".to_string())
            })?;
            let target = self.resolve_repost_target(target_id).await?;
            return self.posts.insert_repost(author_id, target.id, quote).await;
        }

        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::Validation("body cannot be empty".to_string()));
        }

        if let Some(parent_id) = parent_id {
            if self.posts.get(parent_id).await?.is_none() {
                return Err(AppError::NotFound("no post found".to_string()));
            }
        }

        let post = self
            .posts
            .insert(NewPost {
                author_id,
                parent_id,
                quote,
                body: body.to_string(),
            })
            .await?;

        info!(post_id = %post.id, author_id = %author_id, comment = post.is_comment(), "post created");
        Ok(post)
    }

    /// Resolve the post a repost should attach to. A repost candidate is
    /// followed one hop to its original, so the repost graph never exceeds
    /// depth 1; originals and comments resolve to themselves.
    pub async fn resolve_repost_target(&self, candidate_id: Uuid) -> AppResult<Post> {
        let candidate = self
            .posts
            .get(candidate_id)
            .await?
            .ok_or_else(|| AppError::NotFound("no post found".to_string()))?;

        if !candidate.is_repost {
            return Ok(candidate);
        }

        // Repost rows always point at a non-repost, so one hop suffices.
        let original_id = candidate.parent_id.ok_or_else(|| {
            AppError::Internal(format!("repost {} has no parent", candidate.id))
        })?;
        self.posts
            .get(original_id)
            .await?
            .ok_or_else(|| AppError::NotFound("no post found".to_string()))
    }

    /// Flip the caller's repost of the (resolved) target: create it when
    /// absent, remove it when present. Safe to re-issue.
    pub async fn toggle_repost(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        quote: Option<String>,
    ) -> AppResult<RepostToggle> {
        if !self.users.exists(user_id).await? {
            return Err(AppError::NotFound("no user found".to_string()));
        }

        let target = self.resolve_repost_target(target_id).await?;
        let outcome = self.posts.toggle_repost(user_id, target.id, quote).await?;

        match &outcome {
            RepostToggle::Created(post) => {
                info!(post_id = %post.id, target_id = %target.id, %user_id, "reposted")
            }
            RepostToggle::Removed => info!(target_id = %target.id, %user_id, "repost removed"),
        }
        Ok(outcome)
    }

    /// Edit body and/or quote. Only the author may edit; the body of a
    /// repost is immutable (its quote is not).
    pub async fn edit_post(
        &self,
        editor_id: Uuid,
        post_id: Uuid,
        new_body: Option<&str>,
        new_quote: Option<&str>,
    ) -> AppResult<Post> {
        let post = self
            .posts
            .get(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("no post found".to_string()))?;

        if post.author_id != editor_id {
            return Err(AppError::NotOwner);
        }

        if post.is_repost && new_body.is_some_and(|b| !b.trim().is_empty()) {
            return Err(AppError::RepostBodyImmutable);
        }

        if !post.is_repost && new_body.is_some_and(|b| b.trim().is_empty()) {
            return Err(AppError::Validation("body cannot be empty".to_string()));
        }

        self.posts.update_content(post_id, new_body, new_quote).await
    }

    /// Delete a post. Ownership check identical to edit; dependent reposts
    /// and like edges go with it in the same transaction, comments stay
    /// behind with an unavailable parent.
    pub async fn delete_post(&self, editor_id: Uuid, post_id: Uuid) -> AppResult<()> {
        let post = self
            .posts
            .get(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("no post found".to_string()))?;

        if post.author_id != editor_id {
            return Err(AppError::NotOwner);
        }

        self.posts.delete_cascade(post_id).await?;
        info!(%post_id, editor_id = %editor_id, "post deleted");
        Ok(())
    }

    pub async fn get_post(&self, post_id: Uuid) -> AppResult<PostWithParent> {
        self.posts
            .get_with_parent(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("no post found".to_string()))
    }

    pub async fn list_recent(&self, limit: i64, offset: i64) -> AppResult<Vec<PostWithParent>> {
        self.posts.list_recent(limit, offset).await
    }

    pub async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Post>> {
        if !self.users.exists(author_id).await? {
            return Err(AppError::NotFound("no user found".to_string()));
        }
        self.posts.list_by_author(author_id, limit, offset).await
    }
}
