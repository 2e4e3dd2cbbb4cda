//! Idempotent like/unlike and follow/unfollow toggles.
//!
//! Each toggle is a two-state machine per (actor, target) pair: every call
//! flips between ABSENT and PRESENT and applies the matching counter delta.
//! The flip and the delta run in one storage transaction (see
//! `EdgeRepository::toggle`), closing the read-then-write race of the naive
//! check-then-act sequence.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::{
    CounterTarget, EdgeKind, EdgeRepository, PostRepository, ToggleOutcome, UserRepository,
};

#[derive(Clone)]
pub struct InteractionToggle {
    edges: Arc<dyn EdgeRepository>,
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl InteractionToggle {
    pub fn new(
        edges: Arc<dyn EdgeRepository>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            edges,
            posts,
            users,
        }
    }

    pub async fn toggle_like(&self, user_id: Uuid, post_id: Uuid) -> AppResult<ToggleOutcome> {
        if !self.users.exists(user_id).await? {
            return Err(AppError::NotFound("no user found".to_string()));
        }
        if self.posts.get(post_id).await?.is_none() {
            return Err(AppError::NotFound("no post found".to_string()));
        }

        let outcome = self
            .edges
            .toggle(
                EdgeKind::Like,
                user_id,
                post_id,
                CounterTarget::PostLikes(post_id),
            )
            .await?;

        info!(%user_id, %post_id, liked = outcome == ToggleOutcome::Created, "like toggled");
        Ok(outcome)
    }

    pub async fn toggle_follow(
        &self,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> AppResult<ToggleOutcome> {
        if follower_id == followed_id {
            return Err(AppError::InvalidOperand(
                "users cannot follow themselves".to_string(),
            ));
        }
        if !self.users.exists(follower_id).await? || !self.users.exists(followed_id).await? {
            return Err(AppError::NotFound("no user found".to_string()));
        }

        let outcome = self
            .edges
            .toggle(
                EdgeKind::Follow,
                follower_id,
                followed_id,
                CounterTarget::UserFollowers(followed_id),
            )
            .await?;

        info!(
            %follower_id,
            %followed_id,
            following = outcome == ToggleOutcome::Created,
            "follow toggled"
        );
        Ok(outcome)
    }

    pub async fn is_liked(&self, user_id: Uuid, post_id: Uuid) -> AppResult<bool> {
        self.edges.exists(EdgeKind::Like, user_id, post_id).await
    }

    pub async fn is_following(&self, follower_id: Uuid, followed_id: Uuid) -> AppResult<bool> {
        self.edges
            .exists(EdgeKind::Follow, follower_id, followed_id)
            .await
    }
}
