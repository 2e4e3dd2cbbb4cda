//! Repository interfaces for the interaction graph.
//!
//! Every component talks to storage through these traits; nothing holds an
//! ambient database handle. Two implementations exist: `postgres` (the
//! production path, backed by transactions, unique constraints and atomic
//! column updates) and `memory` (a single-mutex store used by the test suite
//! and local development).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Conversation, ConversationSummary, Message, Post, PostWithParent, UserSummary};
use crate::error::{AppError, AppResult};

pub use memory::MemoryStore;
pub use postgres::{
    PgConversationRepository, PgEdgeRepository, PgPostRepository, PgSearchRepository,
    PgUserRepository,
};

/// Kind of relationship edge held in the edge tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Directed (follower, followed) pair
    Follow,
    /// (user, post) pair
    Like,
}

/// Follow edges are directed and never self-referential; the restriction
/// belongs to the edge store itself, not only to the callers composing it.
pub(crate) fn reject_self_edge(kind: EdgeKind, a: Uuid, b: Uuid) -> AppResult<()> {
    if kind == EdgeKind::Follow && a == b {
        return Err(AppError::InvalidOperand(
            "users cannot follow themselves".to_string(),
        ));
    }
    Ok(())
}

/// Denormalized counter adjusted in lockstep with an edge transition.
#[derive(Debug, Clone, Copy)]
pub enum CounterTarget {
    PostLikes(Uuid),
    PostReposts(Uuid),
    UserFollowers(Uuid),
}

/// Resulting state of a toggle call: the edge was just created (PRESENT) or
/// just removed (ABSENT).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Created,
    Removed,
}

/// Outcome of a repost toggle.
#[derive(Debug, Clone)]
pub enum RepostToggle {
    Created(Post),
    Removed,
}

/// Fields for a new post row. Reposts go through
/// [`PostRepository::insert_repost`] instead so the counter adjustment stays
/// inside the insert transaction.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub quote: Option<String>,
    pub body: String,
}

/// How a search keyword is matched against post bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Whole-word boundary match, used for short keywords to avoid
    /// substring noise.
    WholeWord,
    /// Case-insensitive substring match.
    Substring,
}

/// Result ordering for post search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSearchOrder {
    Likes,
    Recency,
}

/// Exactly-once relationship store for follow and like edges.
#[async_trait]
pub trait EdgeRepository: Send + Sync {
    async fn exists(&self, kind: EdgeKind, a: Uuid, b: Uuid) -> AppResult<bool>;

    /// Create an edge. Fails with `AlreadyExists` when the pair is already
    /// present; uniqueness is enforced by the storage layer, not by a
    /// read-then-write in application code.
    async fn create(&self, kind: EdgeKind, a: Uuid, b: Uuid) -> AppResult<Uuid>;

    /// Delete an edge. Fails with `NotFound` when no such edge exists.
    async fn delete(&self, kind: EdgeKind, a: Uuid, b: Uuid) -> AppResult<()>;

    /// Atomically flip the edge state and apply the matching counter delta.
    ///
    /// Existence check, edge mutation and counter adjustment execute inside
    /// one storage transaction, so two concurrent toggles for the same pair
    /// can never double-create the edge or double-apply the delta.
    async fn toggle(
        &self,
        kind: EdgeKind,
        a: Uuid,
        b: Uuid,
        counter: CounterTarget,
    ) -> AppResult<ToggleOutcome>;
}

/// Storage for the post/repost/comment graph.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, new_post: NewPost) -> AppResult<Post>;

    /// Insert a repost of `target_id` and bump the target's reposts_count in
    /// the same transaction. Fails with `AlreadyExists` when the user has
    /// already reposted the target.
    async fn insert_repost(
        &self,
        author_id: Uuid,
        target_id: Uuid,
        quote: Option<String>,
    ) -> AppResult<Post>;

    /// Atomic repost flip for an already-resolved target: delete the
    /// existing repost row (and decrement) or insert a new one (and
    /// increment), all in one transaction.
    async fn toggle_repost(
        &self,
        author_id: Uuid,
        target_id: Uuid,
        quote: Option<String>,
    ) -> AppResult<RepostToggle>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Post>>;

    /// Post plus its parent in one explicit lookup; `parent` is `None` when
    /// the parent was deleted.
    async fn get_with_parent(&self, id: Uuid) -> AppResult<Option<PostWithParent>>;

    /// Global feed, newest first, parents populated.
    async fn list_recent(&self, limit: i64, offset: i64) -> AppResult<Vec<PostWithParent>>;

    async fn list_by_author(&self, author_id: Uuid, limit: i64, offset: i64)
        -> AppResult<Vec<Post>>;

    /// Update body and/or quote; `None` leaves the field untouched. There is
    /// no clear operation: an omitted field means "unchanged", so a quote
    /// once set can only be replaced, never removed. Returns the updated
    /// row.
    async fn update_content(
        &self,
        id: Uuid,
        body: Option<&str>,
        quote: Option<&str>,
    ) -> AppResult<Post>;

    /// Delete a post together with its dependent rows: like edges on the
    /// post, repost rows pointing at it and their like edges. When the post
    /// itself is a repost, the target's reposts_count is decremented in the
    /// same transaction. Comments survive with a dangling parent.
    async fn delete_cascade(&self, id: Uuid) -> AppResult<()>;
}

/// Storage for direct-message conversations.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Look up the conversation for the canonicalized pair, creating it when
    /// absent. The unique constraint on the pair guarantees a single row
    /// regardless of argument order or concurrent callers.
    async fn find_or_create(&self, a: Uuid, b: Uuid) -> AppResult<Conversation>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Conversation>>;

    async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> AppResult<Message>;

    /// All messages of a conversation, ascending by creation time.
    async fn list_messages(&self, conversation_id: Uuid) -> AppResult<Vec<Message>>;

    /// A user's conversations, newest activity first; conversations without
    /// messages fall back to their creation time.
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ConversationSummary>>;
}

/// Local projection of the external account store.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Sync a user row from the identity collaborator.
    async fn upsert(&self, id: Uuid, username: &str, nickname: Option<&str>) -> AppResult<()>;

    async fn exists(&self, id: Uuid) -> AppResult<bool>;

    async fn get(&self, id: Uuid) -> AppResult<Option<UserSummary>>;

    /// Users following `user_id`.
    async fn followers(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>>;

    /// Users that `user_id` follows.
    async fn following(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>>;
}

/// Read-only keyword lookup over posts and users.
#[async_trait]
pub trait SearchRepository: Send + Sync {
    async fn search_posts(
        &self,
        keyword: &str,
        strategy: MatchStrategy,
        order: PostSearchOrder,
    ) -> AppResult<Vec<Post>>;

    /// Substring match on username; exact matches rank first, then by
    /// follower count descending.
    async fn search_users(&self, keyword: &str) -> AppResult<Vec<UserSummary>>;
}
