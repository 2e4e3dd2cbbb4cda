//! In-process implementation of the repository traits.
//!
//! Backed by a single mutex over the whole state, so every operation that
//! runs inside a Postgres transaction is atomic here by construction. Used
//! by the test suite and for running the service locally without a database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    canonical_pair, Conversation, ConversationSummary, FollowEdge, LikeEdge, Message, Post,
    PostWithParent, UserSummary,
};
use crate::error::{AppError, AppResult};
use crate::repository::{
    reject_self_edge, ConversationRepository, CounterTarget, EdgeKind, EdgeRepository,
    MatchStrategy, NewPost, PostRepository, PostSearchOrder, RepostToggle, SearchRepository,
    ToggleOutcome, UserRepository,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, UserSummary>,
    /// Insertion order doubles as chronological order.
    posts: Vec<Post>,
    follows: Vec<FollowEdge>,
    likes: Vec<LikeEdge>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
}

impl State {
    fn post(&self, id: Uuid) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    fn post_mut(&mut self, id: Uuid) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == id)
    }

    fn adjust(&mut self, target: CounterTarget, delta: i64) {
        match target {
            CounterTarget::PostLikes(id) => {
                if let Some(post) = self.post_mut(id) {
                    post.likes_count += delta;
                }
            }
            CounterTarget::PostReposts(id) => {
                if let Some(post) = self.post_mut(id) {
                    post.reposts_count += delta;
                }
            }
            CounterTarget::UserFollowers(id) => {
                if let Some(user) = self.users.get_mut(&id) {
                    user.follower_count += delta;
                }
            }
        }
    }

    fn edge_position(&self, kind: EdgeKind, a: Uuid, b: Uuid) -> Option<usize> {
        match kind {
            EdgeKind::Follow => self
                .follows
                .iter()
                .position(|e| e.follower_id == a && e.followed_id == b),
            EdgeKind::Like => self
                .likes
                .iter()
                .position(|e| e.user_id == a && e.post_id == b),
        }
    }

    fn push_edge(&mut self, kind: EdgeKind, a: Uuid, b: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        match kind {
            EdgeKind::Follow => self.follows.push(FollowEdge {
                id,
                follower_id: a,
                followed_id: b,
                created_at: Utc::now(),
            }),
            EdgeKind::Like => self.likes.push(LikeEdge {
                id,
                user_id: a,
                post_id: b,
                created_at: Utc::now(),
            }),
        }
        id
    }

    fn remove_edge(&mut self, kind: EdgeKind, position: usize) {
        match kind {
            EdgeKind::Follow => {
                self.follows.remove(position);
            }
            EdgeKind::Like => {
                self.likes.remove(position);
            }
        }
    }

    fn repost_position(&self, author_id: Uuid, target_id: Uuid) -> Option<usize> {
        self.posts
            .iter()
            .position(|p| p.author_id == author_id && p.parent_id == Some(target_id) && p.is_repost)
    }

    fn with_parent(&self, post: &Post) -> PostWithParent {
        let parent = post.parent_id.and_then(|pid| self.post(pid).cloned());
        PostWithParent {
            post: post.clone(),
            parent,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().expect("memory store mutex poisoned")
    }
}

#[async_trait]
impl EdgeRepository for MemoryStore {
    async fn exists(&self, kind: EdgeKind, a: Uuid, b: Uuid) -> AppResult<bool> {
        Ok(self.lock().edge_position(kind, a, b).is_some())
    }

    async fn create(&self, kind: EdgeKind, a: Uuid, b: Uuid) -> AppResult<Uuid> {
        reject_self_edge(kind, a, b)?;
        let mut state = self.lock();
        if state.edge_position(kind, a, b).is_some() {
            return Err(AppError::AlreadyExists(format!(
                "{:?} edge {} -> {}",
                kind, a, b
            )));
        }
        Ok(state.push_edge(kind, a, b))
    }

    async fn delete(&self, kind: EdgeKind, a: Uuid, b: Uuid) -> AppResult<()> {
        let mut state = self.lock();
        match state.edge_position(kind, a, b) {
            Some(position) => {
                state.remove_edge(kind, position);
                Ok(())
            }
            None => Err(AppError::NotFound(format!("{:?} edge {} -> {}", kind, a, b))),
        }
    }

    async fn toggle(
        &self,
        kind: EdgeKind,
        a: Uuid,
        b: Uuid,
        counter: CounterTarget,
    ) -> AppResult<ToggleOutcome> {
        reject_self_edge(kind, a, b)?;
        let mut state = self.lock();
        match state.edge_position(kind, a, b) {
            Some(position) => {
                state.remove_edge(kind, position);
                state.adjust(counter, -1);
                Ok(ToggleOutcome::Removed)
            }
            None => {
                state.push_edge(kind, a, b);
                state.adjust(counter, 1);
                Ok(ToggleOutcome::Created)
            }
        }
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert(&self, new_post: NewPost) -> AppResult<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            author_id: new_post.author_id,
            parent_id: new_post.parent_id,
            quote: new_post.quote,
            body: new_post.body,
            likes_count: 0,
            reposts_count: 0,
            is_repost: false,
            created_at: now,
            updated_at: now,
        };
        self.lock().posts.push(post.clone());
        Ok(post)
    }

    async fn insert_repost(
        &self,
        author_id: Uuid,
        target_id: Uuid,
        quote: Option<String>,
    ) -> AppResult<Post> {
        let mut state = self.lock();
        if state.repost_position(author_id, target_id).is_some() {
            return Err(AppError::AlreadyExists(format!(
                "repost of {} by {}",
                target_id, author_id
            )));
        }

        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            author_id,
            parent_id: Some(target_id),
            quote,
            body: String::new(),
            likes_count: 0,
            reposts_count: 0,
            is_repost: true,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(post.clone());
        state.adjust(CounterTarget::PostReposts(target_id), 1);
        Ok(post)
    }

    async fn toggle_repost(
        &self,
        author_id: Uuid,
        target_id: Uuid,
        quote: Option<String>,
    ) -> AppResult<RepostToggle> {
        // Check, flip and counter adjustment under one guard, matching the
        // single transaction the Postgres path uses.
        let mut state = self.lock();
        if let Some(position) = state.repost_position(author_id, target_id) {
            let repost = state.posts.remove(position);
            state.likes.retain(|l| l.post_id != repost.id);
            state.adjust(CounterTarget::PostReposts(target_id), -1);
            return Ok(RepostToggle::Removed);
        }

        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            author_id,
            parent_id: Some(target_id),
            quote,
            body: String::new(),
            likes_count: 0,
            reposts_count: 0,
            is_repost: true,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(post.clone());
        state.adjust(CounterTarget::PostReposts(target_id), 1);
        Ok(RepostToggle::Created(post))
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Post>> {
        Ok(self.lock().post(id).cloned())
    }

    async fn get_with_parent(&self, id: Uuid) -> AppResult<Option<PostWithParent>> {
        let state = self.lock();
        Ok(state.post(id).map(|post| state.with_parent(post)))
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> AppResult<Vec<PostWithParent>> {
        let state = self.lock();
        Ok(state
            .posts
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|post| state.with_parent(post))
            .collect())
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Post>> {
        Ok(self
            .lock()
            .posts
            .iter()
            .rev()
            .filter(|p| p.author_id == author_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update_content(
        &self,
        id: Uuid,
        body: Option<&str>,
        quote: Option<&str>,
    ) -> AppResult<Post> {
        let mut state = self.lock();
        let post = state
            .post_mut(id)
            .ok_or_else(|| AppError::NotFound("no post found".to_string()))?;

        if let Some(body) = body {
            post.body = body.to_string();
        }
        if let Some(quote) = quote {
            post.quote = Some(quote.to_string());
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete_cascade(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.lock();
        let Some(post) = state.post(id).cloned() else {
            return Err(AppError::NotFound("no post found".to_string()));
        };

        let repost_ids: Vec<Uuid> = state
            .posts
            .iter()
            .filter(|p| p.parent_id == Some(id) && p.is_repost)
            .map(|p| p.id)
            .collect();

        state
            .likes
            .retain(|l| l.post_id != id && !repost_ids.contains(&l.post_id));
        state
            .posts
            .retain(|p| p.id != id && !repost_ids.contains(&p.id));

        if post.is_repost {
            if let Some(parent_id) = post.parent_id {
                state.adjust(CounterTarget::PostReposts(parent_id), -1);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn find_or_create(&self, a: Uuid, b: Uuid) -> AppResult<Conversation> {
        let (participant_a, participant_b) = canonical_pair(a, b);
        let mut state = self.lock();

        if let Some(existing) = state
            .conversations
            .iter()
            .find(|c| c.participant_a == participant_a && c.participant_b == participant_b)
        {
            return Ok(existing.clone());
        }

        let conversation = Conversation {
            id: Uuid::new_v4(),
            participant_a,
            participant_b,
            created_at: Utc::now(),
        };
        state.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Conversation>> {
        Ok(self
            .lock()
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> AppResult<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.lock().messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, conversation_id: Uuid) -> AppResult<Vec<Message>> {
        // Append order is chronological.
        Ok(self
            .lock()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ConversationSummary>> {
        let state = self.lock();
        let mut summaries: Vec<ConversationSummary> = state
            .conversations
            .iter()
            .filter(|c| c.has_participant(user_id))
            .map(|c| {
                let last = state
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.conversation_id == c.id);
                ConversationSummary {
                    id: c.id,
                    participant_a: c.participant_a,
                    participant_b: c.participant_b,
                    last_message: last.map(|m| m.content.clone()),
                    last_activity_at: last.map(|m| m.created_at).unwrap_or(c.created_at),
                }
            })
            .collect();

        summaries.sort_by(|x, y| y.last_activity_at.cmp(&x.last_activity_at));
        Ok(summaries)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn upsert(&self, id: Uuid, username: &str, nickname: Option<&str>) -> AppResult<()> {
        let mut state = self.lock();
        match state.users.get_mut(&id) {
            Some(user) => {
                user.username = username.to_string();
                user.nickname = nickname.map(str::to_string);
            }
            None => {
                state.users.insert(
                    id,
                    UserSummary {
                        id,
                        username: username.to_string(),
                        nickname: nickname.map(str::to_string),
                        follower_count: 0,
                    },
                );
            }
        }
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.lock().users.contains_key(&id))
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<UserSummary>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn followers(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        let state = self.lock();
        Ok(state
            .follows
            .iter()
            .rev()
            .filter(|e| e.followed_id == user_id)
            .filter_map(|e| state.users.get(&e.follower_id).cloned())
            .collect())
    }

    async fn following(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        let state = self.lock();
        Ok(state
            .follows
            .iter()
            .rev()
            .filter(|e| e.follower_id == user_id)
            .filter_map(|e| state.users.get(&e.followed_id).cloned())
            .collect())
    }
}

#[async_trait]
impl SearchRepository for MemoryStore {
    async fn search_posts(
        &self,
        keyword: &str,
        strategy: MatchStrategy,
        order: PostSearchOrder,
    ) -> AppResult<Vec<Post>> {
        let matcher: Box<dyn Fn(&str) -> bool> = match strategy {
            MatchStrategy::WholeWord => {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(keyword));
                let re = regex::Regex::new(&pattern)
                    .map_err(|e| AppError::Internal(format!("invalid search pattern: {}", e)))?;
                Box::new(move |body: &str| re.is_match(body))
            }
            MatchStrategy::Substring => {
                let needle = keyword.to_lowercase();
                Box::new(move |body: &str| body.to_lowercase().contains(&needle))
            }
        };

        let state = self.lock();
        let mut posts: Vec<Post> = state
            .posts
            .iter()
            .rev()
            .filter(|p| matcher(&p.body))
            .cloned()
            .collect();

        if order == PostSearchOrder::Likes {
            posts.sort_by(|x, y| y.likes_count.cmp(&x.likes_count));
        }

        Ok(posts)
    }

    async fn search_users(&self, keyword: &str) -> AppResult<Vec<UserSummary>> {
        let needle = keyword.to_lowercase();
        let state = self.lock();
        let mut users: Vec<UserSummary> = state
            .users
            .values()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        users.sort_by(|x, y| {
            let exact_x = x.username.to_lowercase() != needle;
            let exact_y = y.username.to_lowercase() != needle;
            exact_x
                .cmp(&exact_y)
                .then(y.follower_count.cmp(&x.follower_count))
        });

        Ok(users)
    }
}
