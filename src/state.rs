//! Shared application state: the four core services wired to a repository
//! backend.

use std::sync::Arc;

use sqlx::PgPool;

use crate::repository::{
    MemoryStore, PgConversationRepository, PgEdgeRepository, PgPostRepository,
    PgSearchRepository, PgUserRepository, UserRepository,
};
use crate::services::{ContentGraph, ConversationThread, InteractionToggle, SearchRanker};

#[derive(Clone)]
pub struct AppState {
    pub content: ContentGraph,
    pub interactions: InteractionToggle,
    pub conversations: ConversationThread,
    pub search: SearchRanker,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    /// Production wiring over PostgreSQL.
    pub fn postgres(pool: PgPool) -> Self {
        let posts = Arc::new(PgPostRepository::new(pool.clone()));
        let edges = Arc::new(PgEdgeRepository::new(pool.clone()));
        let users = Arc::new(PgUserRepository::new(pool.clone()));
        let conversations = Arc::new(PgConversationRepository::new(pool.clone()));
        let search = Arc::new(PgSearchRepository::new(pool));

        Self {
            content: ContentGraph::new(posts.clone(), users.clone()),
            interactions: InteractionToggle::new(edges, posts, users.clone()),
            conversations: ConversationThread::new(conversations, users.clone()),
            search: SearchRanker::new(search),
            users,
        }
    }

    /// Wiring over the single-mutex memory store; used by the test suite and
    /// for running locally without a database.
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self {
            content: ContentGraph::new(store.clone(), store.clone()),
            interactions: InteractionToggle::new(store.clone(), store.clone(), store.clone()),
            conversations: ConversationThread::new(store.clone(), store.clone()),
            search: SearchRanker::new(store.clone()),
            users: store,
        }
    }
}
