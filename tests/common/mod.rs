//! Shared test harness: the full service stack wired to the in-process
//! memory store.

use std::sync::Arc;

use uuid::Uuid;

use pulse_service::repository::{MemoryStore, UserRepository};
use pulse_service::state::AppState;

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    TestApp {
        state: AppState::with_store(store.clone()),
        store,
    }
}

pub async fn seed_user(app: &TestApp, username: &str) -> Uuid {
    let id = Uuid::new_v4();
    app.state
        .users
        .upsert(id, username, None)
        .await
        .expect("seed user");
    id
}
