use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::domain::UserSummary;
use crate::error::AppResult;
use crate::repository::UserRepository;

/// Local projection of the external account store. Follow edges and the
/// denormalized follower_count live against these rows; credentials never
/// reach this service.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn upsert(&self, id: Uuid, username: &str, nickname: Option<&str>) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, nickname)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                nickname = EXCLUDED.nickname,
                updated_at = NOW()
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(nickname)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %id, %username, "user projection upserted");
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<UserSummary>> {
        let user = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, nickname, follower_count FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn followers(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.nickname, u.follower_count
            FROM users u
            JOIN follows f ON f.follower_id = u.id
            WHERE f.followed_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn following(&self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.nickname, u.follower_count
            FROM users u
            JOIN follows f ON f.followed_id = u.id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
