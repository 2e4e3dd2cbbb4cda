use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::repository::{reject_self_edge, CounterTarget, EdgeKind, EdgeRepository, ToggleOutcome};

use super::counters::CounterLedger;

/// Exactly-once edge store backed by the `follows` and `likes` tables.
///
/// Uniqueness comes from the unique indexes on (follower_id, followed_id)
/// and (user_id, post_id); inserts use `ON CONFLICT DO NOTHING` so a
/// concurrent duplicate surfaces as zero returned rows instead of an error.
#[derive(Clone)]
pub struct PgEdgeRepository {
    pool: PgPool,
}

impl PgEdgeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn exists_sql(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Follow => {
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2)"
        }
        EdgeKind::Like => {
            "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = $1 AND post_id = $2)"
        }
    }
}

fn insert_sql(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Follow => {
            "INSERT INTO follows (follower_id, followed_id) VALUES ($1, $2) \
             ON CONFLICT (follower_id, followed_id) DO NOTHING RETURNING id"
        }
        EdgeKind::Like => {
            "INSERT INTO likes (user_id, post_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, post_id) DO NOTHING RETURNING id"
        }
    }
}

fn delete_sql(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Follow => "DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2",
        EdgeKind::Like => "DELETE FROM likes WHERE user_id = $1 AND post_id = $2",
    }
}

#[async_trait]
impl EdgeRepository for PgEdgeRepository {
    async fn exists(&self, kind: EdgeKind, a: Uuid, b: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(exists_sql(kind))
            .bind(a)
            .bind(b)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn create(&self, kind: EdgeKind, a: Uuid, b: Uuid) -> AppResult<Uuid> {
        reject_self_edge(kind, a, b)?;
        let id: Option<Uuid> = sqlx::query_scalar(insert_sql(kind))
            .bind(a)
            .bind(b)
            .fetch_optional(&self.pool)
            .await?;

        id.ok_or_else(|| AppError::AlreadyExists(format!("{:?} edge {} -> {}", kind, a, b)))
    }

    async fn delete(&self, kind: EdgeKind, a: Uuid, b: Uuid) -> AppResult<()> {
        let result = sqlx::query(delete_sql(kind))
            .bind(a)
            .bind(b)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{:?} edge {} -> {}",
                kind, a, b
            )));
        }

        Ok(())
    }

    async fn toggle(
        &self,
        kind: EdgeKind,
        a: Uuid,
        b: Uuid,
        counter: CounterTarget,
    ) -> AppResult<ToggleOutcome> {
        reject_self_edge(kind, a, b)?;
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(delete_sql(kind))
            .bind(a)
            .bind(b)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let outcome = if deleted > 0 {
            CounterLedger::adjust(&mut tx, counter, -1).await?;
            ToggleOutcome::Removed
        } else {
            let inserted: Option<Uuid> = sqlx::query_scalar(insert_sql(kind))
                .bind(a)
                .bind(b)
                .fetch_optional(&mut *tx)
                .await?;

            // On conflict a concurrent toggle won the insert race; its
            // transaction owns the +1, so the delta is skipped here.
            if inserted.is_some() {
                CounterLedger::adjust(&mut tx, counter, 1).await?;
            }
            ToggleOutcome::Created
        };

        tx.commit().await?;

        debug!(?kind, %a, %b, ?outcome, "edge toggled");
        Ok(outcome)
    }
}
