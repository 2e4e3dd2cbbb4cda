use sqlx::PgConnection;

use crate::error::AppResult;
use crate::repository::CounterTarget;

/// Applies denormalized counter deltas with a single atomic column update at
/// the storage layer, never read-modify-write in application code.
///
/// A ledger adjustment is only ever issued once per successful edge
/// transition (create -> +1, delete -> -1), on the connection of the
/// transaction that performed the transition. If that transaction rolls
/// back, the adjustment rolls back with it.
pub struct CounterLedger;

impl CounterLedger {
    pub async fn adjust(
        conn: &mut PgConnection,
        target: CounterTarget,
        delta: i64,
    ) -> AppResult<()> {
        match target {
            CounterTarget::PostLikes(post_id) => {
                sqlx::query("UPDATE posts SET likes_count = likes_count + $1 WHERE id = $2")
                    .bind(delta)
                    .bind(post_id)
                    .execute(conn)
                    .await?;
            }
            CounterTarget::PostReposts(post_id) => {
                sqlx::query("UPDATE posts SET reposts_count = reposts_count + $1 WHERE id = $2")
                    .bind(delta)
                    .bind(post_id)
                    .execute(conn)
                    .await?;
            }
            CounterTarget::UserFollowers(user_id) => {
                sqlx::query("UPDATE users SET follower_count = follower_count + $1 WHERE id = $2")
                    .bind(delta)
                    .bind(user_id)
                    .execute(conn)
                    .await?;
            }
        }

        Ok(())
    }
}
