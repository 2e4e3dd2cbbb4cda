use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - an original post, a comment (parent set, not a repost), or a
/// repost (parent set, empty body, optional quote).
///
/// `likes_count` and `reposts_count` are denormalized caches over the live
/// edge rows; the edge tables remain the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub quote: Option<String>,
    pub body: String,
    pub likes_count: i64,
    pub reposts_count: i64,
    pub is_repost: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_comment(&self) -> bool {
        self.parent_id.is_some() && !self.is_repost
    }
}

/// Post with its parent loaded explicitly. `parent` is `None` for top-level
/// posts and for comments/reposts whose parent has been deleted; clients
/// render the latter as "content unavailable".
#[derive(Debug, Clone, Serialize)]
pub struct PostWithParent {
    #[serde(flatten)]
    pub post: Post,
    pub parent: Option<Post>,
}

/// Follow edge - directed, unique per (follower, followed) pair
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FollowEdge {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Like edge - unique per (user, post) pair
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LikeEdge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Direct-message conversation between two users.
///
/// Participants are stored in canonical order (`participant_a` sorts before
/// `participant_b`), so any (a, b)/(b, a) pair maps to a single row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }

    /// The other side of the conversation, from `user_id`'s point of view.
    pub fn partner_of(&self, user_id: Uuid) -> Option<Uuid> {
        if self.participant_a == user_id {
            Some(self.participant_b)
        } else if self.participant_b == user_id {
            Some(self.participant_a)
        } else {
            None
        }
    }
}

/// Canonical ordering for a conversation participant pair.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Message entity - append-only, immutable once written
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Conversation plus latest-activity details, for inbox listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub participant_a: Uuid,
    pub participant_b: Uuid,
    pub last_message: Option<String>,
    /// Timestamp of the newest message, falling back to the conversation's
    /// creation time when no message exists yet.
    pub last_activity_at: DateTime<Utc>,
}

/// Local projection of a user owned by the external account store. Only the
/// attributes the interaction graph needs are mirrored here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub nickname: Option<String>,
    pub follower_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_is_direction_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(canonical_pair(a, b), canonical_pair(b, a));
    }

    #[test]
    fn canonical_pair_orders_participants() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (first, second) = canonical_pair(a, b);
        assert!(first <= second);
    }

    #[test]
    fn conversation_partner_lookup() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (participant_a, participant_b) = canonical_pair(a, b);
        let conversation = Conversation {
            id: Uuid::new_v4(),
            participant_a,
            participant_b,
            created_at: Utc::now(),
        };

        assert_eq!(conversation.partner_of(a), Some(b));
        assert_eq!(conversation.partner_of(b), Some(a));
        assert_eq!(conversation.partner_of(Uuid::new_v4()), None);
    }
}
