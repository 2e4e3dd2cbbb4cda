//! PostgreSQL implementations of the repository traits.

mod conversations;
mod counters;
mod edges;
mod posts;
mod search;
mod users;

pub use conversations::PgConversationRepository;
pub use counters::CounterLedger;
pub use edges::PgEdgeRepository;
pub use posts::PgPostRepository;
pub use search::PgSearchRepository;
pub use users::PgUserRepository;
