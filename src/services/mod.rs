pub mod content_graph;
pub mod conversations;
pub mod interactions;
pub mod search;

pub use content_graph::ContentGraph;
pub use conversations::ConversationThread;
pub use interactions::InteractionToggle;
pub use search::SearchRanker;
