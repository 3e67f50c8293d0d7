// Service exports
pub mod auth;
pub mod cache;
pub mod insights;
pub mod postgres;
pub mod profile_store;

pub use auth::{AuthError, Claims, TokenVerifier};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use insights::{
    memory_record, mood_label, parse_insights, parse_memory, ConversationInsights, InsightError,
};
pub use postgres::{ConversationStore, OpenedConversation, PostgresError};
pub use profile_store::{ProfileStoreClient, ProfileStoreError};
