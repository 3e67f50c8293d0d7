// Core algorithm exports
pub mod activity;
pub mod error;
pub mod filters;
pub mod matcher;
pub mod reasoning;
pub mod scoring;

pub use activity::last_active_label;
pub use error::MatchError;
pub use filters::{filter_by_topic, matches_topic, mood_suits_goals, shared_interests};
pub use matcher::{CandidatePoolPolicy, MatchResult, Matcher};
pub use reasoning::{generate_reasoning, introduction_message};
pub use scoring::{calculate_compatibility, daily_jitter, ScoringContext};
