//! Synaps Match - compatibility matching service for the Synaps social chat app
//!
//! The core engine ranks candidate profiles for a requesting user: every
//! candidate gets a bounded compatibility score, a short explanation and a
//! "last active" label. Around it sit thin wrappers for the profile store,
//! the conversation database, caching and bearer-token auth, plus the
//! actix-web HTTP surface.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{CandidatePoolPolicy, MatchError, MatchResult, Matcher};
pub use crate::models::{MatchCandidate, MatchRequest, Profile, ScoringPolicy, ScoringRules};
