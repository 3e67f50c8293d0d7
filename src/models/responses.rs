use serde::{Deserialize, Serialize};
use crate::models::domain::{ImportedMemory, MatchCandidate, Profile};

/// Response for the find matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesResponse {
    pub matches: Vec<MatchCandidate>,
    pub total_found: usize,
    pub message: String,
    pub fallback_mode: bool,
    pub search_criteria: SearchCriteria,
}

/// Echo of the criteria a search was run with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub topic: Option<String>,
    pub mood: Option<String>,
    pub conversation_type: Option<String>,
}

/// Response for the pure ranking endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResponse {
    pub matches: Vec<MatchCandidate>,
    pub total_candidates: usize,
    pub fallback_mode: bool,
    pub seeded: bool,
}

/// Profile read/update response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub profile: Profile,
}

/// Memory import response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryImportResponse {
    pub success: bool,
    pub imported_data: ImportedMemory,
    pub profile: Profile,
}

/// Response for the create connection endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectionResponse {
    pub success: bool,
    pub conversation_id: String,
    pub target_user: TargetUser,
    pub is_new_conversation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetUser {
    pub user_id: String,
    pub display_name: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
    pub cache: CacheStats,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Approximate; moka counts entries lazily
    pub l1_size: u64,
    pub l2_enabled: bool,
    pub ttl_secs: u64,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Human-readable summary line for a find-matches result
pub fn summary_message(found: usize, fallback_mode: bool, topic: Option<&str>) -> String {
    if fallback_mode {
        let topic_part = topic
            .filter(|t| !t.trim().is_empty())
            .map(|t| format!(" for \"{}\"", t))
            .unwrap_or_default();
        return format!(
            "No perfect matches found{}, but here are some active users you could talk to.",
            topic_part
        );
    }

    match found {
        0 => "Synaps is just starting! Be one of the first users: create your profile and start chatting.".to_string(),
        1 => "Found 1 compatible user!".to_string(),
        n => format!("Found {} compatible users!", n),
    }
}
