use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::lenient;

/// Maximum number of items kept in `interests` / `lastConversationTopics`
pub const MAX_LIST_ITEMS: usize = 50;
/// Maximum length, in characters, of a single interest or topic
pub const MAX_ITEM_CHARS: usize = 100;
/// Maximum length, in characters, of free-text profile fields
pub const MAX_TEXT_CHARS: usize = 500;

/// User profile as seen by the matching engine
///
/// Every field except `id` is optional on input; absent, `null` or wrongly
/// typed values fall back to empty defaults. Call [`Profile::normalized`] at
/// the boundary before scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(alias = "userId", default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(alias = "display_name", default, deserialize_with = "lenient::string")]
    pub display_name: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub interests: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub mood: String,
    #[serde(alias = "current_intentions", default, deserialize_with = "lenient::string")]
    pub current_intentions: String,
    #[serde(alias = "connection_goals", default, deserialize_with = "lenient::string")]
    pub connection_goals: String,
    #[serde(
        alias = "last_conversation_topics",
        default,
        deserialize_with = "lenient::string_list"
    )]
    pub last_conversation_topics: Vec<String>,
    #[serde(alias = "updated_at", default, deserialize_with = "lenient::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Apply the list and text invariants: trimmed, deduplicated, bounded.
    pub fn normalized(self) -> Self {
        Self {
            id: self.id.trim().to_string(),
            display_name: clean_text(&self.display_name, MAX_TEXT_CHARS),
            interests: normalize_list(self.interests),
            mood: clean_text(&self.mood, MAX_TEXT_CHARS),
            current_intentions: clean_text(&self.current_intentions, MAX_TEXT_CHARS),
            connection_goals: clean_text(&self.connection_goals, MAX_TEXT_CHARS),
            last_conversation_topics: normalize_list(self.last_conversation_topics),
            updated_at: self.updated_at,
        }
    }

    /// Display name, or "Anonymous" when the profile has none
    pub fn name_or_anonymous(&self) -> &str {
        if self.display_name.is_empty() {
            "Anonymous"
        } else {
            &self.display_name
        }
    }
}

/// Strip markup brackets, trim and cap a free-text value
pub fn clean_text(value: &str, max_chars: usize) -> String {
    let stripped: String = value.chars().filter(|c| *c != '<' && *c != '>').collect();
    let trimmed = stripped.trim();
    if trimmed.chars().count() > max_chars {
        trimmed.chars().take(max_chars).collect::<String>().trim_end().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize an interest/topic list
///
/// Items are cleaned and capped at [`MAX_ITEM_CHARS`], empties dropped,
/// duplicates removed case-insensitively (first occurrence wins) and the list
/// is capped at [`MAX_LIST_ITEMS`].
pub fn normalize_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|item| clean_text(item, MAX_ITEM_CHARS))
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .take(MAX_LIST_ITEMS)
        .collect()
}

/// Ranked candidate produced by the matching engine
///
/// Created fresh for every request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub profile: Profile,
    pub compatibility_score: u8,
    pub reasoning: String,
    pub last_active_label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_interests: Vec<String>,
}

/// Partial profile update, produced by insight extraction or explicit edits
///
/// Serialized in the store's column naming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_intentions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_goals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_conversation_topics: Option<Vec<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.interests.is_none()
            && self.mood.is_none()
            && self.current_intentions.is_none()
            && self.connection_goals.is_none()
            && self.last_conversation_topics.is_none()
    }

    /// Same update with list and text invariants applied
    pub fn normalized(self) -> Self {
        Self {
            interests: self.interests.map(normalize_list),
            mood: self.mood.map(|m| clean_text(&m, MAX_TEXT_CHARS)),
            current_intentions: self
                .current_intentions
                .map(|s| clean_text(&s, MAX_TEXT_CHARS)),
            connection_goals: self.connection_goals.map(|s| clean_text(&s, MAX_TEXT_CHARS)),
            last_conversation_topics: self.last_conversation_topics.map(normalize_list),
        }
    }

    /// Merge this update into a profile and stamp `updated_at`
    pub fn apply(&self, profile: Profile, now: DateTime<Utc>) -> Profile {
        let mut profile = profile;
        if let Some(interests) = &self.interests {
            profile.interests = interests.clone();
        }
        if let Some(mood) = &self.mood {
            profile.mood = mood.clone();
        }
        if let Some(intentions) = &self.current_intentions {
            profile.current_intentions = intentions.clone();
        }
        if let Some(goals) = &self.connection_goals {
            profile.connection_goals = goals.clone();
        }
        if let Some(topics) = &self.last_conversation_topics {
            profile.last_conversation_topics = topics.clone();
        }
        profile.updated_at = Some(now);
        profile.normalized()
    }
}

/// Energy level stored when the insights carry none
pub const DEFAULT_ENERGY_LEVEL: u8 = 5;

/// One row of the store's `user_sessions` table: what a user wants today
///
/// Keyed by `(user_id, session_date)`; a later insight on the same day
/// replaces the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySession {
    pub user_id: String,
    pub session_date: NaiveDate,
    pub daily_goals: Option<String>,
    pub desired_conversation_type: Option<String>,
    pub topics_of_interest: Vec<String>,
    pub energy_level: u8,
}

/// Kind tag of an [`InsightRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    ConnectionIntentions,
    #[serde(rename = "chatgpt_memory_import")]
    MemoryImport,
}

/// One row of the store's `ai_insights` table
///
/// `metadata` holds the full parsed payload, including fields that have no
/// profile column such as personality traits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub user_id: String,
    pub insight_type: InsightKind,
    pub content: String,
    pub metadata: serde_json::Value,
}

/// Interests and habits imported from an assistant's long-term memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedMemory {
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub interests: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub preferences: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub communication_style: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub frequent_topics: Vec<String>,
}

impl ImportedMemory {
    /// Intentions written when the memory names no communication style
    pub const DEFAULT_INTENTIONS: &'static str = "Build meaningful connections";

    /// Stand-in used when the memory text cannot be parsed at all
    pub fn fallback() -> Self {
        Self {
            communication_style: Some("conversational".to_string()),
            ..Default::default()
        }
    }

    /// Profile fields implied by the memory
    ///
    /// Always sets `current_intentions`. Lists that normalize to nothing
    /// leave the stored ones untouched.
    pub fn to_update(&self) -> ProfileUpdate {
        let intentions = self
            .communication_style
            .as_deref()
            .map(|style| clean_text(style, MAX_TEXT_CHARS))
            .filter(|style| !style.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_INTENTIONS.to_string());

        ProfileUpdate {
            interests: non_empty_list(self.interests.clone()),
            current_intentions: Some(intentions),
            last_conversation_topics: non_empty_list(self.frequent_topics.clone()),
            ..Default::default()
        }
    }
}

/// Normalize a list, `None` when nothing usable is left
pub fn non_empty_list(items: Vec<String>) -> Option<Vec<String>> {
    Some(normalize_list(items)).filter(|items| !items.is_empty())
}

/// Scoring policy
///
/// `Baseline` is the product default. `Promotional` reproduces the old
/// "everyone scores high" behaviour with a per-day stable jitter instead of
/// randomness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    #[default]
    Baseline,
    Promotional,
}

/// Scoring constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringRules {
    pub policy: ScoringPolicy,
    pub base: u32,
    pub interest_increment: u32,
    pub interest_cap: u32,
    pub mood_match_bonus: u32,
    pub mood_default_bonus: u32,
    pub intention_bonus: u32,
    pub requested_mood_bonus: u32,
    pub promotional_base: u32,
    pub promotional_jitter: u32,
    pub min_score: u8,
    pub max_score: u8,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::Baseline,
            base: 50,
            interest_increment: 5,
            interest_cap: 10,
            mood_match_bonus: 15,
            mood_default_bonus: 5,
            intention_bonus: 10,
            requested_mood_bonus: 10,
            promotional_base: 85,
            promotional_jitter: 10,
            min_score: 10,
            max_score: 99,
        }
    }
}
