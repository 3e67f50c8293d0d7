use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    domain::{clean_text, non_empty_list, DEFAULT_ENERGY_LEVEL, MAX_ITEM_CHARS},
    lenient, DailySession, ImportedMemory, InsightKind, InsightRecord, ProfileUpdate,
};

/// Intentions and goals are stored as short summaries
const MAX_SUMMARY_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Insight completion is empty")]
    Empty,

    #[error("Malformed insight payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Structured insights extracted from a chat exchange
///
/// Produced by the insight-extraction prompt; unknown keys are ignored and
/// wrongly typed values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationInsights {
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub current_intentions: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub connection_goals: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub conversation_topics: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub desired_conversation_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    pub energy_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub personality_traits: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional_f64")]
    pub mood_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub interests: Vec<String>,
}

impl ConversationInsights {
    /// Profile fields implied by these insights
    ///
    /// Absent values, and lists or text that clean down to nothing, leave
    /// the stored field untouched.
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            interests: non_empty_list(self.interests.clone()),
            mood: self.mood_score.map(|score| mood_label(score).to_string()),
            current_intentions: summary(self.current_intentions.as_deref()),
            connection_goals: summary(self.connection_goals.as_deref()),
            last_conversation_topics: non_empty_list(self.conversation_topics.clone()),
        }
    }

    /// Today's session row for `user_id`
    ///
    /// Energy is rounded onto 1..=10; a missing or non-positive level
    /// becomes [`DEFAULT_ENERGY_LEVEL`].
    pub fn daily_session(&self, user_id: &str, day: NaiveDate) -> DailySession {
        let energy_level = self
            .energy_level
            .filter(|level| *level > 0.0)
            .map(|level| level.round().clamp(1.0, 10.0) as u8)
            .unwrap_or(DEFAULT_ENERGY_LEVEL);

        DailySession {
            user_id: user_id.to_string(),
            session_date: day,
            daily_goals: summary(self.current_intentions.as_deref()),
            desired_conversation_type: self
                .desired_conversation_type
                .as_deref()
                .map(|kind| clean_text(kind, MAX_ITEM_CHARS))
                .filter(|kind| !kind.is_empty()),
            topics_of_interest: non_empty_list(self.conversation_topics.clone()).unwrap_or_default(),
            energy_level,
        }
    }

    /// Audit record of the whole payload, traits included
    pub fn record(&self, user_id: &str, content: &str) -> InsightRecord {
        InsightRecord {
            user_id: user_id.to_string(),
            insight_type: InsightKind::ConnectionIntentions,
            content: content.to_string(),
            metadata: serde_json::to_value(self).unwrap_or_default(),
        }
    }
}

fn summary(value: Option<&str>) -> Option<String> {
    value
        .map(|v| clean_text(v, MAX_SUMMARY_CHARS))
        .filter(|v| !v.is_empty())
}

/// Map a 0..1 mood score onto the stored mood label
pub fn mood_label(score: f64) -> &'static str {
    if score > 0.7 {
        "positive"
    } else if score > 0.4 {
        "neutral"
    } else {
        "reflective"
    }
}

/// Parse the raw completion text of the insight-extraction prompt
///
/// Models sometimes wrap the JSON in markdown fences or add a sentence
/// around it; both are tolerated.
pub fn parse_insights(completion: &str) -> Result<ConversationInsights, InsightError> {
    parse_completion(completion)
}

/// Parse an exported memory summary
///
/// Never fails: unusable text yields [`ImportedMemory::fallback`].
pub fn parse_memory(text: &str) -> ImportedMemory {
    parse_completion(text).unwrap_or_else(|e| {
        tracing::warn!("Unusable memory payload, importing defaults: {}", e);
        ImportedMemory::fallback()
    })
}

/// Audit record for an imported memory
pub fn memory_record(user_id: &str, memory: &ImportedMemory) -> InsightRecord {
    InsightRecord {
        user_id: user_id.to_string(),
        insight_type: InsightKind::MemoryImport,
        content: format!("Imported memory: {}", memory.interests.join(", ")),
        metadata: serde_json::to_value(memory).unwrap_or_default(),
    }
}

fn parse_completion<T: DeserializeOwned>(completion: &str) -> Result<T, InsightError> {
    let body = strip_code_fence(completion);
    if body.is_empty() {
        return Err(InsightError::Empty);
    }

    match serde_json::from_str(body) {
        Ok(parsed) => Ok(parsed),
        Err(err) => match (body.find('{'), body.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                Ok(serde_json::from_str(&body[start..=end])?)
            }
            _ => Err(InsightError::Malformed(err)),
        },
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches("json"),
    };

    rest.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "current_intentions": "Talk about starting a ceramics studio",
        "connection_goals": "Someone who runs a small creative business",
        "conversation_topics": ["ceramics", "small business"],
        "desired_conversation_type": "advice",
        "energy_level": 7,
        "personality_traits": ["curious"],
        "mood_score": 0.8,
        "interests": ["Ceramics", "Design", "ceramics"]
    }"#;

    #[test]
    fn test_parses_plain_and_fenced_json() {
        let plain = parse_insights(PAYLOAD).unwrap();
        let fenced = parse_insights(&format!("```json\n{}\n```", PAYLOAD)).unwrap();
        let bare_fence = parse_insights(&format!("```\n{}\n```", PAYLOAD)).unwrap();

        assert_eq!(plain, fenced);
        assert_eq!(plain, bare_fence);
        assert_eq!(plain.energy_level, Some(7.0));
    }

    #[test]
    fn test_parses_json_surrounded_by_prose() {
        let text = format!("Here is the analysis:\n{}\nLet me know!", PAYLOAD);
        let insights = parse_insights(&text).unwrap();
        assert_eq!(insights.conversation_topics, vec!["ceramics", "small business"]);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(parse_insights("   "), Err(InsightError::Empty)));
        assert!(matches!(parse_insights("```json\n```"), Err(InsightError::Empty)));
        assert!(matches!(
            parse_insights("I could not analyse this conversation."),
            Err(InsightError::Malformed(_))
        ));
    }

    #[test]
    fn test_mood_label_thresholds() {
        assert_eq!(mood_label(0.71), "positive");
        assert_eq!(mood_label(0.7), "neutral");
        assert_eq!(mood_label(0.41), "neutral");
        assert_eq!(mood_label(0.4), "reflective");
    }

    #[test]
    fn test_to_update() {
        let update = parse_insights(PAYLOAD).unwrap().to_update();

        assert_eq!(update.mood.as_deref(), Some("positive"));
        assert_eq!(update.interests, Some(vec!["Ceramics".to_string(), "Design".to_string()]));
        assert_eq!(
            update.last_conversation_topics,
            Some(vec!["ceramics".to_string(), "small business".to_string()])
        );
    }

    #[test]
    fn test_to_update_truncates_and_skips_empty() {
        let insights = ConversationInsights {
            current_intentions: Some("x".repeat(300)),
            connection_goals: Some("   ".to_string()),
            ..Default::default()
        };

        let update = insights.to_update();

        assert_eq!(update.current_intentions.map(|s| s.chars().count()), Some(100));
        assert!(update.connection_goals.is_none());
        assert!(update.interests.is_none());
        assert!(update.mood.is_none());
    }

    #[test]
    fn test_lists_that_clean_to_nothing_are_skipped() {
        let update = parse_insights(r#"{"interests": ["   ", "<>"], "conversation_topics": [""], "mood_score": 0.9}"#)
            .unwrap()
            .to_update();

        assert!(update.interests.is_none());
        assert!(update.last_conversation_topics.is_none());
        assert_eq!(update.mood.as_deref(), Some("positive"));
    }

    #[test]
    fn test_wrongly_typed_scalars_are_ignored() {
        let insights = parse_insights(
            r#"{"interests": ["Ceramics"], "energy_level": "high", "mood_score": "very",
                "current_intentions": "talk pottery", "connection_goals": 42}"#,
        )
        .unwrap();

        assert!(insights.energy_level.is_none());
        assert!(insights.mood_score.is_none());
        assert!(insights.connection_goals.is_none());

        let update = insights.to_update();
        assert_eq!(update.interests, Some(vec!["Ceramics".to_string()]));
        assert_eq!(update.current_intentions.as_deref(), Some("talk pottery"));
        assert!(update.mood.is_none());
    }

    #[test]
    fn test_daily_session_from_insights() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let session = parse_insights(PAYLOAD).unwrap().daily_session("user-1", day);

        assert_eq!(session.user_id, "user-1");
        assert_eq!(session.session_date, day);
        assert_eq!(session.daily_goals.as_deref(), Some("Talk about starting a ceramics studio"));
        assert_eq!(session.desired_conversation_type.as_deref(), Some("advice"));
        assert_eq!(session.topics_of_interest, vec!["ceramics", "small business"]);
        assert_eq!(session.energy_level, 7);
    }

    #[test]
    fn test_daily_session_energy_defaults_and_clamps() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let energy = |level: Option<f64>| {
            ConversationInsights {
                energy_level: level,
                ..Default::default()
            }
            .daily_session("u", day)
            .energy_level
        };

        assert_eq!(energy(None), DEFAULT_ENERGY_LEVEL);
        assert_eq!(energy(Some(0.0)), DEFAULT_ENERGY_LEVEL);
        assert_eq!(energy(Some(6.6)), 7);
        assert_eq!(energy(Some(42.0)), 10);
    }

    #[test]
    fn test_record_keeps_traits_in_metadata() {
        let record = parse_insights(PAYLOAD).unwrap().record("user-1", "Sounds like a plan!");

        assert_eq!(record.insight_type, InsightKind::ConnectionIntentions);
        assert_eq!(record.content, "Sounds like a plan!");
        assert_eq!(record.metadata["personality_traits"][0], "curious");
        assert_eq!(record.metadata["desired_conversation_type"], "advice");
    }

    #[test]
    fn test_parse_memory_falls_back_on_garbage() {
        assert_eq!(parse_memory("I don't have any memories yet."), ImportedMemory::fallback());

        let memory = parse_memory("```json\n{\"interests\": [\"Chess\"], \"frequent_topics\": [\"openings\"]}\n```");
        assert_eq!(memory.interests, vec!["Chess"]);
        assert!(memory.communication_style.is_none());

        let record = memory_record("user-1", &memory);
        assert_eq!(record.insight_type, InsightKind::MemoryImport);
        assert_eq!(record.content, "Imported memory: Chess");
    }
}
