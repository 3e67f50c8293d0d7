use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::core::MatchError;
use crate::models::domain::{Profile, ProfileUpdate};

/// Input to a single matching call
///
/// Build it with [`MatchRequest::from_json`] when the payload comes from the
/// outside; that is the only place shape violations are reported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchRequest {
    pub requester: Profile,
    pub candidates: Vec<Profile>,
    pub topic: Option<String>,
    pub mood: Option<String>,
    pub limit: Option<usize>,
}

impl MatchRequest {
    pub fn new(requester: Profile, candidates: Vec<Profile>) -> Self {
        Self {
            requester,
            candidates,
            ..Default::default()
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Validate and decode a raw JSON request
    ///
    /// ```json
    /// {
    ///   "requester": { "id": "u1", "interests": ["chess"] },
    ///   "candidates": [ { "id": "u2" } ],
    ///   "topic": "music",
    ///   "limit": 10
    /// }
    /// ```
    ///
    /// Malformed optional profile fields are tolerated; only a missing
    /// requester, a non-sequence `candidates` or non-object entries fail.
    pub fn from_json(value: &Value) -> Result<Self, MatchError> {
        let body = value
            .as_object()
            .ok_or_else(|| MatchError::InvalidArgument("request body must be an object".into()))?;

        let requester = match body.get("requester") {
            Some(v @ Value::Object(_)) => decode_profile(v, "requester")?,
            _ => {
                return Err(MatchError::InvalidArgument(
                    "requester profile is required".into(),
                ))
            }
        };

        let candidates = match body.get("candidates") {
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(_) => decode_profile(item, &format!("candidates[{}]", i)),
                    _ => Err(MatchError::InvalidArgument(format!(
                        "candidates[{}] must be a profile object",
                        i
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => {
                return Err(MatchError::InvalidArgument(
                    "candidates must be a sequence of profiles".into(),
                ))
            }
        };

        let topic = optional_string(body.get("topic"), "topic")?;
        let mood = optional_string(body.get("mood"), "mood")?;

        let limit = match body.get("limit") {
            None | Some(Value::Null) => None,
            Some(v) => match v.as_u64() {
                Some(n) if n > 0 => Some(n as usize),
                _ => {
                    return Err(MatchError::InvalidArgument(
                        "limit must be a positive integer".into(),
                    ))
                }
            },
        };

        Ok(Self {
            requester,
            candidates,
            topic,
            mood,
            limit,
        })
    }
}

fn decode_profile(value: &Value, field: &str) -> Result<Profile, MatchError> {
    Profile::deserialize(value)
        .map(Profile::normalized)
        .map_err(|e| MatchError::InvalidArgument(format!("{} is not a valid profile: {}", field, e)))
}

fn optional_string(value: Option<&Value>, field: &str) -> Result<Option<String>, MatchError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(MatchError::InvalidArgument(format!(
            "{} must be a string",
            field
        ))),
    }
}

/// Request to find matches for the authenticated user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FindMatchesRequest {
    #[validate(length(max = 200))]
    #[serde(default)]
    pub topic: Option<String>,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub mood: Option<String>,
    #[validate(length(max = 100))]
    #[serde(default, alias = "conversation_type")]
    pub conversation_type: Option<String>,
    #[validate(range(min = 1, max = 20))]
    #[serde(default)]
    pub limit: Option<u16>,
}

impl FindMatchesRequest {
    /// Requested limit, or `default` when absent, never above `max`
    pub fn effective_limit(&self, default: usize, max: usize) -> usize {
        self.limit.map(usize::from).unwrap_or(default).min(max)
    }
}

/// Explicit profile edit
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(max = 50))]
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    #[validate(length(max = 100))]
    #[serde(default, alias = "currentMood")]
    pub mood: Option<String>,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub current_intentions: Option<String>,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub connection_goals: Option<String>,
    #[validate(length(max = 50))]
    #[serde(default, alias = "conversationTopics")]
    pub last_conversation_topics: Option<Vec<String>>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(req: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            interests: req.interests,
            mood: req.mood,
            current_intentions: req.current_intentions,
            connection_goals: req.connection_goals,
            last_conversation_topics: req.last_conversation_topics,
        }
        .normalized()
    }
}

/// Raw completion text returned by the insight-extraction prompt
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InsightsRequest {
    #[validate(length(min = 1, max = 20000))]
    pub completion: String,
    /// Assistant reply the insights were extracted from; stored with the insight
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub reply: Option<String>,
}

/// Raw memory summary exported from the user's assistant
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MemoryImportRequest {
    #[validate(length(min = 1, max = 20000))]
    pub memory: String,
}

/// Request to open a conversation with a selected candidate
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateConnectionRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "target_user_id", alias = "connectedUserId")]
    pub target_user_id: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub intro_message: Option<String>,
    #[validate(length(max = 2000))]
    #[serde(default, alias = "aiReasoning")]
    pub reasoning: Option<String>,
}
