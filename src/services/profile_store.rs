use crate::models::{lenient, DailySession, InsightRecord, Profile, ProfileUpdate};
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with the profile store
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid service key")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

const INSIGHTS_TABLE: &str = "ai_insights";
const SESSIONS_TABLE: &str = "user_sessions";

/// Row shape of the `profiles` table
#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default, deserialize_with = "lenient::string")]
    user_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    display_name: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    interests: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    mood: String,
    #[serde(default, deserialize_with = "lenient::string")]
    current_intentions: String,
    #[serde(default, deserialize_with = "lenient::string")]
    connection_goals: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    last_conversation_topics: Vec<String>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    updated_at: Option<DateTime<Utc>>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.user_id,
            display_name: row.display_name,
            interests: row.interests,
            mood: row.mood,
            current_intentions: row.current_intentions,
            connection_goals: row.connection_goals,
            last_conversation_topics: row.last_conversation_topics,
            updated_at: row.updated_at,
        }
        .normalized()
    }
}

/// Profile store client
///
/// Talks to the BaaS auto-generated REST layer (PostgREST) for:
/// - Fetching a user's profile
/// - Listing candidate profiles
/// - Writing profile updates from insight extraction or user edits
/// - Appending insight records and upserting daily sessions
pub struct ProfileStoreClient {
    base_url: String,
    api_key: String,
    table: String,
    client: Client,
}

impl ProfileStoreClient {
    /// Create a new profile store client
    pub fn new(
        base_url: String,
        api_key: String,
        table: String,
        timeout_secs: u64,
    ) -> Result<Self, ProfileStoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            table,
            client,
        })
    }

    fn table_url(&self) -> String {
        self.rest_url(&self.table)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Fetch the profile for a given user ID
    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, ProfileStoreError> {
        let url = format!(
            "{}?select=*&user_id=eq.{}&limit=1",
            self.table_url(),
            urlencoding::encode(user_id)
        );

        tracing::debug!("Fetching profile for user: {}", user_id);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let rows = read_rows(check_status(response, "fetch profile").await?).await?;

        rows.into_iter()
            .next()
            .map(Profile::from)
            .ok_or_else(|| ProfileStoreError::NotFound(format!("Profile not found for user {}", user_id)))
    }

    /// List candidate profiles, most recently active first
    ///
    /// Excludes the requesting user and profiles without a display name.
    pub async fn list_candidates(
        &self,
        exclude_user_id: &str,
        limit: usize,
    ) -> Result<Vec<Profile>, ProfileStoreError> {
        let url = format!(
            "{}?select=*&user_id=neq.{}&display_name=not.is.null&order=updated_at.desc&limit={}",
            self.table_url(),
            urlencoding::encode(exclude_user_id),
            limit
        );

        let response = self.authorized(self.client.get(&url)).send().await?;
        let rows = read_rows(check_status(response, "list candidates").await?).await?;

        let profiles: Vec<Profile> = rows
            .into_iter()
            .map(Profile::from)
            .filter(|p| !p.id.is_empty() && p.id != exclude_user_id)
            .collect();

        tracing::debug!("Listed {} candidates for {}", profiles.len(), exclude_user_id);

        Ok(profiles)
    }

    /// Apply a partial update and return the stored profile
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, ProfileStoreError> {
        let url = format!(
            "{}?user_id=eq.{}",
            self.table_url(),
            urlencoding::encode(user_id)
        );

        let mut payload = serde_json::to_value(update)
            .map_err(|e| ProfileStoreError::InvalidResponse(format!("Failed to encode update: {}", e)))?;
        if let Some(obj) = payload.as_object_mut() {
            obj.insert(
                "updated_at".to_string(),
                serde_json::Value::String(Utc::now().to_rfc3339()),
            );
        }

        let response = self
            .authorized(self.client.patch(&url))
            .header("Prefer", "return=representation")
            .json(&payload)
            .send()
            .await?;
        let rows = read_rows(check_status(response, "update profile").await?).await?;

        tracing::debug!("Updated profile for user: {}", user_id);

        rows.into_iter()
            .next()
            .map(Profile::from)
            .ok_or_else(|| ProfileStoreError::NotFound(format!("Profile not found for user {}", user_id)))
    }

    /// Append an insight record
    pub async fn record_insight(&self, record: &InsightRecord) -> Result<(), ProfileStoreError> {
        let url = self.rest_url(INSIGHTS_TABLE);
        self.insert(&url, "return=minimal", record, "record insight").await?;

        tracing::debug!("Recorded {:?} insight for user: {}", record.insight_type, record.user_id);
        Ok(())
    }

    /// Create or replace the session row for the session's day
    pub async fn upsert_session(&self, session: &DailySession) -> Result<(), ProfileStoreError> {
        let url = format!("{}?on_conflict=user_id,session_date", self.rest_url(SESSIONS_TABLE));
        self.insert(
            &url,
            "resolution=merge-duplicates,return=minimal",
            session,
            "upsert session",
        )
        .await?;

        tracing::debug!("Upserted session {} for user: {}", session.session_date, session.user_id);
        Ok(())
    }

    async fn insert<T: Serialize>(
        &self,
        url: &str,
        prefer: &str,
        row: &T,
        action: &str,
    ) -> Result<(), ProfileStoreError> {
        let response = self
            .authorized(self.client.post(url))
            .header("Prefer", prefer)
            .json(row)
            .send()
            .await?;
        check_status(response, action).await?;
        Ok(())
    }
}

async fn check_status(response: Response, action: &str) -> Result<Response, ProfileStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ProfileStoreError::Unauthorized);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read body".to_string());
    tracing::error!("Failed to {}: {} - {}", action, status, body);
    Err(ProfileStoreError::ApiError(format!("Failed to {}: {}", action, status)))
}

async fn read_rows(response: Response) -> Result<Vec<ProfileRow>, ProfileStoreError> {
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| ProfileStoreError::InvalidResponse(format!("Failed to parse profiles: {}", e)))
}
