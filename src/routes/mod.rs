// Route exports
pub mod connections;
pub mod errors;
pub mod matches;
pub mod profile;

use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::core::Matcher;
use crate::models::{ErrorResponse, Profile};
use crate::services::{
    CacheKey, CacheManager, ConversationStore, ProfileStoreClient, ProfileStoreError,
    TokenVerifier,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ProfileStoreClient>,
    pub cache: Arc<CacheManager>,
    pub conversations: Arc<ConversationStore>,
    pub auth: Arc<TokenVerifier>,
    pub matcher: Matcher,
    pub limits: MatchLimits,
}

/// Result-size bounds for authenticated searches
#[derive(Debug, Clone, Copy)]
pub struct MatchLimits {
    pub default_limit: usize,
    pub max_limit: usize,
    /// Upper bound on candidates fetched from the store per search
    pub candidate_fetch_limit: usize,
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 20,
            candidate_fetch_limit: 200,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure)
            .configure(profile::configure)
            .configure(connections::configure),
    );
}

pub(crate) fn error_response(
    status: StatusCode,
    error: &str,
    message: impl ToString,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}

/// Resolve the calling user from the bearer token, or a 401 response
pub(crate) fn authenticate(state: &AppState, req: &HttpRequest) -> Result<String, HttpResponse> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    state.auth.authenticate(header).map_err(|e| {
        tracing::warn!("Rejected request to {}: {}", req.path(), e);
        error_response(StatusCode::UNAUTHORIZED, "Unauthorized", e)
    })
}

/// Map a profile store failure onto an HTTP response
pub(crate) fn store_error_response(context: &str, e: ProfileStoreError) -> HttpResponse {
    match e {
        ProfileStoreError::NotFound(message) => {
            error_response(StatusCode::NOT_FOUND, context, message)
        }
        other => {
            tracing::error!("{}: {}", context, other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, context, other)
        }
    }
}

/// Profile lookup through the cache
pub(crate) async fn load_profile(
    state: &AppState,
    user_id: &str,
) -> Result<Profile, ProfileStoreError> {
    let key = CacheKey::profile(user_id);
    if let Ok(profile) = state.cache.get::<Profile>(&key).await {
        return Ok(profile);
    }

    let profile = state.store.get_profile(user_id).await?;
    if let Err(e) = state.cache.set(&key, &profile).await {
        tracing::warn!("Failed to cache profile {}: {}", user_id, e);
    }
    Ok(profile)
}

/// Candidate pool for a user through the cache
pub(crate) async fn load_candidate_pool(
    state: &AppState,
    user_id: &str,
) -> Result<Vec<Profile>, ProfileStoreError> {
    let key = CacheKey::pool(user_id);
    if let Ok(pool) = state.cache.get::<Vec<Profile>>(&key).await {
        return Ok(pool);
    }

    let pool = state
        .store
        .list_candidates(user_id, state.limits.candidate_fetch_limit)
        .await?;
    if let Err(e) = state.cache.set(&key, &pool).await {
        tracing::warn!("Failed to cache candidate pool for {}: {}", user_id, e);
    }
    Ok(pool)
}

/// Drop cached data made stale by a profile change
pub(crate) async fn invalidate_profile(state: &AppState, user_id: &str) {
    if let Err(e) = state.cache.delete(&CacheKey::profile(user_id)).await {
        tracing::warn!("Failed to invalidate profile cache for {}: {}", user_id, e);
    }
    // Every other user's pool may contain this profile
    if let Err(e) = state.cache.invalidate_pattern(CacheKey::POOL_PATTERN).await {
        tracing::warn!("Failed to invalidate candidate pools: {}", e);
    }
}
