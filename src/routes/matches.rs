use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use validator::Validate;

use crate::core::MatchError;
use crate::models::responses::summary_message;
use crate::models::{
    CacheStats, FindMatchesRequest, FindMatchesResponse, HealthResponse, MatchRequest, RankResponse,
    SearchCriteria,
};
use crate::routes::{
    authenticate, error_response, load_candidate_pool, load_profile, store_error_response,
    AppState,
};
use crate::services::ProfileStoreError;

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/rank", web::post().to(rank_matches))
        .route("/matches/find", web::post().to(find_matches));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_healthy = state.conversations.health_check().await.unwrap_or(false);

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if db_healthy { "up" } else { "down" }.to_string(),
        cache: state.cache.stats(),
        timestamp: Utc::now(),
    })
}

/// Rank caller-supplied candidates
///
/// POST /api/v1/matches/rank
///
/// Request body:
/// ```json
/// {
///   "requester": { "id": "string", "interests": ["string"] },
///   "candidates": [{ "id": "string", "displayName": "string" }],
///   "topic": "string",
///   "mood": "string",
///   "limit": 5
/// }
/// ```
async fn rank_matches(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> impl Responder {
    let request = match MatchRequest::from_json(&body) {
        Ok(request) => request,
        Err(MatchError::InvalidArgument(message)) => {
            tracing::info!("Rejected rank request: {}", message);
            return error_response(StatusCode::BAD_REQUEST, "Invalid argument", message);
        }
    };

    let result = state.matcher.find_matches(&request, Utc::now());

    tracing::info!(
        "Ranked {} candidates for {} (returned: {})",
        result.total_candidates,
        request.requester.id,
        result.matches.len()
    );

    HttpResponse::Ok().json(RankResponse {
        matches: result.matches,
        total_candidates: result.total_candidates,
        fallback_mode: result.fallback_mode,
        seeded: result.seeded,
    })
}

/// Find matches for the authenticated user
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "topic": "string",
///   "mood": "string",
///   "conversationType": "string",
///   "limit": 5
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    let user_id = match authenticate(&state, &http_req) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: {}", errors);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let requester = match load_profile(&state, &user_id).await {
        Ok(profile) => profile,
        Err(ProfileStoreError::NotFound(_)) => {
            return error_response(
                StatusCode::NOT_FOUND,
                "User profile not found",
                "Complete your profile before searching for matches",
            );
        }
        Err(e) => return store_error_response("Failed to fetch user profile", e),
    };

    let candidates = match load_candidate_pool(&state, &user_id).await {
        Ok(candidates) => candidates,
        Err(e) => return store_error_response("Failed to query candidates", e),
    };

    let topic = non_empty(&req.topic);
    let mood = non_empty(&req.mood);

    let limit = req.effective_limit(state.limits.default_limit, state.limits.max_limit);
    let mut request = MatchRequest::new(requester, candidates).with_limit(limit);
    if let Some(topic) = &topic {
        request = request.with_topic(topic.as_str());
    }
    if let Some(mood) = &mood {
        request = request.with_mood(mood.as_str());
    }

    let result = state.matcher.find_matches(&request, Utc::now());
    let found = result.matches.len();

    tracing::info!(
        "Returning {} matches for user {} (from {} candidates, fallback: {})",
        found,
        user_id,
        result.total_candidates,
        result.fallback_mode
    );

    HttpResponse::Ok().json(FindMatchesResponse {
        message: summary_message(found, result.fallback_mode, topic.as_deref()),
        matches: result.matches,
        total_found: found,
        fallback_mode: result.fallback_mode,
        search_criteria: SearchCriteria {
            topic,
            mood,
            conversation_type: non_empty(&req.conversation_type),
        },
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
