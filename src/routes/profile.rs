use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    InsightRecord, InsightsRequest, MemoryImportRequest, MemoryImportResponse, Profile,
    ProfileResponse, ProfileUpdate, UpdateProfileRequest,
};
use crate::routes::{
    authenticate, error_response, invalidate_profile, load_profile, store_error_response,
    AppState,
};
use crate::services::{memory_record, parse_insights, parse_memory, ProfileStoreError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/profile", web::get().to(get_profile))
        .route("/profile", web::patch().to(update_profile))
        .route("/profile/insights", web::post().to(apply_insights))
        .route("/profile/memory", web::post().to(import_memory));
}

/// GET /api/v1/profile
async fn get_profile(state: web::Data<AppState>, http_req: HttpRequest) -> impl Responder {
    let user_id = match authenticate(&state, &http_req) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    match load_profile(&state, &user_id).await {
        Ok(profile) => HttpResponse::Ok().json(ProfileResponse {
            success: true,
            profile,
        }),
        Err(e) => store_error_response("Failed to fetch profile", e),
    }
}

/// PATCH /api/v1/profile
///
/// Request body (every field optional):
/// ```json
/// {
///   "interests": ["string"],
///   "mood": "string",
///   "currentIntentions": "string",
///   "connectionGoals": "string",
///   "lastConversationTopics": ["string"]
/// }
/// ```
async fn update_profile(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    req: web::Json<UpdateProfileRequest>,
) -> impl Responder {
    let user_id = match authenticate(&state, &http_req) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let update = ProfileUpdate::from(req.into_inner());
    if update.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "No valid fields to update",
            "Provide at least one of interests, mood, currentIntentions, connectionGoals or lastConversationTopics",
        );
    }

    persist_update(&state, &user_id, &update).await
}

/// POST /api/v1/profile/insights
///
/// Accepts the raw completion of the insight-extraction prompt, writes the
/// implied profile fields, then stores the insight record and today's
/// session. The record and session are best-effort: a failure there is
/// logged and does not fail the request.
async fn apply_insights(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    req: web::Json<InsightsRequest>,
) -> impl Responder {
    let user_id = match authenticate(&state, &http_req) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let insights = match parse_insights(&req.completion) {
        Ok(insights) => insights,
        Err(e) => {
            tracing::warn!("Unusable insight completion for {}: {}", user_id, e);
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "Invalid insights", e);
        }
    };

    let update = insights.to_update();
    if update.is_empty() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid insights",
            "Insights contained no profile fields",
        );
    }

    let profile = match write_profile(&state, &user_id, &update).await {
        Ok(profile) => profile,
        Err(e) => return store_error_response("Failed to update profile", e),
    };

    let content = req.reply.as_deref().unwrap_or(req.completion.as_str());
    record_insight(&state, insights.record(&user_id, content)).await;

    let session = insights.daily_session(&user_id, chrono::Utc::now().date_naive());
    if let Err(e) = state.store.upsert_session(&session).await {
        tracing::warn!("Failed to update session for {}: {}", user_id, e);
    }

    HttpResponse::Ok().json(ProfileResponse {
        success: true,
        profile,
    })
}

/// POST /api/v1/profile/memory
///
/// Imports interests and habits from an exported assistant memory summary.
/// Text that is not JSON imports the defaults instead of failing.
async fn import_memory(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    req: web::Json<MemoryImportRequest>,
) -> impl Responder {
    let user_id = match authenticate(&state, &http_req) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let memory = parse_memory(&req.memory);

    let profile = match write_profile(&state, &user_id, &memory.to_update()).await {
        Ok(profile) => profile,
        Err(e) => return store_error_response("Failed to import memory", e),
    };

    record_insight(&state, memory_record(&user_id, &memory)).await;

    HttpResponse::Ok().json(MemoryImportResponse {
        success: true,
        imported_data: memory,
        profile,
    })
}

async fn persist_update(state: &AppState, user_id: &str, update: &ProfileUpdate) -> HttpResponse {
    match write_profile(state, user_id, update).await {
        Ok(profile) => HttpResponse::Ok().json(ProfileResponse {
            success: true,
            profile,
        }),
        Err(e) => store_error_response("Failed to update profile", e),
    }
}

async fn write_profile(
    state: &AppState,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<Profile, ProfileStoreError> {
    let profile = state.store.update_profile(user_id, update).await?;
    invalidate_profile(state, user_id).await;
    tracing::info!("Updated profile for user {}", user_id);
    Ok(profile)
}

async fn record_insight(state: &AppState, record: InsightRecord) {
    if let Err(e) = state.store.record_insight(&record).await {
        tracing::warn!("Failed to store insight for {}: {}", record.user_id, e);
    }
}
