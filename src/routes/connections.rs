use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use crate::core::introduction_message;
use crate::models::domain::clean_text;
use crate::models::{CreateConnectionRequest, CreateConnectionResponse, TargetUser};
use crate::routes::{authenticate, error_response, load_profile, AppState};
use crate::services::{PostgresError, ProfileStoreError};

/// Longest introduction message stored with a new conversation
const MAX_INTRO_CHARS: usize = 2000;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/connections", web::post().to(create_connection));
}

/// Open a conversation with a suggested match
///
/// POST /api/v1/connections
///
/// Request body:
/// ```json
/// {
///   "targetUserId": "string",
///   "introMessage": "string",
///   "reasoning": "string"
/// }
/// ```
async fn create_connection(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    req: web::Json<CreateConnectionRequest>,
) -> impl Responder {
    let user_id = match authenticate(&state, &http_req) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };

    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let target_id = req.target_user_id.trim();
    if target_id == user_id {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid target",
            "Cannot create a connection with yourself",
        );
    }

    let target = match load_profile(&state, target_id).await {
        Ok(profile) => profile,
        Err(ProfileStoreError::NotFound(_)) => {
            return error_response(
                StatusCode::NOT_FOUND,
                "Target user not found",
                format!("No profile for user {}", target_id),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch target profile {}: {}", target_id, e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch target profile",
                e,
            );
        }
    };

    let intro = req
        .intro_message
        .as_deref()
        .map(|message| clean_text(message, MAX_INTRO_CHARS))
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            introduction_message(target.name_or_anonymous(), req.reasoning.as_deref())
        });

    match state
        .conversations
        .open_conversation(&user_id, &target.id, &intro)
        .await
    {
        Ok(opened) => {
            tracing::info!(
                "Connection {} -> {} (conversation {}, new: {})",
                user_id,
                target.id,
                opened.id,
                opened.is_new
            );
            HttpResponse::Ok().json(CreateConnectionResponse {
                success: true,
                conversation_id: opened.id.to_string(),
                target_user: TargetUser {
                    user_id: target.id.clone(),
                    display_name: target.name_or_anonymous().to_string(),
                },
                is_new_conversation: opened.is_new,
            })
        }
        Err(PostgresError::InvalidInput(message)) => {
            error_response(StatusCode::BAD_REQUEST, "Invalid target", message)
        }
        Err(e) => {
            tracing::error!("Failed to open conversation for {}: {}", user_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create conversation",
                e,
            )
        }
    }
}
