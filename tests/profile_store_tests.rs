// Profile store client tests against a mocked PostgREST endpoint

use mockito::Matcher;
use serde_json::json;
use chrono::NaiveDate;
use synaps_match::models::{DailySession, InsightKind, InsightRecord, ProfileUpdate};
use synaps_match::services::{ProfileStoreClient, ProfileStoreError};

fn create_client(server: &mockito::ServerGuard) -> ProfileStoreClient {
    ProfileStoreClient::new(server.url(), "test-key".to_string(), "profiles".to_string(), 5).unwrap()
}

#[tokio::test]
async fn test_get_profile_sends_keys_and_maps_row() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("user_id".into(), "eq.user-1".into()),
            Matcher::UrlEncoded("limit".into(), "1".into()),
        ]))
        .match_header("apikey", "test-key")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "id": "7f7c",
                "user_id": "user-1",
                "display_name": "Zofia",
                "interests": ["Poetry", " poetry ", "<b>Books</b>"],
                "mood": "Inspired",
                "current_intentions": "Discuss poetry",
                "connection_goals": null,
                "updated_at": "2024-06-01T09:30:00.123456+00:00"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let profile = create_client(&server).get_profile("user-1").await.unwrap();

    assert_eq!(profile.id, "user-1");
    assert_eq!(profile.display_name, "Zofia");
    assert_eq!(profile.interests, vec!["Poetry", "bBooks/b"]);
    assert_eq!(profile.connection_goals, "");
    assert!(profile.updated_at.is_some());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_profile_not_found() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let result = create_client(&server).get_profile("missing").await;
    assert!(matches!(result, Err(ProfileStoreError::NotFound(_))));
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let mut server = mockito::Server::new_async().await;
    let client = create_client(&server);

    let unauthorized = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"message":"Invalid API key"}"#)
        .create_async()
        .await;
    assert!(matches!(
        client.get_profile("user-1").await,
        Err(ProfileStoreError::Unauthorized)
    ));
    unauthorized.remove_async().await;

    let failing = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;
    assert!(matches!(
        client.get_profile("user-1").await,
        Err(ProfileStoreError::ApiError(_))
    ));
    failing.remove_async().await;

    let _garbage = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;
    assert!(matches!(
        client.get_profile("user-1").await,
        Err(ProfileStoreError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_list_candidates_orders_and_excludes_requester() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("user_id".into(), "neq.me".into()),
            Matcher::UrlEncoded("display_name".into(), "not.is.null".into()),
            Matcher::UrlEncoded("order".into(), "updated_at.desc".into()),
            Matcher::UrlEncoded("limit".into(), "50".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                { "user_id": "a", "display_name": "Ala", "interests": "Jazz" },
                { "user_id": "me", "display_name": "Me" },
                { "user_id": null, "display_name": "Broken" },
                { "user_id": "b", "display_name": "Bartek", "interests": [1, "Chess"] }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let candidates = create_client(&server).list_candidates("me", 50).await.unwrap();

    let ids: Vec<&str> = candidates.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(candidates[0].interests, vec!["Jazz"]);
    assert_eq!(candidates[1].interests, vec!["Chess"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_update_profile_patches_only_given_fields() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PATCH", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("user_id".into(), "eq.user-1".into()))
        .match_header("prefer", "return=representation")
        .match_body(Matcher::PartialJson(json!({
            "interests": ["Ceramics"],
            "current_intentions": "Open a studio"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "user_id": "user-1",
                "display_name": "Zofia",
                "interests": ["Ceramics"],
                "current_intentions": "Open a studio"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let update = ProfileUpdate {
        interests: Some(vec!["Ceramics".to_string()]),
        current_intentions: Some("Open a studio".to_string()),
        ..Default::default()
    };
    let profile = create_client(&server)
        .update_profile("user-1", &update)
        .await
        .unwrap();

    assert_eq!(profile.interests, vec!["Ceramics"]);
    assert_eq!(profile.current_intentions, "Open a studio");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_record_insight_posts_row() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/ai_insights")
        .match_header("apikey", "test-key")
        .match_header("prefer", "return=minimal")
        .match_body(Matcher::Json(json!({
            "user_id": "user-1",
            "insight_type": "connection_intentions",
            "content": "Let's find you a pottery buddy",
            "metadata": { "personality_traits": ["curious"] }
        })))
        .with_status(201)
        .create_async()
        .await;

    let record = InsightRecord {
        user_id: "user-1".to_string(),
        insight_type: InsightKind::ConnectionIntentions,
        content: "Let's find you a pottery buddy".to_string(),
        metadata: json!({ "personality_traits": ["curious"] }),
    };
    create_client(&server).record_insight(&record).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_upsert_session_merges_on_day() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/user_sessions")
        .match_query(Matcher::UrlEncoded("on_conflict".into(), "user_id,session_date".into()))
        .match_header("prefer", "resolution=merge-duplicates,return=minimal")
        .match_body(Matcher::Json(json!({
            "user_id": "user-1",
            "session_date": "2024-06-01",
            "daily_goals": "Open a studio",
            "desired_conversation_type": null,
            "topics_of_interest": ["ceramics"],
            "energy_level": 5
        })))
        .with_status(201)
        .create_async()
        .await;

    let session = DailySession {
        user_id: "user-1".to_string(),
        session_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        daily_goals: Some("Open a studio".to_string()),
        desired_conversation_type: None,
        topics_of_interest: vec!["ceramics".to_string()],
        energy_level: 5,
    };
    create_client(&server).upsert_session(&session).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_upsert_session_reports_store_errors() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/rest/v1/user_sessions")
        .match_query(Matcher::Any)
        .with_status(409)
        .with_body(r#"{"message":"conflict"}"#)
        .create_async()
        .await;

    let session = DailySession {
        user_id: "user-1".to_string(),
        session_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        daily_goals: None,
        desired_conversation_type: None,
        topics_of_interest: vec![],
        energy_level: 5,
    };
    let result = create_client(&server).upsert_session(&session).await;

    assert!(matches!(result, Err(ProfileStoreError::ApiError(_))));
}
