use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use feed_cell::models::{FeedError, NewCommentRequest, NewPostRequest};
use feed_cell::services::feed::FeedService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

const TOKEN: &str = "test-token";

fn service_for(server: &MockServer) -> FeedService {
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    FeedService::new(&config)
}

#[tokio::test]
async fn empty_post_body_rejects_before_any_remote_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/activities"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let user = TestUser::owner("owner@example.com").to_user();

    let request = NewPostRequest {
        body: "  ".to_string(),
        pet_id: None,
        media_key: None,
    };

    assert_matches!(
        service.create_post(&user, request, TOKEN).await,
        Err(FeedError::ValidationError(_))
    );
}

#[tokio::test]
async fn first_like_inserts_a_tagged_row() {
    let server = MockServer::start().await;
    let activity_id = Uuid::new_v4();
    let user = TestUser::owner("owner@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/activities"))
        .and(query_param("id", format!("eq.{}", activity_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": activity_id }])))
        .mount(&server)
        .await;

    // No existing like row for this (activity, user) pair
    Mock::given(method("GET"))
        .and(path("/rest/v1/activity_likes"))
        .and(query_param("activity_id", format!("eq.{}", activity_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/activity_likes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let toggle = service.toggle_like(activity_id, &user.to_user(), TOKEN).await.unwrap();

    assert!(toggle.liked);
    assert_eq!(toggle.activity_id, activity_id);

    // The insert body carries the correlation tag the response reports
    let requests = server.received_requests().await.unwrap();
    let insert = requests.iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path() == "/rest/v1/activity_likes")
        .expect("like insert recorded");
    let body: serde_json::Value = serde_json::from_slice(&insert.body).unwrap();
    assert_eq!(
        body["client_tag"].as_str(),
        Some(toggle.correlation_id.to_string().as_str())
    );
}

#[tokio::test]
async fn second_like_removes_the_existing_row() {
    let server = MockServer::start().await;
    let activity_id = Uuid::new_v4();
    let user = TestUser::owner("owner@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/activities"))
        .and(query_param("id", format!("eq.{}", activity_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": activity_id }])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/activity_likes"))
        .and(query_param("activity_id", format!("eq.{}", activity_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": Uuid::new_v4(), "activity_id": activity_id, "user_id": user.id }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/activity_likes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/activity_likes"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let toggle = service.toggle_like(activity_id, &user.to_user(), TOKEN).await.unwrap();

    assert!(!toggle.liked);
}

#[tokio::test]
async fn commenting_on_a_missing_activity_maps_to_not_found() {
    let server = MockServer::start().await;
    let activity_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/activities"))
        .and(query_param("id", format!("eq.{}", activity_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/activity_comments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let user = TestUser::owner("owner@example.com").to_user();

    assert_matches!(
        service.add_comment(
            activity_id,
            &user,
            NewCommentRequest { body: "so cute".to_string() },
            TOKEN,
        ).await,
        Err(FeedError::NotFound)
    );
}

#[tokio::test]
async fn feed_page_is_fetched_newest_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/activities"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "20"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::activity_row(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                "fresh post",
            )
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let page = service.list_feed(
        feed_cell::models::FeedPageQuery { limit: None, offset: None },
        TOKEN,
    ).await.unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page[0].body, "fresh post");
}
