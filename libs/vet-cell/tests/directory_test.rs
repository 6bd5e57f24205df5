use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};
use vet_cell::models::{VetError, VetSearchQuery};
use vet_cell::services::directory::VetDirectoryService;

const TOKEN: &str = "test-token";

fn service_for(server: &MockServer) -> VetDirectoryService {
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    VetDirectoryService::new(&config)
}

#[tokio::test]
async fn listing_filters_to_verified_available_vets() {
    let server = MockServer::start().await;
    let vet_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/veterinarian"))
        .and(query_param("is_verified", "eq.true"))
        .and(query_param("is_available", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::vet_row(
                &vet_id.to_string(),
                "vet@example.com",
                "Dr. Paws",
                "Dermatology",
            )
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let vets = service.list_vets(
        VetSearchQuery { specialty: None, available_only: None, limit: None, offset: None },
        TOKEN,
    ).await.unwrap();

    assert_eq!(vets.len(), 1);
    assert_eq!(vets[0].id, vet_id);
    assert_eq!(vets[0].full_name, "Dr. Paws");
}

#[tokio::test]
async fn specialty_search_uses_a_case_insensitive_pattern() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/veterinarian"))
        .and(query_param("specialty", "ilike.*derma*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let vets = service.list_vets(
        VetSearchQuery {
            specialty: Some("derma".to_string()),
            available_only: None,
            limit: None,
            offset: None,
        },
        TOKEN,
    ).await.unwrap();

    assert!(vets.is_empty());
}

#[tokio::test]
async fn unknown_vet_maps_to_not_found() {
    let server = MockServer::start().await;
    let vet_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/veterinarian"))
        .and(query_param("id", format!("eq.{}", vet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert_matches!(service.get_vet(vet_id, TOKEN).await, Err(VetError::NotFound));
}
