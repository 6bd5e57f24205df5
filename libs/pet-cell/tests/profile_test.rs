use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use pet_cell::models::{CreatePetRequest, PetError, UpdatePetRequest};
use pet_cell::services::profile::PetProfileService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

const TOKEN: &str = "test-token";

fn service_for(server: &MockServer) -> PetProfileService {
    let config = TestConfig::with_mock_server(&server.uri()).to_app_config();
    PetProfileService::new(&config)
}

#[tokio::test]
async fn blank_name_rejects_before_any_remote_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/pets"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let user = TestUser::owner("owner@example.com").to_user();

    let request = CreatePetRequest {
        name: "   ".to_string(),
        species: "dog".to_string(),
        breed: None,
        birth_date: None,
        bio: None,
    };

    assert_matches!(
        service.create_pet(&user, request, TOKEN).await,
        Err(PetError::ValidationError(_))
    );
}

#[tokio::test]
async fn gallery_keys_resolve_to_public_urls() {
    let server = MockServer::start().await;
    let pet_id = Uuid::new_v4();
    let owner = TestUser::owner("owner@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/pets"))
        .and(query_param("id", format!("eq.{}", pet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::pet_row(&pet_id.to_string(), &owner.id, "Biscuit")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/pet_media"))
        .and(query_param("pet_id", format!("eq.{}", pet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::pet_media_row(&pet_id.to_string(), "biscuit/park.jpg")
        ])))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let pet = service.get_pet_with_gallery(pet_id, TOKEN).await.unwrap();

    assert_eq!(pet.pet.name, "Biscuit");
    assert_eq!(pet.gallery.len(), 1);
    assert_eq!(
        pet.gallery[0].url,
        format!("{}/storage/v1/object/public/pet-photos/biscuit/park.jpg", server.uri())
    );
}

#[tokio::test]
async fn updating_someone_elses_pet_is_rejected() {
    let server = MockServer::start().await;
    let pet_id = Uuid::new_v4();
    let other_owner = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/pets"))
        .and(query_param("id", format!("eq.{}", pet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::pet_row(&pet_id.to_string(), &other_owner.to_string(), "Biscuit")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/pets"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let user = TestUser::owner("owner@example.com").to_user();

    let request = UpdatePetRequest {
        name: Some("Rebranded".to_string()),
        species: None,
        breed: None,
        birth_date: None,
        bio: None,
    };

    assert_matches!(
        service.update_pet(pet_id, &user, request, TOKEN).await,
        Err(PetError::Unauthorized)
    );
}

#[tokio::test]
async fn deleting_a_pet_clears_its_gallery_rows_first() {
    let server = MockServer::start().await;
    let pet_id = Uuid::new_v4();
    let owner = TestUser::owner("owner@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/pets"))
        .and(query_param("id", format!("eq.{}", pet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::pet_row(&pet_id.to_string(), &owner.id, "Biscuit")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/pet_media"))
        .and(query_param("pet_id", format!("eq.{}", pet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/pets"))
        .and(query_param("id", format!("eq.{}", pet_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert!(service.delete_pet(pet_id, &owner.to_user(), TOKEN).await.is_ok());
}
