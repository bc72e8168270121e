//! Integration tests for the PostgREST-backed store
//!
//! A wiremock server stands in for the Supabase REST endpoint.

use secrecy::SecretString;
use serde_json::json;
use wardrobe_core::{
    storage::SupabaseStore, Category, DetectionSession, DetectionStatus, IntakeSource, ItemId,
    WardrobeError, WardrobeItem, WardrobeStore,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ITEMS: &str = "/rest/v1/wardrobe_items";
const SESSIONS: &str = "/rest/v1/multi_item_detection_sessions";

fn store(server: &MockServer) -> SupabaseStore {
    SupabaseStore::new(
        &server.uri(),
        SecretString::from("service-key".to_string()),
        "wardrobe_items",
        "multi_item_detection_sessions",
    )
    .unwrap()
}

#[tokio::test]
async fn test_save_item_upserts_with_representation() {
    let server = MockServer::start().await;
    let item = WardrobeItem::new("user-1", "Linen shirt", Category::Tops, 0.8, 0.7, IntakeSource::Manual);

    Mock::given(method("POST"))
        .and(path(ITEMS))
        .and(query_param("on_conflict", "id"))
        .and(header("apikey", "service-key"))
        .and(header("Authorization", "Bearer service-key"))
        .and(header("Prefer", "return=representation,resolution=merge-duplicates"))
        .and(body_partial_json(json!({"name": "Linen shirt", "category": "tops"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([item])))
        .expect(1)
        .mount(&server)
        .await;

    let saved = store(&server).save_item(&item).await.unwrap();
    assert_eq!(saved.id, item.id);
}

#[tokio::test]
async fn test_get_missing_item_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ITEMS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = store(&server).get_item(ItemId::new()).await.unwrap_err();
    assert!(matches!(err, WardrobeError::NotFound(_)));
}

#[tokio::test]
async fn test_list_items_filters_by_user() {
    let server = MockServer::start().await;
    let item = WardrobeItem::new("user-1", "Denim jacket", Category::Outerwear, 0.9, 0.7, IntakeSource::SingleItem);

    Mock::given(method("GET"))
        .and(path(ITEMS))
        .and(query_param("user_id", "eq.user-1"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([item])))
        .expect(1)
        .mount(&server)
        .await;

    let items = store(&server).list_items("user-1", 10_000).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Denim jacket");
}

#[tokio::test]
async fn test_begin_detection_reports_existing_session() {
    let server = MockServer::start().await;
    let existing = DetectionSession::start("user-1", "abc123");

    Mock::given(method("GET"))
        .and(path(SESSIONS))
        .and(query_param("image_hash", "eq.abc123"))
        .and(query_param("status", "in.(processing,completed)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([existing])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let start = store(&server).begin_detection("user-1", "abc123").await.unwrap();
    assert!(start.is_duplicate());
    assert_eq!(start.session().id, existing.id);
}

#[tokio::test]
async fn test_begin_detection_creates_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SESSIONS))
        .and(body_partial_json(json!({"status": "processing", "image_hash": "fresh"})))
        .respond_with(|request: &wiremock::Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            ResponseTemplate::new(201).set_body_json(json!([body]))
        })
        .expect(1)
        .mount(&server)
        .await;

    let start = store(&server).begin_detection("user-1", "fresh").await.unwrap();
    assert!(!start.is_duplicate());
    assert_eq!(start.session().status, DetectionStatus::Processing);
}

#[tokio::test]
async fn test_begin_detection_conflict_is_duplicate() {
    let server = MockServer::start().await;
    let winner = DetectionSession::start("user-1", "raced");

    // First lookup sees nothing, the insert loses the race, the refetch finds the winner
    Mock::given(method("GET"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([winner])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;

    let start = store(&server).begin_detection("user-1", "raced").await.unwrap();
    assert!(start.is_duplicate());
    assert_eq!(start.session().id, winner.id);
}

#[tokio::test]
async fn test_complete_detection_patches_processing_row() {
    let server = MockServer::start().await;
    let session = DetectionSession::start("user-1", "h");
    let mut completed = session.clone();
    completed.complete(2, Some(0.8)).unwrap();

    Mock::given(method("GET"))
        .and(path(SESSIONS))
        .and(query_param("id", format!("eq.{}", session.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([session])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(SESSIONS))
        .and(query_param("status", "eq.processing"))
        .and(body_partial_json(json!({"status": "completed", "item_count": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([completed])))
        .expect(1)
        .mount(&server)
        .await;

    let done = store(&server)
        .complete_detection(session.id, 2, Some(0.8))
        .await
        .unwrap();
    assert_eq!(done.status, DetectionStatus::Completed);
    assert_eq!(done.item_count, 2);
}

#[tokio::test]
async fn test_lost_patch_race_is_invalid_operation() {
    let server = MockServer::start().await;
    let session = DetectionSession::start("user-1", "h");

    Mock::given(method("GET"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([session])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = store(&server)
        .fail_detection(session.id, "model down")
        .await
        .unwrap_err();
    assert!(matches!(err, WardrobeError::InvalidOperation(_)));
}

#[tokio::test]
async fn test_postgrest_errors_become_database_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ITEMS))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "42703",
            "message": "column wardrobe_items.colour does not exist",
            "details": null,
            "hint": "Perhaps you meant to reference the column \"wardrobe_items.colors\"."
        })))
        .mount(&server)
        .await;

    let err = store(&server).list_items("user-1", 10).await.unwrap_err();
    match err {
        WardrobeError::Database(message) => {
            assert!(message.contains("42703"));
            assert!(message.contains("wardrobe_items.colors"));
        }
        other => panic!("expected database error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_begin_detection_replaces_failed_session() {
    let server = MockServer::start().await;
    let mut failed = DetectionSession::start("user-1", "retry-me");
    failed.fail("model down").unwrap();

    // No live session; the insert trips over the failed row until it is cleared
    Mock::given(method("GET"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint",
            "details": null,
            "hint": null
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SESSIONS))
        .respond_with(|request: &wiremock::Request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            ResponseTemplate::new(201).set_body_json(json!([body]))
        })
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(SESSIONS))
        .and(query_param("user_id", "eq.user-1"))
        .and(query_param("image_hash", "eq.retry-me"))
        .and(query_param("status", "eq.failed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([failed])))
        .expect(1)
        .mount(&server)
        .await;

    let start = store(&server).begin_detection("user-1", "retry-me").await.unwrap();
    assert!(!start.is_duplicate());
    assert_eq!(start.session().status, DetectionStatus::Processing);
    assert_ne!(start.session().id, failed.id);
}

#[tokio::test]
async fn test_unexplained_conflict_is_database_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"code": "23505"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(SESSIONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = store(&server).begin_detection("user-1", "stuck").await.unwrap_err();
    assert!(matches!(err, WardrobeError::Database(_)));
}
