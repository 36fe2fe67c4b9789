use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use messaging_cell::router::message_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_test_config(mock_server: &MockServer) -> AppConfig {
    TestConfig::with_mock_server(&mock_server.uri()).to_app_config()
}

fn app(config: AppConfig) -> Router {
    message_routes(Arc::new(config))
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn send(body: Value, auth: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("authorization", auth)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, auth: String) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", auth)
        .body(Body::empty())
        .unwrap()
}

async fn mount_recipient(mock_server: &MockServer, recipient_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", recipient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": recipient_id }])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_send_clean_message() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let sender = TestUser::customer("sender@example.com");
    let recipient_id = Uuid::new_v4();

    mount_recipient(&mock_server, recipient_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/messages"))
        .and(body_partial_json(json!({ "flagged": false, "flag_reason": null })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::message_row(Uuid::new_v4(), sender.id, recipient_id, "When can you come?", false)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = app(config.clone())
        .oneshot(send(
            json!({ "recipient_id": recipient_id, "content": "  When can you come?  " }),
            JwtTestUtils::bearer(&sender, &config.jwt_secret),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(read_json(response).await["flagged"], false);
}

#[tokio::test]
async fn test_contact_details_are_flagged() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let sender = TestUser::professional("pro@example.com");
    let recipient_id = Uuid::new_v4();

    mount_recipient(&mock_server, recipient_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/messages"))
        .and(body_partial_json(json!({ "flagged": true, "flag_reason": "phone_number" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::message_row(Uuid::new_v4(), sender.id, recipient_id, "call 0691234567", true)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = app(config.clone())
        .oneshot(send(
            json!({ "recipient_id": recipient_id, "content": "call 0691234567" }),
            JwtTestUtils::bearer(&sender, &config.jwt_secret),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["flagged"], true);
    assert_eq!(body["flag_reason"], "phone_number");
}

#[tokio::test]
async fn test_send_validation() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let sender = TestUser::customer("sender@example.com");
    let auth = JwtTestUtils::bearer(&sender, &config.jwt_secret);

    let empty = app(config.clone())
        .oneshot(send(json!({ "recipient_id": Uuid::new_v4(), "content": "   " }), auth.clone()))
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let too_long = app(config.clone())
        .oneshot(send(json!({ "recipient_id": Uuid::new_v4(), "content": "a".repeat(2001) }), auth.clone()))
        .await
        .unwrap();
    assert_eq!(too_long.status(), StatusCode::BAD_REQUEST);

    let to_self = app(config)
        .oneshot(send(json!({ "recipient_id": sender.id, "content": "hello me" }), auth))
        .await
        .unwrap();
    assert_eq!(to_self.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_recipient() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let sender = TestUser::customer("sender@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = app(config.clone())
        .oneshot(send(
            json!({ "recipient_id": Uuid::new_v4(), "content": "hello" }),
            JwtTestUtils::bearer(&sender, &config.jwt_secret),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["error"], "Recipient not found");
}

#[tokio::test]
async fn test_conversation_marks_received_as_read() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let me = TestUser::customer("me@example.com");
    let other = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/messages"))
        .and(query_param("order", "created_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::message_row(Uuid::new_v4(), me.id, other, "Hello", false),
            MockSupabaseResponses::message_row(Uuid::new_v4(), other, me.id, "Hi there", false),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/messages"))
        .and(query_param("sender_id", format!("eq.{}", other)))
        .and(query_param("recipient_id", format!("eq.{}", me.id)))
        .and(body_partial_json(json!({ "read": true })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = app(config.clone())
        .oneshot(get(&format!("/conversation/{}", other), JwtTestUtils::bearer(&me, &config.jwt_secret)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body[0]["content"], "Hello");
    assert_eq!(body[0]["read"], false);
    assert_eq!(body[1]["read"], true);
}

#[tokio::test]
async fn test_unread_count() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let me = TestUser::customer("me@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/messages"))
        .and(query_param("recipient_id", format!("eq.{}", me.id)))
        .and(query_param("read", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": Uuid::new_v4() }, { "id": Uuid::new_v4() }, { "id": Uuid::new_v4() }
        ])))
        .mount(&mock_server)
        .await;

    let response = app(config.clone())
        .oneshot(get("/unread-count", JwtTestUtils::bearer(&me, &config.jwt_secret)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["count"], 3);
}
