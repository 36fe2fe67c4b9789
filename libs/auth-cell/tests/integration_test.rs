use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{body_string_contains, method, path, query_param};

use auth_cell::router::{auth_routes, user_routes};
use auth_cell::services::PasswordService;
use shared_config::AppConfig;
use shared_models::auth::Role;
use shared_utils::test_utils::{TestConfig, TestUser, JwtTestUtils, MockSupabaseResponses};

fn create_test_config(mock_server: &MockServer) -> AppConfig {
    TestConfig::with_mock_server(&mock_server.uri()).to_app_config()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value, auth: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn auth_app(config: AppConfig) -> Router {
    auth_routes(Arc::new(config))
}

fn user_app(config: AppConfig) -> Router {
    user_routes(Arc::new(config))
}

#[tokio::test]
async fn test_register_creates_user_and_returns_token() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.arta@example.al"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_string_contains("\"email\":\"arta@example.al\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::user_row(user_id, "arta@example.al", Role::Professional, None)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = json_request("POST", "/register", json!({
        "name": "  Arta  ",
        "email": "Arta@Example.al",
        "password": "secret1",
        "phone": "+355691234567",
        "role": "professional"
    }), None);

    let response = auth_app(config.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert_eq!(body["user"]["id"], json!(user_id));
    assert_eq!(body["user"]["role"], "professional");
    assert_eq!(body["user"]["phone_verified"], false);
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap();
    let validated = shared_utils::jwt::validate_token(token, &config.jwt_secret).unwrap();
    assert_eq!(validated.id, user_id);
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(Uuid::new_v4(), "taken@example.com", Role::User, None)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let request = json_request("POST", "/register", json!({
        "name": "Taken",
        "email": "taken@example.com",
        "password": "secret1"
    }), None);

    let response = auth_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "User already exists");
}

#[tokio::test]
async fn test_register_validation_failures() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);

    let cases = vec![
        json!({ "name": "", "email": "a@b.co", "password": "secret1" }),
        json!({ "name": "A", "email": "not-an-email", "password": "secret1" }),
        json!({ "name": "A", "email": "a@b.co", "password": "short" }),
        json!({ "name": "A", "email": "a@b.co", "password": "secret1", "phone": "12" }),
        json!({ "name": "A", "email": "a@b.co", "password": "secret1", "role": "admin" }),
    ];

    for body in cases {
        let response = auth_app(config.clone())
            .oneshot(json_request("POST", "/register", body.clone(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "case {}", body);
    }
}

#[tokio::test]
async fn test_login_checks_password() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let user_id = Uuid::new_v4();
    let hash = PasswordService::hash_password("secret1").unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.login@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(user_id, "login@example.com", Role::User, Some(&hash))
        ])))
        .mount(&mock_server)
        .await;

    let ok = auth_app(config.clone())
        .oneshot(json_request("POST", "/login", json!({ "email": "LOGIN@example.com", "password": "secret1" }), None))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert_eq!(read_json(ok).await["user"]["id"], json!(user_id));

    let wrong = auth_app(config)
        .oneshot(json_request("POST", "/login", json!({ "email": "login@example.com", "password": "nope123" }), None))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(wrong).await["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_unknown_email() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = auth_app(config)
        .oneshot(json_request("POST", "/login", json!({ "email": "ghost@example.com", "password": "secret1" }), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_phone_requires_token() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);

    let response = auth_app(config)
        .oneshot(json_request("POST", "/verify-phone", json!({ "phone": "+355691234567" }), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["error"], "No token, authorization denied");
}

#[tokio::test]
async fn test_verify_phone_sends_sms() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let user = TestUser::customer("phone@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(user.id, &user.email, Role::User, None)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(body_string_contains("phone_verification_code"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/ACtest/Messages.json"))
        .and(body_string_contains("Your+Dora+verification+code"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "sid": "SM123" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = JwtTestUtils::bearer(&user, &config.jwt_secret);
    let response = auth_app(config)
        .oneshot(json_request("POST", "/verify-phone", json!({ "phone": "+355691234567" }), Some(auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["msg"], "Verification code sent");
}

#[tokio::test]
async fn test_verify_phone_reports_sms_failure() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let user = TestUser::customer("phone@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(user.id, &user.email, Role::User, None)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/ACtest/Messages.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "code": 21211 })))
        .mount(&mock_server)
        .await;

    let auth = JwtTestUtils::bearer(&user, &config.jwt_secret);
    let response = auth_app(config)
        .oneshot(json_request("POST", "/verify-phone", json!({ "phone": "+355691234567" }), Some(auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(read_json(response).await["error"], "Failed to send SMS");
}

#[tokio::test]
async fn test_verify_phone_rejects_bad_number() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let user = TestUser::customer("phone@example.com");
    let auth = JwtTestUtils::bearer(&user, &config.jwt_secret);

    let response = auth_app(config)
        .oneshot(json_request("POST", "/verify-phone", json!({}), Some(auth)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "Valid phone number required");
}

#[tokio::test]
async fn test_verify_code_accepts_matching_code() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let user = TestUser::customer("code@example.com");
    let digest = auth_cell::services::phone::code_digest(&config.jwt_secret, user.id, "482913");

    let mut row = MockSupabaseResponses::user_row(user.id, &user.email, Role::User, None);
    row["phone_verification_code"] = json!(digest);

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row.clone()])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(query_param("phone_verification_code", format!("eq.{}", digest)))
        .and(body_string_contains("\"phone_verified\":true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = JwtTestUtils::bearer(&user, &config.jwt_secret);
    let good = auth_app(config.clone())
        .oneshot(json_request("POST", "/verify-code", json!({ "code": "482913" }), Some(auth.clone())))
        .await
        .unwrap();
    assert_eq!(good.status(), StatusCode::OK);

    let bad = auth_app(config)
        .oneshot(json_request("POST", "/verify-code", json!({ "code": "000000" }), Some(auth)))
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(bad).await["error"], "Invalid verification code");
}

#[tokio::test]
async fn test_get_me_hides_credentials() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let user = TestUser::customer("me@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(user.id, &user.email, Role::User, None)
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/me")
        .header("authorization", JwtTestUtils::bearer(&user, &config.jwt_secret))
        .body(Body::empty())
        .unwrap();

    let response = user_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["email"], "me@example.com");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("phone_verification_code").is_none());
}

#[tokio::test]
async fn test_update_location() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let user = TestUser::customer("geo@example.com");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row(user.id, &user.email, Role::User, None)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = JwtTestUtils::bearer(&user, &config.jwt_secret);

    let response = user_app(config.clone())
        .oneshot(json_request("PATCH", "/location", json!({ "lat": 41.33, "lng": 19.82 }), Some(auth.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["msg"], "Location updated");
    assert_eq!(body["location"]["lat"], 41.33);

    let missing = user_app(config.clone())
        .oneshot(json_request("PATCH", "/location", json!({ "lat": 41.33 }), Some(auth.clone())))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let out_of_range = user_app(config)
        .oneshot(json_request("PATCH", "/location", json!({ "lat": 141.0, "lng": 19.8 }), Some(auth)))
        .await
        .unwrap();
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server);
    let user = TestUser::customer("old@example.com");
    let token = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

    let request = Request::builder()
        .method("GET")
        .uri("/me")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = user_app(config).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
