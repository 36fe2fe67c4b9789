use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub twilio_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            twilio_base_url: "http://localhost:54322".to_string(),
        }
    }
}

impl TestConfig {
    /// Points both the REST store and the SMS provider at a single mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            twilio_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            jwt_expire_hours: 24,
            twilio_account_sid: "ACtest".to_string(),
            twilio_auth_token: "twilio-test-token".to_string(),
            twilio_phone_number: "+15005550006".to_string(),
            twilio_base_url: self.twilio_base_url.clone(),
            storage_bucket: "portfolio".to_string(),
            rate_limit_per_window: 100,
            rate_limit_window_secs: 600,
            trust_proxy: false,
            port: 5000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: Role::User,
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
        }
    }

    pub fn customer(email: &str) -> Self {
        Self::new(email, Role::User)
    }

    pub fn professional(email: &str) -> Self {
        Self::new(email, Role::Professional)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            issued_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        issue_token(user.id, &user.email, user.role, secret, exp_hours.unwrap_or(24))
            .expect("test secret is non-empty")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(user: &TestUser, secret: &str) -> String {
        format!("Bearer {}", Self::create_test_token(user, secret, None))
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_row(user_id: Uuid, email: &str, role: Role, password_hash: Option<&str>) -> Value {
        json!({
            "id": user_id,
            "name": "Test User",
            "email": email,
            "password_hash": password_hash.unwrap_or("$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaA"),
            "role": role,
            "phone": "+355691234567",
            "phone_verified": false,
            "phone_verification_code": null,
            "lat": 41.3275,
            "lng": 19.8189,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn user_summary(user_id: Uuid, name: &str, lat: f64, lng: f64) -> Value {
        json!({
            "id": user_id,
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            "phone": null,
            "role": "professional",
            "lat": lat,
            "lng": lng
        })
    }

    pub fn professional_row(professional_id: Uuid, user_id: Uuid) -> Value {
        json!({
            "id": professional_id,
            "user_id": user_id,
            "services": ["plumbing"],
            "description": "Licensed plumber",
            "hourly_rate": 25.0,
            "experience_years": 8,
            "portfolio": [],
            "avg_rating": 4.5,
            "total_reviews": 12,
            "is_premium": false,
            "id_verified": false,
            "id_document": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn slot_row(slot_id: Uuid, professional_id: Uuid, start: DateTime<Utc>, booked: bool) -> Value {
        json!({
            "id": slot_id,
            "professional_id": professional_id,
            "start": start.to_rfc3339(),
            "end": (start + Duration::hours(2)).to_rfc3339(),
            "booked": booked
        })
    }

    pub fn booking_row(booking_id: Uuid, user_id: Uuid, professional_id: Uuid, slot_id: Uuid, status: &str) -> Value {
        json!({
            "id": booking_id,
            "user_id": user_id,
            "professional_id": professional_id,
            "slot_id": slot_id,
            "service": "plumbing",
            "date": "2030-06-01T10:00:00Z",
            "time_slot": "10:00-12:00",
            "address": "Rruga e Durresit 1, Tirane",
            "total_price": 50.0,
            "status": status,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn review_row(review_id: Uuid, user_id: Uuid, professional_id: Uuid, booking_id: Uuid, rating: i32) -> Value {
        json!({
            "id": review_id,
            "user_id": user_id,
            "professional_id": professional_id,
            "booking_id": booking_id,
            "rating": rating,
            "comment": "Great work",
            "created_at": "2024-01-02T00:00:00Z"
        })
    }

    pub fn message_row(message_id: Uuid, sender_id: Uuid, recipient_id: Uuid, content: &str, flagged: bool) -> Value {
        json!({
            "id": message_id,
            "sender_id": sender_id,
            "recipient_id": recipient_id,
            "content": content,
            "flagged": flagged,
            "flag_reason": if flagged { Some("phone_number") } else { None },
            "booking_id": null,
            "read": false,
            "created_at": "2024-01-03T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "message": message,
            "code": code
        })
    }
}
