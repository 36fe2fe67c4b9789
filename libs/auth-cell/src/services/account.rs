use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::Role;
use shared_models::user::{GeoPoint, UserProfile};
use shared_utils::jwt::issue_token;

use crate::models::{AuthError, AuthResponse, AuthUser, LoginRequest, RegisterRequest, UserRecord};
use crate::services::password::{PasswordService, MIN_PASSWORD_LENGTH};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"));
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("phone pattern compiles"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

pub struct AccountService {
    supabase: SupabaseClient,
    jwt_secret: String,
    jwt_expire_hours: i64,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            jwt_secret: config.jwt_secret.clone(),
            jwt_expire_hours: config.jwt_expire_hours,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let name = request.name.trim().to_string();
        let email = request.email.trim().to_lowercase();
        debug!("Registering user: {}", email);

        if name.is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        if !is_valid_email(&email) {
            return Err(AuthError::Validation("Please use a valid email".to_string()));
        }
        if request.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if let Some(ref phone) = request.phone {
            if !is_valid_phone(phone) {
                return Err(AuthError::Validation("Please enter a valid phone number".to_string()));
            }
        }

        let role = request.role.unwrap_or_default();
        if role == Role::Admin {
            return Err(AuthError::Validation("Admin accounts cannot be self-registered".to_string()));
        }

        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let password_hash = PasswordService::hash_password(&request.password)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let user_data = json!({
            "id": Uuid::new_v4(),
            "name": name,
            "email": email,
            "password_hash": password_hash,
            "role": role,
            "phone": request.phone,
            "phone_verified": false,
            "lat": 0.0,
            "lng": 0.0,
            "created_at": Utc::now().to_rfc3339()
        });

        let result: Vec<UserRecord> = self.supabase
            .request_returning(Method::POST, "/rest/v1/users", Some(user_data))
            .await
            .map_err(|e| if e.is_conflict() { AuthError::UserExists } else { e.into() })?;

        let record = result.into_iter().next()
            .ok_or_else(|| AuthError::Validation("Failed to create user".to_string()))?;

        info!("User {} registered with role {}", record.id, record.role);
        self.auth_response(&record)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = request.email.trim().to_lowercase();
        debug!("Login attempt for: {}", email);

        let record = self.find_by_email(&email).await?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = PasswordService::verify_password(&request.password, &record.password_hash)
            .map_err(|e| {
                warn!("Stored password hash for {} is unreadable: {}", record.id, e);
                AuthError::InvalidCredentials
            })?;

        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        self.auth_response(&record)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let path = format!("/rest/v1/users?email=eq.{}", urlencoding::encode(email));
        let result: Vec<UserRecord> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(result.into_iter().next())
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserRecord, AuthError> {
        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let result: Vec<UserRecord> = self.supabase.request(Method::GET, &path, None).await?;
        result.into_iter().next().ok_or(AuthError::UserNotFound)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile, AuthError> {
        Ok(self.get_user(user_id).await?.into_profile())
    }

    pub async fn update_location(&self, user_id: Uuid, location: GeoPoint) -> Result<GeoPoint, AuthError> {
        if !location.is_valid() {
            return Err(AuthError::Validation("Latitude and longitude out of range".to_string()));
        }

        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let result: Vec<Value> = self.supabase
            .request_returning(
                Method::PATCH,
                &path,
                Some(json!({ "lat": location.lat, "lng": location.lng })),
            )
            .await?;

        if result.is_empty() {
            return Err(AuthError::UserNotFound);
        }

        debug!("Location updated for user {}", user_id);
        Ok(location)
    }

    fn auth_response(&self, record: &UserRecord) -> Result<AuthResponse, AuthError> {
        let token = issue_token(record.id, &record.email, record.role, &self.jwt_secret, self.jwt_expire_hours)
            .map_err(AuthError::Token)?;

        Ok(AuthResponse {
            token,
            user: AuthUser::from(record),
        })
    }
}
