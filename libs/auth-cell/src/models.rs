use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_models::user::{GeoPoint, UserProfile};

/// Full row of the `users` table, credentials included. Never serialized to clients.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    #[serde(default)]
    pub phone_verified: bool,
    pub phone_verification_code: Option<String>,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            phone: self.phone,
            phone_verified: self.phone_verified,
            lat: self.lat,
            lng: self.lng,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPhoneRequest {
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLocationRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone_verified: bool,
}

impl From<&UserRecord> for AuthUser {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            email: record.email.clone(),
            role: record.role,
            phone_verified: record.phone_verified,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationResponse {
    pub msg: String,
    pub location: GeoPoint,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("User already exists")]
    UserExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Valid phone number required")]
    InvalidPhone,

    #[error("Invalid verification code")]
    InvalidCode,

    #[error("Failed to send SMS")]
    SmsFailed(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UserExists
            | AuthError::InvalidCredentials
            | AuthError::InvalidPhone
            | AuthError::InvalidCode => AppError::BadRequest(err.to_string()),
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::UserNotFound => AppError::Auth(err.to_string()),
            AuthError::SmsFailed(_) => AppError::ExternalService(err.to_string()),
            AuthError::Token(msg) | AuthError::Hashing(msg) => AppError::Internal(msg),
            AuthError::Database(db) => db.into(),
        }
    }
}
