use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::error::AppError;
use shared_models::user::UserSummary;

pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_PHOTOS_PER_UPLOAD: usize = 5;

// ==============================================================================
// CORE ENTITIES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub services: Vec<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub hourly_rate: f64,
    #[serde(default)]
    pub experience_years: i32,
    #[serde(default)]
    pub portfolio: Vec<String>,
    #[serde(default)]
    pub avg_rating: f64,
    #[serde(default)]
    pub total_reviews: i64,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub id_verified: bool,
    pub id_document: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A professional row with its `users` row embedded under `user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalWithUser {
    #[serde(flatten)]
    pub professional: Professional,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub booked: bool,
}

impl AvailabilitySlot {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

// ==============================================================================
// REQUEST / RESPONSE TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotInput {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertProfileRequest {
    pub services: Option<Vec<String>>,
    pub description: Option<String>,
    pub hourly_rate: Option<f64>,
    pub experience_years: Option<i32>,
    pub availability: Option<Vec<SlotInput>>,
    /// Base64 payloads, either raw or as `data:<mime>;base64,` URLs.
    pub photos: Option<Vec<String>>,
    /// Either an already hosted URL or a base64 data URL to upload.
    pub id_document: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub professional: Professional,
    pub user: Option<UserSummary>,
    pub availability: Vec<AvailabilitySlot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Distance,
    Rating,
    Premium,
}

impl SortMode {
    /// Unrecognised values fall back to distance ordering.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("rating") => SortMode::Rating,
            Some("premium") => SortMode::Premium,
            _ => SortMode::Distance,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub service: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub max_distance: Option<f64>,
    pub min_rating: Option<f64>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub professional: Professional,
    pub user: UserSummary,
    /// Kilometres from the search point, one decimal; null without a point.
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub available_only: Option<bool>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum ProfessionalError {
    #[error("Professional not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("Failed to upload media")]
    Upload(String),

    #[error("Profile was modified concurrently, try again")]
    Contended,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<ProfessionalError> for AppError {
    fn from(err: ProfessionalError) -> Self {
        match err {
            ProfessionalError::NotFound => AppError::NotFound(err.to_string()),
            ProfessionalError::Validation(msg) => AppError::ValidationError(msg),
            ProfessionalError::InvalidMedia(_) => AppError::BadRequest(err.to_string()),
            ProfessionalError::Upload(ref cause) => {
                tracing::error!("Media upload failed: {}", cause);
                AppError::ExternalService(err.to_string())
            }
            ProfessionalError::Contended => AppError::Conflict(err.to_string()),
            ProfessionalError::Database(e) => e.into(),
        }
    }
}
