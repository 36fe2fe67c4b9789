use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use messaging_cell::models::Message;
use shared_database::DatabaseError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSummary {
    pub name: String,
    pub email: Option<String>,
}

/// A flagged message with both parties resolved for review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlaggedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub sender: Option<ContactSummary>,
    pub recipient: Option<ContactSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PremiumResponse {
    pub msg: String,
    pub is_premium: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyIdResponse {
    pub msg: String,
    pub id_verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub professionals: usize,
    pub flagged_messages: usize,
    pub premium: usize,
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Category exists")]
    CategoryExists,

    #[error("{0}")]
    Validation(String),

    #[error("Professional was modified concurrently, try again")]
    Contended,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::ProfessionalNotFound => AppError::NotFound(err.to_string()),
            AdminError::CategoryExists => AppError::BadRequest(err.to_string()),
            AdminError::Validation(msg) => AppError::ValidationError(msg),
            AdminError::Contended => AppError::Conflict(err.to_string()),
            AdminError::Database(e) => e.into(),
        }
    }
}
