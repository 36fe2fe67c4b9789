use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::error::AppError;
use shared_models::user::UserSummary;

/// Engagements are priced as two hours of the professional's rate.
pub const BOOKING_HOURS: f64 = 2.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub professional_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub service: String,
    pub date: DateTime<Utc>,
    pub time_slot: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Professional side of a booking as embedded in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingProfessional {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub hourly_rate: f64,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingWithParties {
    #[serde(flatten)]
    pub booking: Booking,
    pub user: Option<UserSummary>,
    pub professional: Option<BookingProfessional>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub professional_id: Uuid,
    pub service: String,
    pub date: DateTime<Utc>,
    pub time_slot: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Booking not found")]
    NotFound,

    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Time slot not available")]
    SlotUnavailable,

    #[error("Cannot change booking from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("Not authorized to update this booking")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound | BookingError::ProfessionalNotFound => AppError::NotFound(err.to_string()),
            BookingError::SlotUnavailable => AppError::Conflict(err.to_string()),
            BookingError::InvalidTransition { .. } => AppError::BadRequest(err.to_string()),
            BookingError::Forbidden => AppError::Forbidden(err.to_string()),
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::Database(e) => e.into(),
        }
    }
}
