use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::error::AppError;
use shared_models::user::UserSummary;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub professional_id: Uuid,
    pub booking_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub professional_id: Uuid,
    pub booking_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

/// Stored aggregate on the `professionals` row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub avg_rating: f64,
    pub total_reviews: i64,
}

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Rating must be between 1 and 5")]
    InvalidRating,

    #[error("Cannot review: booking not completed")]
    BookingNotCompleted,

    #[error("Already reviewed")]
    AlreadyReviewed,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::InvalidRating => AppError::ValidationError(err.to_string()),
            ReviewError::BookingNotCompleted | ReviewError::AlreadyReviewed => AppError::BadRequest(err.to_string()),
            ReviewError::Database(e) => e.into(),
        }
    }
}
